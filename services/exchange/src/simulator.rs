//! Market data simulator
//!
//! A seeded random walk around the configured reference price stands in
//! for an external market data feed. Each tick drifts the price by a
//! bounded random amount, snaps it to the tick size and broadcasts a
//! quote together with the current top of the real book. Simulated quotes
//! are reference data only; they never cross against resting orders.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use types::numeric::Price;

use crate::config::ExchangeConfig;
use crate::exchange::Exchange;

/// Random-walk state for the simulated reference price
pub struct MarketSim {
    price: Decimal,
    tick: Decimal,
    max_drift: f64,
    floor: Decimal,
    rng: ChaCha8Rng,
}

impl MarketSim {
    pub fn new(config: &ExchangeConfig) -> Self {
        Self {
            price: config.reference_price,
            tick: config.tick,
            max_drift: config.sim_max_drift.to_f64().unwrap_or(100.0),
            floor: config.sim_price_floor,
            rng: ChaCha8Rng::seed_from_u64(config.sim_seed),
        }
    }

    /// Advance the walk one step and return the new price
    pub fn step(&mut self) -> Price {
        let drift: f64 = self.rng.gen_range(-self.max_drift..=self.max_drift);
        let delta = Decimal::from_f64(drift).unwrap_or(Decimal::ZERO).round_dp(2);

        let mut next = self.price + delta;
        if next < self.floor {
            next = self.floor;
        }
        next = snap_to_tick(next, self.tick);

        self.price = next;
        Price::new(next)
    }

    /// Current price without advancing
    pub fn current(&self) -> Decimal {
        self.price
    }
}

/// Snap a value to the nearest multiple of the tick size
fn snap_to_tick(value: Decimal, tick: Decimal) -> Decimal {
    let steps = (value / tick).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    steps * tick
}

/// Background loop publishing one quote per configured interval
///
/// Exits cooperatively when the shutdown channel flips to true.
pub async fn run(exchange: Arc<Exchange>, mut shutdown: watch::Receiver<bool>) {
    let mut sim = MarketSim::new(exchange.config());
    let mut interval = tokio::time::interval(exchange.config().market_data_interval);
    info!(
        start = %sim.current(),
        "market simulator started"
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(err) = exchange.market_tick(&mut sim) {
                    error!(%err, "market tick failed, stopping simulator");
                    break;
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    info!("market simulator stopped");
}
