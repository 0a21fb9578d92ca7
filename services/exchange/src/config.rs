//! Exchange configuration
//!
//! Startup defaults match the simulator's documented behavior: $10,000
//! starting cash, a $100,000 reference price, $10 tick, and a 2 second
//! market data cadence.

use rust_decimal::Decimal;
use std::time::Duration;

/// Tunable parameters for the exchange core and market simulator
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    /// Instrument symbol carried on snapshots and quotes
    pub symbol: String,
    /// Cash balance granted to every new account (USD)
    pub starting_cash: Decimal,
    /// Asset balance granted to every new account (BTC)
    pub starting_asset: Decimal,
    /// Reference price before any trade has printed
    pub reference_price: Decimal,
    /// Minimum price increment; limit prices must be multiples of this
    pub tick: Decimal,
    /// Maximum decimal places accepted on an order quantity
    pub quantity_dp: u32,
    /// Price levels per side in book snapshots
    pub book_depth: usize,
    /// When true (the default), orders are not checked against balances
    /// and a fill may drive cash negative, margin-sandbox style. When
    /// false, buys require sufficient cash and sells sufficient asset
    /// up front.
    pub allow_negative_cash: bool,
    /// Bounded queue length per push subscriber
    pub subscriber_queue_capacity: usize,
    /// Cadence of simulated market data quotes
    pub market_data_interval: Duration,
    /// Maximum absolute per-tick drift of the simulated price (USD)
    pub sim_max_drift: Decimal,
    /// Hard floor for the simulated price
    pub sim_price_floor: Decimal,
    /// RNG seed for the simulated random walk
    pub sim_seed: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSD".to_string(),
            starting_cash: Decimal::from(10_000),
            starting_asset: Decimal::ZERO,
            reference_price: Decimal::from(100_000),
            tick: Decimal::from(10),
            quantity_dp: 8,
            book_depth: 10,
            allow_negative_cash: true,
            subscriber_queue_capacity: 64,
            market_data_interval: Duration::from_secs(2),
            sim_max_drift: Decimal::from(100),
            sim_price_floor: Decimal::from(1_000),
            sim_seed: 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ExchangeConfig::default();
        assert_eq!(cfg.starting_cash, Decimal::from(10_000));
        assert_eq!(cfg.reference_price, Decimal::from(100_000));
        assert_eq!(cfg.tick, Decimal::from(10));
        assert_eq!(cfg.book_depth, 10);
        assert!(cfg.allow_negative_cash);
        assert_eq!(cfg.market_data_interval, Duration::from_secs(2));
    }
}
