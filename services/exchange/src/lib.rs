//! Exchange core for the trading simulator
//!
//! Single-instrument matching engine and its surrounding session state:
//! the order book, per-user ledger, price-time priority matching, the
//! event fanout that feeds push subscribers, and the background market
//! data simulator.
//!
//! **Key invariants:**
//! - Price-time priority strictly enforced (best price, then earliest
//!   acceptance sequence)
//! - Trades execute at the resting maker's price
//! - Book, ledger and trade log mutate together under one lock
//! - A market order never rests on the book

pub mod book;
pub mod bus;
pub mod clock;
pub mod config;
pub mod events;
pub mod exchange;
pub mod ledger;
pub mod matching;
pub mod sessions;
pub mod simulator;

pub use bus::Subscription;
pub use config::ExchangeConfig;
pub use exchange::{
    AmendOutcome, AmendRequest, Exchange, OrderRequest, PlaceOrderOutcome, ResolvedSession,
};
pub use simulator::MarketSim;
