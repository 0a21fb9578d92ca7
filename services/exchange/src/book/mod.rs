//! Central limit order book
//!
//! Two price-indexed ladders (bids descending, asks ascending) with FIFO
//! queues inside each price level, plus an id index so a cancel does not
//! have to scan the ladders. Orders themselves live in the core's order
//! store; the book only holds their footprints.

pub mod ask_book;
pub mod bid_book;
pub mod price_level;

pub use ask_book::AskBook;
pub use bid_book::BidBook;
pub use price_level::{LevelEntry, PriceLevel};

use std::collections::HashMap;
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};

/// Both sides of the book plus the removal index
#[derive(Debug, Default)]
pub struct Book {
    bids: BidBook,
    asks: AskBook,
    /// order_id -> (side, price), the position hint for O(log L) removal
    index: HashMap<OrderId, (Side, Price)>,
}

impl Book {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rest a limit order at its price level
    ///
    /// # Panics
    /// Panics if the order has no price (market orders never rest).
    pub fn insert(&mut self, order: &Order) {
        let price = order.price.expect("resting order must have a price");
        match order.side {
            Side::Buy => self
                .bids
                .insert(price, order.id, order.sequence, order.remaining_quantity()),
            Side::Sell => self
                .asks
                .insert(price, order.id, order.sequence, order.remaining_quantity()),
        }
        self.index.insert(order.id, (order.side, price));
    }

    /// Remove a resting order by id
    pub fn remove(&mut self, order_id: &OrderId) -> bool {
        let Some((side, price)) = self.index.remove(order_id) else {
            return false;
        };
        match side {
            Side::Buy => self.bids.remove(order_id, price),
            Side::Sell => self.asks.remove(order_id, price),
        }
    }

    /// Best bid as (price, aggregated quantity)
    pub fn best_bid(&self) -> Option<(Price, Quantity)> {
        self.bids.best()
    }

    /// Best ask as (price, aggregated quantity)
    pub fn best_ask(&self) -> Option<(Price, Quantity)> {
        self.asks.best()
    }

    /// The highest-priority resting order opposite an incoming order
    ///
    /// Best price first; within a price, earliest sequence first.
    pub fn best_opposite(&self, taker_side: Side) -> Option<(Price, LevelEntry)> {
        match taker_side {
            Side::Buy => {
                let (price, _) = self.asks.best()?;
                let entry = self.asks.level(price)?.front()?;
                Some((price, entry))
            }
            Side::Sell => {
                let (price, _) = self.bids.best()?;
                let entry = self.bids.level(price)?.front()?;
                Some((price, entry))
            }
        }
    }

    /// Consume quantity from the front of the best opposite level
    ///
    /// Returns the maker order id if that order was fully consumed and
    /// removed from the book.
    pub fn consume_opposite_front(
        &mut self,
        taker_side: Side,
        quantity: Quantity,
    ) -> Option<OrderId> {
        let popped = match taker_side {
            Side::Buy => {
                let (price, level) = self.asks.best_level_mut()?;
                let popped = level.consume_front(quantity);
                self.asks.prune_level(price);
                popped
            }
            Side::Sell => {
                let (price, level) = self.bids.best_level_mut()?;
                let popped = level.consume_front(quantity);
                self.bids.prune_level(price);
                popped
            }
        };
        if let Some(id) = popped {
            self.index.remove(&id);
        }
        popped
    }

    /// Aggregated (price, quantity) ladders truncated to `depth` levels
    ///
    /// Bids descending, asks ascending, each starting at the top of book.
    pub fn snapshot(&self, depth: usize) -> (Vec<(Price, Quantity)>, Vec<(Price, Quantity)>) {
        (
            self.bids.depth_snapshot(depth),
            self.asks.depth_snapshot(depth),
        )
    }

    /// Whether an order currently rests on the book
    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.index.contains_key(order_id)
    }

    /// Resting order ids on one side in matching order, for inspection
    pub fn side_order_ids(&self, side: Side) -> Vec<OrderId> {
        let mut ids = Vec::new();
        match side {
            Side::Buy => {
                for (price, _) in self.bids.depth_snapshot(self.bids.level_count()) {
                    if let Some(level) = self.bids.level(price) {
                        ids.extend(level.entries().map(|e| e.order_id));
                    }
                }
            }
            Side::Sell => {
                for (price, _) in self.asks.depth_snapshot(self.asks.level_count()) {
                    if let Some(level) = self.asks.level(price) {
                        ids.extend(level.entries().map(|e| e.order_id));
                    }
                }
            }
        }
        ids
    }
}
