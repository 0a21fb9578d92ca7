//! Order lifecycle types
//!
//! States: pending -> partial -> filled on successive fills, with a user
//! cancel (or a market order running out of liquidity) taking any
//! non-terminal order to cancelled. Filled and cancelled are terminal.

use crate::ids::{AccountId, OrderId};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy order (bid)
    Buy,
    /// Sell order (ask)
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    /// Execute immediately against resting liquidity; never rests
    Market,
    /// Execute at the limit price or better; remainder rests on the book
    Limit,
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Accepted, no fills yet
    Pending,
    /// Partially matched
    Partial,
    /// Completely matched (terminal)
    Filled,
    /// Cancelled by the user or by liquidity exhaustion (terminal)
    Cancelled,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }
}

/// A single order as tracked by the exchange core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub owner: AccountId,
    pub side: Side,
    pub kind: OrderKind,
    /// Original quantity at acceptance
    pub quantity: Quantity,
    pub filled_quantity: Quantity,
    /// Present iff kind = Limit
    pub price: Option<Price>,
    pub status: OrderStatus,
    /// Unix nanos at acceptance
    pub created_at: i64,
    /// Global acceptance sequence; the matching tie-breaker within a price
    pub sequence: u64,
}

impl Order {
    /// Create a new pending order
    pub fn new(
        owner: AccountId,
        side: Side,
        kind: OrderKind,
        quantity: Quantity,
        price: Option<Price>,
        sequence: u64,
        timestamp: i64,
    ) -> Self {
        Self {
            id: OrderId::new(),
            owner,
            side,
            kind,
            quantity,
            filled_quantity: Quantity::zero(),
            price,
            status: OrderStatus::Pending,
            created_at: timestamp,
            sequence,
        }
    }

    /// Unfilled portion: quantity - filled_quantity
    pub fn remaining_quantity(&self) -> Quantity {
        self.quantity - self.filled_quantity
    }

    /// Check if order is completely filled
    pub fn is_filled(&self) -> bool {
        self.filled_quantity == self.quantity
    }

    /// Check if order has any fills
    pub fn has_fills(&self) -> bool {
        !self.filled_quantity.is_zero()
    }

    /// Whether this order belongs on the book (limit, non-terminal)
    pub fn rests_on_book(&self) -> bool {
        self.kind == OrderKind::Limit && !self.status.is_terminal()
    }

    /// Record a fill and adjust status
    ///
    /// # Panics
    /// Panics if the fill would exceed the order quantity or the order is
    /// already terminal
    pub fn add_fill(&mut self, fill_quantity: Quantity) {
        assert!(!self.status.is_terminal(), "Cannot fill terminal order");

        let new_filled = self.filled_quantity + fill_quantity;
        assert!(
            new_filled.as_decimal() <= self.quantity.as_decimal(),
            "Fill would exceed order quantity"
        );

        self.filled_quantity = new_filled;
        self.status = if self.is_filled() {
            OrderStatus::Filled
        } else {
            OrderStatus::Partial
        };
    }

    /// Cancel the order
    ///
    /// # Panics
    /// Panics if order is already in a terminal state
    pub fn cancel(&mut self) {
        assert!(!self.status.is_terminal(), "Cannot cancel terminal order");
        self.status = OrderStatus::Cancelled;
    }
}
