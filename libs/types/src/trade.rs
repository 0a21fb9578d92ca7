//! Trade (fill) types
//!
//! A trade records a single crossing between two orders at the resting
//! maker's price. Trades are append-only and never mutated.

use crate::ids::{AccountId, OrderId, TradeId};
use crate::numeric::{Price, Quantity};
use crate::order::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single executed crossing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub buyer: AccountId,
    pub seller: AccountId,
    /// Execution price, always the resting maker's limit price
    pub price: Price,
    pub quantity: Quantity,
    /// Unix nanos
    pub executed_at: i64,
}

impl Trade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        buyer: AccountId,
        seller: AccountId,
        price: Price,
        quantity: Quantity,
        executed_at: i64,
    ) -> Self {
        Self {
            id: TradeId::new(),
            buy_order_id,
            sell_order_id,
            buyer,
            seller,
            price,
            quantity,
            executed_at,
        }
    }

    /// Trade value (price x quantity)
    pub fn notional(&self) -> Decimal {
        self.quantity * self.price
    }

    /// The side of this trade from one participant's perspective
    ///
    /// Returns None if the account took no part in the trade.
    pub fn side_for(&self, account: &AccountId) -> Option<Side> {
        if *account == self.buyer {
            Some(Side::Buy)
        } else if *account == self.seller {
            Some(Side::Sell)
        } else {
            None
        }
    }

    /// The order id belonging to one participant
    pub fn order_id_for(&self, account: &AccountId) -> Option<OrderId> {
        match self.side_for(account)? {
            Side::Buy => Some(self.buy_order_id),
            Side::Sell => Some(self.sell_order_id),
        }
    }
}
