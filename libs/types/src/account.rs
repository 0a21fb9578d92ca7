//! Account balances, open-order index and trade log
//!
//! Balances change only through trade settlement. The asset balance may go
//! negative (shorting is permitted); whether cash may go negative is a
//! policy decision enforced upstream, before an order reaches matching.

use crate::ids::{AccountId, OrderId, TradeId};
use crate::numeric::{Price, Quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Per-user trading state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub cash_balance: Decimal,
    pub asset_balance: Decimal,
    /// Ids of this account's pending/partial orders
    pub open_orders: BTreeSet<OrderId>,
    /// Trade ids in settlement order, newest last
    pub trade_log: Vec<TradeId>,
}

impl Account {
    /// Create a new account with the configured starting balances
    pub fn new(id: AccountId, starting_cash: Decimal, starting_asset: Decimal) -> Self {
        Self {
            id,
            cash_balance: starting_cash,
            asset_balance: starting_asset,
            open_orders: BTreeSet::new(),
            trade_log: Vec::new(),
        }
    }

    /// Settle the buy side of a trade: pay cash, receive asset
    pub fn apply_buy(&mut self, price: Price, quantity: Quantity, trade_id: TradeId) {
        self.cash_balance -= quantity * price;
        self.asset_balance += quantity.as_decimal();
        self.trade_log.push(trade_id);
    }

    /// Settle the sell side of a trade: receive cash, give asset
    pub fn apply_sell(&mut self, price: Price, quantity: Quantity, trade_id: TradeId) {
        self.cash_balance += quantity * price;
        self.asset_balance -= quantity.as_decimal();
        self.trade_log.push(trade_id);
    }

    /// Mark-to-market value: cash plus asset at the given reference price
    pub fn total_value(&self, last_price: Price) -> Decimal {
        self.cash_balance + self.asset_balance * last_price.as_decimal()
    }
}
