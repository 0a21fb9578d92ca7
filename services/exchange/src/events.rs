//! Event and view types pushed to subscribers
//!
//! Every server-to-client frame is `{"type": ..., "data": ...}`; the
//! tagged serde representation on [`Event`] produces exactly that shape.
//! The same view structs back the REST responses, so poll and push
//! surfaces can never disagree on field names.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::account::Account;
use types::ids::{AccountId, OrderId, TradeId};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderKind, OrderStatus, Side};
use types::trade::Trade;

/// One aggregated price level in a book snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Price,
    pub quantity: Quantity,
}

/// Top-N view of the order book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub symbol: String,
    /// Best (highest) bid first
    pub bids: Vec<BookLevel>,
    /// Best (lowest) ask first
    pub asks: Vec<BookLevel>,
    pub last_price: Price,
    pub timestamp: i64,
}

/// One account's balances and mark-to-market value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub user_id: AccountId,
    pub cash_balance: Decimal,
    pub asset_balance: Decimal,
    pub total_value: Decimal,
}

impl UserSnapshot {
    pub fn from_account(account: &Account, last_price: Price) -> Self {
        Self {
            user_id: account.id,
            cash_balance: account.cash_balance,
            asset_balance: account.asset_balance,
            total_value: account.total_value(last_price),
        }
    }
}

/// Balance change notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub cash_balance: Decimal,
    pub asset_balance: Decimal,
}

/// A fill as seen by one of its two parties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillNotice {
    pub id: TradeId,
    /// This party's own order
    pub order_id: OrderId,
    pub side: Side,
    pub quantity: Quantity,
    pub price: Price,
    pub timestamp: i64,
    pub new_cash_balance: Decimal,
    pub new_asset_balance: Decimal,
}

/// An open (pending/partial) order as shown to its owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub id: OrderId,
    pub symbol: String,
    pub order_type: OrderKind,
    pub side: Side,
    pub quantity: Quantity,
    pub filled_quantity: Quantity,
    pub remaining_quantity: Quantity,
    pub price: Option<Price>,
    pub status: OrderStatus,
    pub created_at: i64,
}

impl OpenOrder {
    pub fn from_order(order: &Order, symbol: &str) -> Self {
        Self {
            id: order.id,
            symbol: symbol.to_string(),
            order_type: order.kind,
            side: order.side,
            quantity: order.quantity,
            filled_quantity: order.filled_quantity,
            remaining_quantity: order.remaining_quantity(),
            price: order.price,
            status: order.status,
            created_at: order.created_at,
        }
    }
}

/// A trade from one account's perspective, for trade history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserTrade {
    pub id: TradeId,
    pub order_id: OrderId,
    pub symbol: String,
    pub side: Side,
    pub quantity: Quantity,
    pub price: Price,
    pub timestamp: i64,
}

impl UserTrade {
    /// Project a trade onto one participant's view
    ///
    /// Returns None if the account was not a party to the trade.
    pub fn from_trade(trade: &Trade, account: &AccountId, symbol: &str) -> Option<Self> {
        let side = trade.side_for(account)?;
        Some(Self {
            id: trade.id,
            order_id: trade.order_id_for(account)?,
            symbol: symbol.to_string(),
            side,
            quantity: trade.quantity,
            price: trade.price,
            timestamp: trade.executed_at,
        })
    }
}

/// Simulated reference quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub symbol: String,
    pub price: Price,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
    pub timestamp: i64,
}

/// Everything the exchange pushes over the WebSocket channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Event {
    /// Account snapshot, sent on subscription
    UserInfo(UserSnapshot),
    /// Full book snapshot, sent on subscription
    OrderBook(BookSnapshot),
    /// Book snapshot after a mutation, broadcast
    OrderBookUpdate(BookSnapshot),
    /// Fill notification, delivered to buyer and seller only
    Fill(FillNotice),
    /// New balances for one account
    BalanceUpdate(BalanceSnapshot),
    /// Full open-order list for one account
    OrdersUpdate(Vec<OpenOrder>),
    /// Periodic simulated quote, broadcast
    MarketData(MarketQuote),
}

/// Discriminant used by the queue overflow policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    UserInfo,
    OrderBook,
    OrderBookUpdate,
    Fill,
    BalanceUpdate,
    OrdersUpdate,
    MarketData,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::UserInfo(_) => EventKind::UserInfo,
            Event::OrderBook(_) => EventKind::OrderBook,
            Event::OrderBookUpdate(_) => EventKind::OrderBookUpdate,
            Event::Fill(_) => EventKind::Fill,
            Event::BalanceUpdate(_) => EventKind::BalanceUpdate,
            Event::OrdersUpdate(_) => EventKind::OrdersUpdate,
            Event::MarketData(_) => EventKind::MarketData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::AccountId;

    #[test]
    fn test_event_wire_format() {
        let event = Event::BalanceUpdate(BalanceSnapshot {
            cash_balance: Decimal::from(10_000),
            asset_balance: Decimal::ZERO,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "balance_update");
        assert_eq!(json["data"]["cash_balance"], "10000");
    }

    #[test]
    fn test_orders_update_data_is_array() {
        let event = Event::OrdersUpdate(Vec::new());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "orders_update");
        assert!(json["data"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_user_trade_projection() {
        let buyer = AccountId::new();
        let seller = AccountId::new();
        let trade = Trade::new(
            OrderId::new(),
            OrderId::new(),
            buyer,
            seller,
            Price::from_u64(100_000),
            Quantity::from_str("0.10").unwrap(),
            1_708_123_456_789_000_000,
        );

        let view = UserTrade::from_trade(&trade, &buyer, "BTCUSD").unwrap();
        assert_eq!(view.side, Side::Buy);
        assert_eq!(view.order_id, trade.buy_order_id);

        let view = UserTrade::from_trade(&trade, &seller, "BTCUSD").unwrap();
        assert_eq!(view.side, Side::Sell);

        assert!(UserTrade::from_trade(&trade, &AccountId::new(), "BTCUSD").is_none());
    }

    #[test]
    fn test_open_order_view() {
        let order = Order::new(
            AccountId::new(),
            Side::Sell,
            OrderKind::Limit,
            Quantity::from_str("0.10").unwrap(),
            Some(Price::from_u64(100_000)),
            7,
            1_708_123_456_789_000_000,
        );
        let view = OpenOrder::from_order(&order, "BTCUSD");
        assert_eq!(view.remaining_quantity, Quantity::from_str("0.10").unwrap());
        assert_eq!(view.status, OrderStatus::Pending);
        assert_eq!(view.order_type, OrderKind::Limit);
    }

    #[test]
    fn test_event_kind_mapping() {
        let event = Event::OrdersUpdate(Vec::new());
        assert_eq!(event.kind(), EventKind::OrdersUpdate);
    }
}
