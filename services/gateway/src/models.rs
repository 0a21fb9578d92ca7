//! Request and response bodies for the REST surface
//!
//! View types (open orders, trades, snapshots) come from the exchange
//! crate; only the transport-specific envelopes live here.

use exchange::events::{OpenOrder, UserTrade};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::ids::OrderId;
use types::order::{OrderKind, OrderStatus, Side};

#[derive(Debug, Deserialize)]
pub struct PlaceOrderBody {
    pub order_type: OrderKind,
    pub side: Side,
    pub quantity: Decimal,
    #[serde(default)]
    pub price: Option<Decimal>,
}

#[derive(Debug, Deserialize, Default)]
pub struct AmendOrderBody {
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub quantity: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct PlaceOrderResponse {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub fills: usize,
}

#[derive(Debug, Serialize)]
pub struct CancelOrderResponse {
    pub status: &'static str,
    pub order_id: OrderId,
}

#[derive(Debug, Serialize)]
pub struct AmendOrderResponse {
    pub status: &'static str,
    pub order_id: OrderId,
    pub cancelled_order_id: OrderId,
    pub fills: usize,
}

#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<OpenOrder>,
}

#[derive(Debug, Serialize)]
pub struct TradesResponse {
    pub trades: Vec<UserTrade>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: &'static str,
    pub status: &'static str,
}
