use crate::error::AppError;
use crate::models::{
    AmendOrderBody, AmendOrderResponse, CancelOrderResponse, OrdersResponse, PlaceOrderBody,
    PlaceOrderResponse, TradesResponse,
};
use crate::session::{self, SessionToken};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use exchange::{AmendRequest, OrderRequest};
use types::ids::OrderId;

/// GET /api/orders: the caller's open orders
pub async fn list_orders(
    State(state): State<AppState>,
    token: SessionToken,
) -> Result<impl IntoResponse, AppError> {
    let resolved = state.exchange.resolve_session(token.value())?;
    let orders = state.exchange.get_orders(resolved.account_id)?;
    Ok((
        session::cookie_headers(&resolved),
        Json(OrdersResponse { orders }),
    ))
}

/// GET /api/trades: the caller's trade history
pub async fn list_trades(
    State(state): State<AppState>,
    token: SessionToken,
) -> Result<impl IntoResponse, AppError> {
    let resolved = state.exchange.resolve_session(token.value())?;
    let trades = state.exchange.get_trades(resolved.account_id)?;
    Ok((
        session::cookie_headers(&resolved),
        Json(TradesResponse { trades }),
    ))
}

/// POST /api/orders: place an order
pub async fn place_order(
    State(state): State<AppState>,
    token: SessionToken,
    Json(body): Json<PlaceOrderBody>,
) -> Result<impl IntoResponse, AppError> {
    let resolved = state.exchange.resolve_session(token.value())?;
    let outcome = state.exchange.place_order(
        resolved.account_id,
        OrderRequest {
            side: body.side,
            kind: body.order_type,
            quantity: body.quantity,
            price: body.price,
        },
    )?;

    Ok((
        session::cookie_headers(&resolved),
        Json(PlaceOrderResponse {
            order_id: outcome.order_id,
            status: outcome.status,
            fills: outcome.trades.len(),
        }),
    ))
}

/// DELETE /api/orders/{id}: cancel an order
pub async fn cancel_order(
    State(state): State<AppState>,
    token: SessionToken,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let resolved = state.exchange.resolve_session(token.value())?;
    let order_id = parse_order_id(&order_id)?;
    let cancelled = state.exchange.cancel_order(resolved.account_id, order_id)?;

    Ok((
        session::cookie_headers(&resolved),
        Json(CancelOrderResponse {
            status: "cancelled",
            order_id: cancelled.id,
        }),
    ))
}

/// PUT /api/orders/{id}: amend (cancel-replace) an order
pub async fn amend_order(
    State(state): State<AppState>,
    token: SessionToken,
    Path(order_id): Path<String>,
    Json(body): Json<AmendOrderBody>,
) -> Result<impl IntoResponse, AppError> {
    let resolved = state.exchange.resolve_session(token.value())?;
    let order_id = parse_order_id(&order_id)?;
    let outcome = state.exchange.amend_order(
        resolved.account_id,
        order_id,
        AmendRequest {
            price: body.price,
            quantity: body.quantity,
        },
    )?;

    Ok((
        session::cookie_headers(&resolved),
        Json(AmendOrderResponse {
            status: "amended",
            order_id: outcome.order_id,
            cancelled_order_id: outcome.cancelled_order_id,
            fills: outcome.trades.len(),
        }),
    ))
}

fn parse_order_id(raw: &str) -> Result<OrderId, AppError> {
    raw.parse::<OrderId>()
        .map_err(|_| AppError::BadRequest(format!("invalid order id: {raw}")))
}
