use crate::handlers::{account, book, order, ws};
use crate::state::AppState;
use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(book::health))
        .route("/api/user", get(account::get_user))
        .route("/api/orderbook", get(book::get_order_book))
        .route("/api/orders", get(order::list_orders).post(order::place_order))
        .route(
            "/api/orders/{id}",
            delete(order::cancel_order).put(order::amend_order),
        )
        .route("/api/trades", get(order::list_trades))
        .route("/ws", get(ws::ws_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
