use crate::error::AppError;
use crate::models::HealthResponse;
use crate::state::AppState;
use axum::{extract::State, Json};
use exchange::events::BookSnapshot;

/// GET /: health check
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "Trading Simulator API",
        status: "running",
    })
}

/// GET /api/orderbook: top-N aggregated book
pub async fn get_order_book(
    State(state): State<AppState>,
) -> Result<Json<BookSnapshot>, AppError> {
    Ok(Json(state.exchange.get_book()?))
}
