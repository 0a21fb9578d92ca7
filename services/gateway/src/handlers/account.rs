use crate::error::AppError;
use crate::session::{self, SessionToken};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};

/// GET /api/user: account snapshot, creating the session on first call
pub async fn get_user(
    State(state): State<AppState>,
    token: SessionToken,
) -> Result<impl IntoResponse, AppError> {
    let resolved = state.exchange.resolve_session(token.value())?;
    let user = state.exchange.get_user(resolved.account_id)?;
    Ok((session::cookie_headers(&resolved), Json(user)))
}
