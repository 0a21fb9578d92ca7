//! WebSocket push channel
//!
//! On upgrade the client is bound to its account's subscription; the seed
//! queue already carries the initial `user_info` and `order_book` frames.
//! The socket task pumps events out and watches for teardown; clients
//! send nothing meaningful upstream. If the subscriber queue overflowed,
//! fresh snapshots are pushed so the client can reconcile.

use crate::error::AppError;
use crate::session::SessionToken;
use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use exchange::events::Event;
use tracing::debug;
use types::ids::AccountId;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    token: SessionToken,
) -> Result<Response, AppError> {
    let resolved = state.exchange.resolve_session(token.value())?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, resolved.account_id)))
}

async fn handle_socket(socket: WebSocket, state: AppState, account: AccountId) {
    let mut subscription = match state.exchange.subscribe(account) {
        Ok(sub) => sub,
        Err(_) => return,
    };
    let (mut sender, mut receiver) = socket.split();
    debug!(account = %account, "websocket connected");

    loop {
        tokio::select! {
            event = subscription.recv() => {
                let Some(event) = event else { break };
                if send_event(&mut sender, &event).await.is_err() {
                    break;
                }
                if subscription.take_lagged()
                    && resync(&mut sender, &state, account).await.is_err()
                {
                    break;
                }
            }
            closing = client_closed(&mut receiver) => {
                if closing {
                    break;
                }
            }
        }
    }

    debug!(account = %account, "websocket disconnected");
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &Event,
) -> Result<(), axum::Error> {
    let Ok(json) = serde_json::to_string(event) else {
        return Ok(());
    };
    sender.send(Message::Text(json.into())).await
}

/// Push fresh snapshots after the subscriber queue dropped events
async fn resync(
    sender: &mut SplitSink<WebSocket, Message>,
    state: &AppState,
    account: AccountId,
) -> Result<(), axum::Error> {
    debug!(account = %account, "subscriber lagged, resending snapshots");
    if let Ok(user) = state.exchange.get_user(account) {
        send_event(sender, &Event::UserInfo(user)).await?;
    }
    if let Ok(book) = state.exchange.get_book() {
        send_event(sender, &Event::OrderBook(book)).await?;
    }
    Ok(())
}

/// Wait for the next inbound frame; true when the client is going away
async fn client_closed(receiver: &mut SplitStream<WebSocket>) -> bool {
    match receiver.next().await {
        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => true,
        Some(Ok(_)) => false,
    }
}
