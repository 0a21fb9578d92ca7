use exchange::Exchange;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub exchange: Arc<Exchange>,
}

impl AppState {
    pub fn new(exchange: Arc<Exchange>) -> Self {
        Self { exchange }
    }
}
