//! Crossing detection
//!
//! Decides whether an incoming order can trade against the best resting
//! price on the opposite side. Market orders cross anything; limit orders
//! cross when the prices overlap.

use types::numeric::Price;
use types::order::{Order, OrderKind, Side};

/// Check if a bid and ask price overlap
pub fn can_match(bid_price: Price, ask_price: Price) -> bool {
    bid_price >= ask_price
}

/// Whether the incoming (taker) order crosses the given maker price
pub fn taker_crosses(taker: &Order, maker_price: Price) -> bool {
    match taker.kind {
        OrderKind::Market => true,
        OrderKind::Limit => {
            let Some(limit) = taker.price else {
                return false;
            };
            match taker.side {
                Side::Buy => limit >= maker_price,
                Side::Sell => limit <= maker_price,
            }
        }
    }
}
