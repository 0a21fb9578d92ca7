//! Trade execution
//!
//! Builds the trade record for a single crossing and applies it to both
//! accounts. The caller holds the core lock, so the trade append, the two
//! balance mutations and the per-account log updates commit together.

use types::numeric::{Price, Quantity};
use types::order::{Order, Side};
use types::trade::Trade;

use crate::ledger::Ledger;

/// Execute one crossing between the incoming taker and the resting maker
///
/// The trade always prints at the maker's price. Returns the settled
/// trade record.
pub fn execute_trade(
    ledger: &mut Ledger,
    taker: &Order,
    maker: &Order,
    price: Price,
    quantity: Quantity,
    timestamp: i64,
) -> Trade {
    assert!(!quantity.is_zero(), "trade quantity must be positive");
    assert_ne!(taker.id, maker.id, "an order cannot trade with itself");

    let (buy_order, sell_order) = match taker.side {
        Side::Buy => (taker, maker),
        Side::Sell => (maker, taker),
    };

    let trade = Trade::new(
        buy_order.id,
        sell_order.id,
        buy_order.owner,
        sell_order.owner,
        price,
        quantity,
        timestamp,
    );

    ledger.settle(&trade);
    trade
}
