//! Price-time priority matching
//!
//! The incoming order sweeps the opposite side of the book, best price
//! first and earliest sequence first within a price, trading at each
//! maker's limit price until it is filled or no resting order crosses.
//! What happens to the remainder (rest it, or cancel a market order) is
//! the facade's decision.

pub mod crossing;
pub mod executor;

use std::collections::HashMap;
use types::ids::OrderId;
use types::order::{Order, OrderStatus};
use types::trade::Trade;

use crate::book::Book;
use crate::ledger::Ledger;

/// Sweep the book with an incoming order
///
/// Mutates the taker (fills), the crossed makers (fills, book removal on
/// completion) and the ledger (settlement per trade). Returns the trades
/// in execution order.
pub fn match_incoming(
    book: &mut Book,
    orders: &mut HashMap<OrderId, Order>,
    ledger: &mut Ledger,
    taker: &mut Order,
    timestamp: i64,
) -> Vec<Trade> {
    let mut trades = Vec::new();

    while !taker.remaining_quantity().is_zero() {
        let Some((maker_price, entry)) = book.best_opposite(taker.side) else {
            break;
        };
        if !crossing::taker_crosses(taker, maker_price) {
            break;
        }

        let fill_qty = taker.remaining_quantity().min(entry.remaining);

        let maker = orders
            .get(&entry.order_id)
            .expect("resting order must exist in the order store");
        let trade = executor::execute_trade(ledger, taker, maker, maker_price, fill_qty, timestamp);

        taker.add_fill(fill_qty);

        let maker = orders
            .get_mut(&entry.order_id)
            .expect("resting order must exist in the order store");
        maker.add_fill(fill_qty);
        if maker.status == OrderStatus::Filled {
            ledger.clear_open(&maker.owner, &maker.id);
        }

        book.consume_opposite_front(taker.side, fill_qty);
        trades.push(trade);
    }

    trades
}
