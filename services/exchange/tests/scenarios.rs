//! End-to-end scenarios through the trading facade
//!
//! Each test drives the public `Exchange` surface the way the transport
//! layer would, then checks balances, book state and emitted events.

use exchange::events::Event;
use exchange::{AmendRequest, Exchange, ExchangeConfig, OrderRequest};
use rust_decimal::Decimal;
use types::ids::AccountId;
use types::numeric::{Price, Quantity};
use types::order::{OrderKind, OrderStatus, Side};

fn exchange() -> Exchange {
    Exchange::new(ExchangeConfig::default())
}

fn account(ex: &Exchange) -> AccountId {
    ex.resolve_session(None).unwrap().account_id
}

fn limit(side: Side, qty: &str, price: u64) -> OrderRequest {
    OrderRequest {
        side,
        kind: OrderKind::Limit,
        quantity: qty.parse().unwrap(),
        price: Some(Decimal::from(price)),
    }
}

fn market(side: Side, qty: &str) -> OrderRequest {
    OrderRequest {
        side,
        kind: OrderKind::Market,
        quantity: qty.parse().unwrap(),
        price: None,
    }
}

fn qty(s: &str) -> Quantity {
    Quantity::from_str(s).unwrap()
}

#[test]
fn market_buy_into_empty_book_cancels() {
    let ex = exchange();
    let alice = account(&ex);
    let mut sub = ex.subscribe(alice).unwrap();
    // Drain the subscription seed
    assert!(matches!(sub.try_recv().unwrap(), Event::UserInfo(_)));
    assert!(matches!(sub.try_recv().unwrap(), Event::OrderBook(_)));

    let outcome = ex.place_order(alice, market(Side::Buy, "0.01")).unwrap();
    assert_eq!(outcome.status, OrderStatus::Cancelled);
    assert!(outcome.trades.is_empty());

    let user = ex.get_user(alice).unwrap();
    assert_eq!(user.cash_balance, Decimal::from(10_000));
    assert_eq!(user.asset_balance, Decimal::ZERO);

    // No fills, no balance change on the wire: one orders_update for
    // Alice plus the broadcast book snapshot
    let orders_update = sub.try_recv().unwrap();
    match orders_update {
        Event::OrdersUpdate(orders) => assert!(orders.is_empty()),
        other => panic!("expected orders_update, got {other:?}"),
    }
    assert!(matches!(sub.try_recv().unwrap(), Event::OrderBookUpdate(_)));
    assert!(sub.try_recv().is_none());
}

#[test]
fn limit_cross_settles_both_accounts() {
    let ex = exchange();
    let alice = account(&ex);
    let bob = account(&ex);

    let sell = ex.place_order(alice, limit(Side::Sell, "0.10", 100_000)).unwrap();
    assert_eq!(sell.status, OrderStatus::Pending);
    let book = ex.get_book().unwrap();
    assert_eq!(book.asks[0].price, Price::from_u64(100_000));
    assert_eq!(book.asks[0].quantity, qty("0.10"));

    let buy = ex.place_order(bob, limit(Side::Buy, "0.10", 100_000)).unwrap();
    assert_eq!(buy.status, OrderStatus::Filled);
    assert_eq!(buy.trades.len(), 1);
    assert_eq!(buy.trades[0].price, Price::from_u64(100_000));
    assert_eq!(buy.trades[0].quantity, qty("0.10"));

    let alice_user = ex.get_user(alice).unwrap();
    assert_eq!(alice_user.cash_balance, Decimal::from(20_000));
    assert_eq!(alice_user.asset_balance, Decimal::from_str_exact("-0.10").unwrap());

    let bob_user = ex.get_user(bob).unwrap();
    assert_eq!(bob_user.cash_balance, Decimal::ZERO);
    assert_eq!(bob_user.asset_balance, Decimal::from_str_exact("0.10").unwrap());

    let book = ex.get_book().unwrap();
    assert!(book.bids.is_empty());
    assert!(book.asks.is_empty());
}

#[test]
fn partial_fill_leaves_remainder_resting() {
    let ex = exchange();
    let alice = account(&ex);
    let bob = account(&ex);

    let sell = ex.place_order(alice, limit(Side::Sell, "0.10", 100_000)).unwrap();
    let buy = ex.place_order(bob, market(Side::Buy, "0.04")).unwrap();

    assert_eq!(buy.status, OrderStatus::Filled);
    assert_eq!(buy.trades.len(), 1);
    assert_eq!(buy.trades[0].quantity, qty("0.04"));

    let alice_orders = ex.get_orders(alice).unwrap();
    assert_eq!(alice_orders.len(), 1);
    assert_eq!(alice_orders[0].id, sell.order_id);
    assert_eq!(alice_orders[0].status, OrderStatus::Partial);
    assert_eq!(alice_orders[0].remaining_quantity, qty("0.06"));

    let book = ex.get_book().unwrap();
    assert_eq!(book.asks[0].quantity, qty("0.06"));
}

#[test]
fn price_time_priority_fills_earliest_first() {
    let ex = exchange();
    let alice = account(&ex);
    let carol = account(&ex);
    let bob = account(&ex);

    ex.place_order(alice, limit(Side::Sell, "0.05", 100_000)).unwrap();
    let carol_order = ex.place_order(carol, limit(Side::Sell, "0.05", 100_000)).unwrap();

    let buy = ex.place_order(bob, market(Side::Buy, "0.07")).unwrap();
    assert_eq!(buy.trades.len(), 2);
    assert_eq!(buy.trades[0].seller, alice);
    assert_eq!(buy.trades[0].quantity, qty("0.05"));
    assert_eq!(buy.trades[1].seller, carol);
    assert_eq!(buy.trades[1].quantity, qty("0.02"));

    // Carol keeps 0.03 resting at 100000
    let carol_orders = ex.get_orders(carol).unwrap();
    assert_eq!(carol_orders.len(), 1);
    assert_eq!(carol_orders[0].id, carol_order.order_id);
    assert_eq!(carol_orders[0].remaining_quantity, qty("0.03"));

    let book = ex.get_book().unwrap();
    assert_eq!(book.asks[0].quantity, qty("0.03"));
}

#[test]
fn cancel_removes_order_from_top_of_book() {
    let ex = exchange();
    let alice = account(&ex);

    let buy = ex.place_order(alice, limit(Side::Buy, "0.10", 90_000)).unwrap();
    let book = ex.get_book().unwrap();
    assert_eq!(book.bids[0].price, Price::from_u64(90_000));

    let cancelled = ex.cancel_order(alice, buy.order_id).unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let book = ex.get_book().unwrap();
    assert!(book.bids.is_empty());
    assert!(ex.get_orders(alice).unwrap().is_empty());
}

#[test]
fn amend_is_cancel_then_replace() {
    let ex = exchange();
    let alice = account(&ex);

    let original = ex.place_order(alice, limit(Side::Buy, "0.10", 90_000)).unwrap();
    let amended = ex
        .amend_order(
            alice,
            original.order_id,
            AmendRequest {
                price: Some(Decimal::from(95_000)),
                quantity: None,
            },
        )
        .unwrap();

    assert_eq!(amended.cancelled_order_id, original.order_id);
    assert_ne!(amended.order_id, original.order_id);
    assert_eq!(amended.status, OrderStatus::Pending);

    // The original is terminal; only the replacement is open
    let err = ex.cancel_order(alice, original.order_id).unwrap_err();
    assert!(matches!(err, types::errors::ExchangeError::NotCancellable(_)));

    let orders = ex.get_orders(alice).unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, amended.order_id);
    assert_eq!(orders[0].price, Some(Price::from_u64(95_000)));
    assert_eq!(orders[0].quantity, qty("0.10"));
}

#[test]
fn amend_replacement_can_fill_immediately() {
    let ex = exchange();
    let alice = account(&ex);
    let bob = account(&ex);

    ex.place_order(bob, limit(Side::Sell, "0.10", 95_000)).unwrap();
    let original = ex.place_order(alice, limit(Side::Buy, "0.10", 90_000)).unwrap();

    let amended = ex
        .amend_order(
            alice,
            original.order_id,
            AmendRequest {
                price: Some(Decimal::from(95_000)),
                quantity: None,
            },
        )
        .unwrap();

    assert_eq!(amended.status, OrderStatus::Filled);
    assert_eq!(amended.trades.len(), 1);
    assert_eq!(amended.trades[0].price, Price::from_u64(95_000));
}

#[test]
fn amend_of_partial_order_replaces_remaining_quantity() {
    let ex = exchange();
    let alice = account(&ex);
    let bob = account(&ex);

    let sell = ex.place_order(alice, limit(Side::Sell, "0.10", 100_000)).unwrap();
    ex.place_order(bob, market(Side::Buy, "0.04")).unwrap();

    let amended = ex
        .amend_order(
            alice,
            sell.order_id,
            AmendRequest {
                price: Some(Decimal::from(101_000)),
                quantity: None,
            },
        )
        .unwrap();

    let orders = ex.get_orders(alice).unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, amended.order_id);
    // The replacement carries only the unfilled 0.06
    assert_eq!(orders[0].quantity, qty("0.06"));
    assert_eq!(orders[0].price, Some(Price::from_u64(101_000)));
}

#[test]
fn cancel_of_another_users_order_is_rejected() {
    let ex = exchange();
    let alice = account(&ex);
    let bob = account(&ex);

    let bob_order = ex.place_order(bob, limit(Side::Sell, "0.10", 100_000)).unwrap();
    let err = ex.cancel_order(alice, bob_order.order_id).unwrap_err();
    assert!(matches!(err, types::errors::ExchangeError::NotOwner(_)));

    // Bob's order still rests
    let book = ex.get_book().unwrap();
    assert_eq!(book.asks[0].quantity, qty("0.10"));
}

#[test]
fn conservation_across_random_trading() {
    let ex = exchange();
    let accounts: Vec<AccountId> = (0..4).map(|_| account(&ex)).collect();

    // A deterministic mix of resting and crossing orders
    let script: Vec<(usize, OrderRequest)> = vec![
        (0, limit(Side::Sell, "0.30", 100_000)),
        (1, limit(Side::Buy, "0.10", 100_000)),
        (2, limit(Side::Buy, "0.05", 99_000)),
        (3, market(Side::Buy, "0.12")),
        (1, limit(Side::Sell, "0.20", 99_000)),
        (2, market(Side::Sell, "0.03")),
        (0, limit(Side::Buy, "0.25", 98_000)),
        (3, limit(Side::Sell, "0.25", 98_000)),
    ];
    for (who, request) in script {
        let _ = ex.place_order(accounts[who], request);
    }

    let mut total_cash = Decimal::ZERO;
    let mut total_asset = Decimal::ZERO;
    for acct in &accounts {
        let user = ex.get_user(*acct).unwrap();
        total_cash += user.cash_balance;
        total_asset += user.asset_balance;
    }

    // Trades are zero-sum: cash and asset totals never move
    assert_eq!(total_cash, Decimal::from(4 * 10_000));
    assert_eq!(total_asset, Decimal::ZERO);
}

#[test]
fn book_never_crossed_after_placements() {
    let ex = exchange();
    let alice = account(&ex);
    let bob = account(&ex);

    let placements = vec![
        (alice, limit(Side::Sell, "0.10", 101_000)),
        (bob, limit(Side::Buy, "0.10", 99_000)),
        (alice, limit(Side::Buy, "0.20", 101_000)), // crosses the ask
        (bob, limit(Side::Sell, "0.30", 99_000)),   // crosses the bid
        (alice, limit(Side::Buy, "0.05", 98_000)),
    ];

    for (who, request) in placements {
        ex.place_order(who, request).unwrap();
        let book = ex.get_book().unwrap();
        if let (Some(bid), Some(ask)) = (book.bids.first(), book.asks.first()) {
            assert!(
                bid.price < ask.price,
                "book crossed: bid {} >= ask {}",
                bid.price,
                ask.price
            );
        }
    }
}

#[test]
fn remaining_equals_original_minus_fills() {
    let ex = exchange();
    let alice = account(&ex);
    let bob = account(&ex);

    let sell = ex.place_order(alice, limit(Side::Sell, "0.50", 100_000)).unwrap();
    ex.place_order(bob, market(Side::Buy, "0.15")).unwrap();
    ex.place_order(bob, market(Side::Buy, "0.10")).unwrap();

    let trades = ex.get_trades(alice).unwrap();
    let filled: Decimal = trades.iter().map(|t| t.quantity.as_decimal()).sum();
    assert_eq!(filled, Decimal::from_str_exact("0.25").unwrap());

    let orders = ex.get_orders(alice).unwrap();
    assert_eq!(orders[0].id, sell.order_id);
    assert_eq!(
        orders[0].remaining_quantity.as_decimal(),
        Decimal::from_str_exact("0.50").unwrap() - filled
    );
}

#[test]
fn trade_history_has_per_user_perspective() {
    let ex = exchange();
    let alice = account(&ex);
    let bob = account(&ex);

    ex.place_order(alice, limit(Side::Sell, "0.10", 100_000)).unwrap();
    ex.place_order(bob, limit(Side::Buy, "0.10", 100_000)).unwrap();

    let alice_trades = ex.get_trades(alice).unwrap();
    assert_eq!(alice_trades.len(), 1);
    assert_eq!(alice_trades[0].side, Side::Sell);

    let bob_trades = ex.get_trades(bob).unwrap();
    assert_eq!(bob_trades.len(), 1);
    assert_eq!(bob_trades[0].side, Side::Buy);
    assert_eq!(alice_trades[0].id, bob_trades[0].id);
}

#[test]
fn fill_events_precede_balance_and_orders_updates() {
    let ex = exchange();
    let alice = account(&ex);
    let bob = account(&ex);

    ex.place_order(alice, limit(Side::Sell, "0.10", 100_000)).unwrap();

    let mut sub = ex.subscribe(bob).unwrap();
    assert!(matches!(sub.try_recv().unwrap(), Event::UserInfo(_)));
    assert!(matches!(sub.try_recv().unwrap(), Event::OrderBook(_)));

    ex.place_order(bob, limit(Side::Buy, "0.10", 100_000)).unwrap();

    let fill = sub.try_recv().unwrap();
    match fill {
        Event::Fill(notice) => {
            assert_eq!(notice.side, Side::Buy);
            assert_eq!(notice.price, Price::from_u64(100_000));
            assert_eq!(notice.new_cash_balance, Decimal::ZERO);
        }
        other => panic!("expected fill first, got {other:?}"),
    }
    assert!(matches!(sub.try_recv().unwrap(), Event::BalanceUpdate(_)));
    assert!(matches!(sub.try_recv().unwrap(), Event::OrdersUpdate(_)));
    assert!(matches!(sub.try_recv().unwrap(), Event::OrderBookUpdate(_)));
}

#[test]
fn fills_route_to_both_parties_only() {
    let ex = exchange();
    let alice = account(&ex);
    let bob = account(&ex);
    let carol = account(&ex);

    let mut sub_alice = ex.subscribe(alice).unwrap();
    let mut sub_carol = ex.subscribe(carol).unwrap();
    while sub_alice.try_recv().is_some() {}
    while sub_carol.try_recv().is_some() {}

    ex.place_order(alice, limit(Side::Sell, "0.10", 100_000)).unwrap();
    while sub_alice.try_recv().is_some() {}
    while sub_carol.try_recv().is_some() {}

    ex.place_order(bob, limit(Side::Buy, "0.10", 100_000)).unwrap();

    // Alice, the maker, gets a sell-side fill
    let fill = sub_alice.try_recv().unwrap();
    match fill {
        Event::Fill(notice) => assert_eq!(notice.side, Side::Sell),
        other => panic!("expected fill, got {other:?}"),
    }

    // Carol only sees the broadcast book update
    let carol_event = sub_carol.try_recv().unwrap();
    assert!(matches!(carol_event, Event::OrderBookUpdate(_)));
    assert!(sub_carol.try_recv().is_none());
}

#[test]
fn market_order_total_trade_count_matches_crossings() {
    let ex = exchange();
    let alice = account(&ex);
    let bob = account(&ex);

    for i in 0..3u64 {
        ex.place_order(alice, limit(Side::Sell, "0.01", 100_000 + i * 10))
            .unwrap();
    }
    let buy = ex.place_order(bob, market(Side::Buy, "0.03")).unwrap();
    assert_eq!(buy.trades.len(), 3);
    assert_eq!(ex.get_trades(bob).unwrap().len(), 3);
}
