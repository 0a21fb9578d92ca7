//! Trading session facade
//!
//! The single entry point the transport layer talks to. One mutex guards
//! the book, the ledger, the order store and the session registry
//! together, so every user action is one linearizable transaction across
//! all of them. The critical section contains no I/O: events are built
//! under the lock and handed to the bus only after it is released.
//!
//! A panic inside the critical section poisons the lock; from then on
//! every operation reports `Halted` until the process restarts, which is
//! the documented response to an internal invariant violation.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use types::errors::{ExchangeError, ValidationError};
use types::ids::{AccountId, OrderId, SessionId};
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderKind, OrderStatus, Side};
use types::trade::Trade;

use crate::book::Book;
use crate::bus::{EventBus, Scope, Subscription};
use crate::clock::Clock;
use crate::config::ExchangeConfig;
use crate::events::{
    BalanceSnapshot, BookLevel, BookSnapshot, Event, FillNotice, MarketQuote, OpenOrder,
    UserSnapshot, UserTrade,
};
use crate::ledger::Ledger;
use crate::matching;
use crate::sessions::SessionRegistry;
use crate::simulator::MarketSim;

/// Incoming order parameters, as parsed by the transport
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub side: Side,
    pub kind: OrderKind,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
}

/// Amend parameters; at least one field must be set
#[derive(Debug, Clone, Default)]
pub struct AmendRequest {
    pub price: Option<Decimal>,
    pub quantity: Option<Decimal>,
}

/// Result of a place_order call
#[derive(Debug, Clone)]
pub struct PlaceOrderOutcome {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub trades: Vec<Trade>,
}

/// Result of an amend: the original id goes terminal, a replacement is
/// accepted under a fresh id
#[derive(Debug, Clone)]
pub struct AmendOutcome {
    pub cancelled_order_id: OrderId,
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub trades: Vec<Trade>,
}

/// A session lookup result; `created` tells the transport to set the
/// cookie
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub session_id: SessionId,
    pub account_id: AccountId,
    pub created: bool,
}

/// Everything guarded by the single core lock
struct Core {
    book: Book,
    ledger: Ledger,
    orders: HashMap<OrderId, Order>,
    sessions: SessionRegistry,
    next_sequence: u64,
    last_price: Price,
}

/// The exchange core and its event fanout
pub struct Exchange {
    core: Mutex<Core>,
    bus: EventBus,
    clock: Clock,
    config: ExchangeConfig,
}

impl Exchange {
    pub fn new(config: ExchangeConfig) -> Self {
        let core = Core {
            book: Book::new(),
            ledger: Ledger::new(config.starting_cash, config.starting_asset),
            orders: HashMap::new(),
            sessions: SessionRegistry::new(),
            next_sequence: 0,
            last_price: Price::new(config.reference_price),
        };
        Self {
            core: Mutex::new(core),
            bus: EventBus::new(config.subscriber_queue_capacity),
            clock: Clock::new(),
            config,
        }
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Resolve a bearer token to an account, creating both on first sight
    pub fn resolve_session(&self, token: Option<&str>) -> Result<ResolvedSession, ExchangeError> {
        let mut core = self.lock_core()?;
        let (session_id, account_id, created) = core.sessions.resolve(token);
        core.ledger.get_or_create(account_id);
        Ok(ResolvedSession {
            session_id,
            account_id,
            created,
        })
    }

    /// Accept, match and settle a new order
    pub fn place_order(
        &self,
        account: AccountId,
        request: OrderRequest,
    ) -> Result<PlaceOrderOutcome, ExchangeError> {
        let (quantity, price) = self.validate_request(&request)?;

        let mut core = self.lock_core()?;
        core.ledger.get_or_create(account);
        if !self.config.allow_negative_cash {
            self.check_funds(&core, &account, request.side, request.kind, quantity, price)?;
        }

        let (order, trades) =
            self.accept_order(&mut core, account, request.side, request.kind, quantity, price);
        let events = self.mutation_events(&core, &trades, account);
        drop(core);

        info!(
            order = %order.id,
            status = ?order.status,
            fills = trades.len(),
            "order processed"
        );
        self.bus.publish_all(events);

        Ok(PlaceOrderOutcome {
            order_id: order.id,
            status: order.status,
            trades,
        })
    }

    /// Cancel a resting order
    pub fn cancel_order(
        &self,
        account: AccountId,
        order_id: OrderId,
    ) -> Result<Order, ExchangeError> {
        let mut core = self.lock_core()?;

        let order = core.orders.get(&order_id).ok_or(ExchangeError::NotFound(order_id))?;
        if order.owner != account {
            return Err(ExchangeError::NotOwner(order_id));
        }
        if order.status.is_terminal() {
            return Err(ExchangeError::NotCancellable(order_id));
        }

        let order = core
            .orders
            .get_mut(&order_id)
            .expect("order presence checked above");
        order.cancel();
        let cancelled = order.clone();
        core.book.remove(&order_id);
        core.ledger.clear_open(&account, &order_id);

        let events = self.mutation_events(&core, &[], account);
        drop(core);

        info!(order = %order_id, "order cancelled");
        self.bus.publish_all(events);
        Ok(cancelled)
    }

    /// Amend a limit order's price and/or quantity as cancel-then-replace
    ///
    /// The original becomes terminal cancelled and a replacement with a
    /// fresh id and sequence enters the matching path, so it may fill
    /// immediately.
    pub fn amend_order(
        &self,
        account: AccountId,
        order_id: OrderId,
        request: AmendRequest,
    ) -> Result<AmendOutcome, ExchangeError> {
        if request.price.is_none() && request.quantity.is_none() {
            return Err(ValidationError::InvalidAmend(
                "a new price or quantity is required".to_string(),
            )
            .into());
        }

        let mut core = self.lock_core()?;

        let order = core.orders.get(&order_id).ok_or(ExchangeError::NotFound(order_id))?;
        if order.owner != account {
            return Err(ExchangeError::NotOwner(order_id));
        }
        if order.kind == OrderKind::Market || order.status.is_terminal() {
            return Err(ExchangeError::NotAmendable(order_id));
        }
        let side = order.side;
        let prior_price = order.price.expect("resting limit order has a price");
        let prior_remaining = order.remaining_quantity();

        // Validate the replacement before touching anything
        let new_price_dec = request.price.unwrap_or_else(|| prior_price.as_decimal());
        let new_price = self.validate_limit_price(new_price_dec)?;
        let new_qty_dec = request
            .quantity
            .unwrap_or_else(|| prior_remaining.as_decimal());
        let new_quantity = self.validate_quantity(new_qty_dec)?;
        if !self.config.allow_negative_cash {
            self.check_funds(
                &core,
                &account,
                side,
                OrderKind::Limit,
                new_quantity,
                Some(new_price),
            )?;
        }

        let order = core
            .orders
            .get_mut(&order_id)
            .expect("order presence checked above");
        order.cancel();
        core.book.remove(&order_id);
        core.ledger.clear_open(&account, &order_id);

        let (replacement, trades) = self.accept_order(
            &mut core,
            account,
            side,
            OrderKind::Limit,
            new_quantity,
            Some(new_price),
        );
        let events = self.mutation_events(&core, &trades, account);
        drop(core);

        info!(
            cancelled = %order_id,
            replacement = %replacement.id,
            "order amended"
        );
        self.bus.publish_all(events);

        Ok(AmendOutcome {
            cancelled_order_id: order_id,
            order_id: replacement.id,
            status: replacement.status,
            trades,
        })
    }

    /// Account snapshot with mark-to-market value
    pub fn get_user(&self, account: AccountId) -> Result<UserSnapshot, ExchangeError> {
        let mut core = self.lock_core()?;
        let last_price = core.last_price;
        let acct = core.ledger.get_or_create(account);
        Ok(UserSnapshot::from_account(acct, last_price))
    }

    /// The account's pending/partial orders in acceptance order
    pub fn get_orders(&self, account: AccountId) -> Result<Vec<OpenOrder>, ExchangeError> {
        let core = self.lock_core()?;
        Ok(self.open_orders_view(&core, &account))
    }

    /// The account's trade history, oldest first
    pub fn get_trades(&self, account: AccountId) -> Result<Vec<UserTrade>, ExchangeError> {
        let core = self.lock_core()?;
        Ok(core
            .ledger
            .trades_for(&account)
            .into_iter()
            .filter_map(|t| UserTrade::from_trade(t, &account, &self.config.symbol))
            .collect())
    }

    /// Top-N book snapshot, linearizable with mutations
    pub fn get_book(&self) -> Result<BookSnapshot, ExchangeError> {
        let core = self.lock_core()?;
        Ok(self.book_snapshot(&core))
    }

    /// Open a push subscription for an account
    ///
    /// The subscription queue is seeded with the initial `user_info` and
    /// `order_book` snapshots before any live event can be enqueued.
    pub fn subscribe(&self, account: AccountId) -> Result<Subscription, ExchangeError> {
        let mut core = self.lock_core()?;
        let last_price = core.last_price;
        let user = UserSnapshot::from_account(core.ledger.get_or_create(account), last_price);
        let book = self.book_snapshot(&core);

        let subscription = self.bus.subscribe(account);
        subscription.seed(vec![Event::UserInfo(user), Event::OrderBook(book)]);
        drop(core);

        debug!(account = %account, "push subscription opened");
        Ok(subscription)
    }

    /// Advance the simulated reference price and broadcast a quote
    ///
    /// The lock is held only long enough to read the top of the book.
    pub fn market_tick(&self, sim: &mut MarketSim) -> Result<MarketQuote, ExchangeError> {
        let price = sim.step();

        let quote = {
            let core = self.lock_core()?;
            let (bids, asks) = core.book.snapshot(self.config.book_depth);
            MarketQuote {
                symbol: self.config.symbol.clone(),
                price,
                bids: Self::levels(bids),
                asks: Self::levels(asks),
                timestamp: self.clock.now_nanos(),
            }
        };

        self.bus.publish(Scope::All, Event::MarketData(quote.clone()));
        Ok(quote)
    }

    /// Live subscriber count, for diagnostics
    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count()
    }

    // -------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------

    fn lock_core(&self) -> Result<MutexGuard<'_, Core>, ExchangeError> {
        self.core.lock().map_err(|_| ExchangeError::Halted)
    }

    /// Assign id/sequence, run the matching pass and park the remainder
    fn accept_order(
        &self,
        core: &mut Core,
        account: AccountId,
        side: Side,
        kind: OrderKind,
        quantity: Quantity,
        price: Option<Price>,
    ) -> (Order, Vec<Trade>) {
        core.next_sequence += 1;
        let sequence = core.next_sequence;
        let now = self.clock.now_nanos();
        let mut order = Order::new(account, side, kind, quantity, price, sequence, now);

        let trades = matching::match_incoming(
            &mut core.book,
            &mut core.orders,
            &mut core.ledger,
            &mut order,
            now,
        );

        if let Some(last) = trades.last() {
            core.last_price = last.price;
        }

        if order.remaining_quantity().is_zero() {
            // Fully filled on entry; never rests
        } else if order.kind == OrderKind::Limit {
            core.book.insert(&order);
            core.ledger.mark_open(&account, order.id);
        } else {
            // Market order with residual: the opposite side is exhausted
            order.cancel();
        }

        core.orders.insert(order.id, order.clone());
        (order, trades)
    }

    /// Events for one completed user action, in delivery order: fills,
    /// balance updates, open-order updates, then the book snapshot.
    fn mutation_events(
        &self,
        core: &Core,
        trades: &[Trade],
        initiator: AccountId,
    ) -> Vec<(Scope, Event)> {
        let mut events = Vec::new();

        let mut affected: Vec<AccountId> = Vec::new();
        for trade in trades {
            for party in [trade.buyer, trade.seller] {
                if !affected.contains(&party) {
                    affected.push(party);
                }
            }
        }

        for trade in trades {
            for party in [trade.buyer, trade.seller] {
                let acct = core
                    .ledger
                    .get(&party)
                    .expect("trade parties have accounts");
                let side = trade.side_for(&party).expect("party is on the trade");
                let order_id = trade.order_id_for(&party).expect("party is on the trade");
                events.push((
                    Scope::Account(party),
                    Event::Fill(FillNotice {
                        id: trade.id,
                        order_id,
                        side,
                        quantity: trade.quantity,
                        price: trade.price,
                        timestamp: trade.executed_at,
                        new_cash_balance: acct.cash_balance,
                        new_asset_balance: acct.asset_balance,
                    }),
                ));
            }
        }

        for party in &affected {
            let acct = core
                .ledger
                .get(party)
                .expect("trade parties have accounts");
            events.push((
                Scope::Account(*party),
                Event::BalanceUpdate(BalanceSnapshot {
                    cash_balance: acct.cash_balance,
                    asset_balance: acct.asset_balance,
                }),
            ));
        }

        let mut order_targets = affected;
        if !order_targets.contains(&initiator) {
            order_targets.push(initiator);
        }
        for party in &order_targets {
            events.push((
                Scope::Account(*party),
                Event::OrdersUpdate(self.open_orders_view(core, party)),
            ));
        }

        events.push((Scope::All, Event::OrderBookUpdate(self.book_snapshot(core))));
        events
    }

    fn open_orders_view(&self, core: &Core, account: &AccountId) -> Vec<OpenOrder> {
        let Some(acct) = core.ledger.get(account) else {
            return Vec::new();
        };
        let mut open: Vec<&Order> = acct
            .open_orders
            .iter()
            .filter_map(|id| core.orders.get(id))
            .collect();
        open.sort_by_key(|o| o.sequence);
        open.iter()
            .map(|o| OpenOrder::from_order(o, &self.config.symbol))
            .collect()
    }

    fn book_snapshot(&self, core: &Core) -> BookSnapshot {
        let (bids, asks) = core.book.snapshot(self.config.book_depth);
        BookSnapshot {
            symbol: self.config.symbol.clone(),
            bids: Self::levels(bids),
            asks: Self::levels(asks),
            last_price: core.last_price,
            timestamp: self.clock.now_nanos(),
        }
    }

    fn levels(levels: Vec<(Price, Quantity)>) -> Vec<BookLevel> {
        levels
            .into_iter()
            .map(|(price, quantity)| BookLevel { price, quantity })
            .collect()
    }

    fn validate_request(
        &self,
        request: &OrderRequest,
    ) -> Result<(Quantity, Option<Price>), ExchangeError> {
        let quantity = self.validate_quantity(request.quantity)?;

        let price = match request.kind {
            OrderKind::Limit => {
                let raw = request.price.ok_or_else(|| {
                    ValidationError::InvalidPrice("limit order requires a price".to_string())
                })?;
                Some(self.validate_limit_price(raw)?)
            }
            OrderKind::Market => {
                if request.price.is_some() {
                    return Err(ValidationError::InvalidPrice(
                        "market order does not take a price".to_string(),
                    )
                    .into());
                }
                None
            }
        };

        Ok((quantity, price))
    }

    fn validate_quantity(&self, raw: Decimal) -> Result<Quantity, ExchangeError> {
        let quantity = Quantity::try_new(raw).ok_or_else(|| {
            ValidationError::InvalidQuantity("quantity must be positive".to_string())
        })?;
        if quantity.decimal_places() > self.config.quantity_dp {
            return Err(ValidationError::InvalidQuantity(format!(
                "quantity precision exceeds {} decimal places",
                self.config.quantity_dp
            ))
            .into());
        }
        Ok(quantity)
    }

    fn validate_limit_price(&self, raw: Decimal) -> Result<Price, ExchangeError> {
        let price = Price::try_new(raw)
            .ok_or_else(|| ValidationError::InvalidPrice("price must be positive".to_string()))?;
        if !price.is_aligned(self.config.tick) {
            return Err(ValidationError::TickAlignment {
                price: price.to_string(),
                tick: self.config.tick.to_string(),
            }
            .into());
        }
        Ok(price)
    }

    /// Up-front funds check, active only when negative cash is disallowed
    ///
    /// Buys must be covered by cash at the limit price (market buys are
    /// estimated at the best ask, or 110% of the last price on an empty
    /// ask side); sells must be covered by asset.
    fn check_funds(
        &self,
        core: &Core,
        account: &AccountId,
        side: Side,
        kind: OrderKind,
        quantity: Quantity,
        price: Option<Price>,
    ) -> Result<(), ExchangeError> {
        let acct = core
            .ledger
            .get(account)
            .expect("account resolved before funds check");

        match side {
            Side::Buy => {
                let estimate = match (kind, price) {
                    (OrderKind::Limit, Some(p)) => p.as_decimal(),
                    _ => core
                        .book
                        .best_ask()
                        .map(|(p, _)| p.as_decimal())
                        .unwrap_or_else(|| {
                            core.last_price.as_decimal() * Decimal::new(11, 1)
                        }),
                };
                let required = estimate * quantity.as_decimal();
                if acct.cash_balance < required {
                    return Err(ValidationError::InsufficientBalance {
                        required: required.to_string(),
                        available: acct.cash_balance.to_string(),
                    }
                    .into());
                }
            }
            Side::Sell => {
                if acct.asset_balance < quantity.as_decimal() {
                    return Err(ValidationError::InsufficientBalance {
                        required: quantity.to_string(),
                        available: acct.asset_balance.to_string(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}
