//! Account ledger
//!
//! Owns every account plus the global trade tape. Balance mutation happens
//! only through [`Ledger::settle`], which the matching executor calls once
//! per crossing; everything else is read access.

use rust_decimal::Decimal;
use std::collections::HashMap;
use types::account::Account;
use types::ids::{AccountId, OrderId, TradeId};
use types::trade::Trade;

/// Per-user balances, open-order index and the append-only trade tape
#[derive(Debug)]
pub struct Ledger {
    accounts: HashMap<AccountId, Account>,
    starting_cash: Decimal,
    starting_asset: Decimal,
    tape: Vec<Trade>,
    tape_index: HashMap<TradeId, usize>,
}

impl Ledger {
    pub fn new(starting_cash: Decimal, starting_asset: Decimal) -> Self {
        Self {
            accounts: HashMap::new(),
            starting_cash,
            starting_asset,
            tape: Vec::new(),
            tape_index: HashMap::new(),
        }
    }

    /// Fetch an account, creating it with the starting balances on first
    /// sight
    pub fn get_or_create(&mut self, id: AccountId) -> &mut Account {
        let starting_cash = self.starting_cash;
        let starting_asset = self.starting_asset;
        self.accounts
            .entry(id)
            .or_insert_with(|| Account::new(id, starting_cash, starting_asset))
    }

    pub fn get(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.get(id)
    }

    pub fn account_mut(&mut self, id: &AccountId) -> Option<&mut Account> {
        self.accounts.get_mut(id)
    }

    /// Apply one trade to both parties and append it to the tape
    ///
    /// Cash and asset move in opposite directions on the two accounts, so
    /// settlement is zero-sum by construction.
    ///
    /// # Panics
    /// Panics if either party is unknown; orders are only ever accepted
    /// from resolved accounts, so a miss here is an internal fault.
    pub fn settle(&mut self, trade: &Trade) {
        let buyer = self
            .accounts
            .get_mut(&trade.buyer)
            .expect("buyer account must exist at settlement");
        buyer.apply_buy(trade.price, trade.quantity, trade.id);

        let seller = self
            .accounts
            .get_mut(&trade.seller)
            .expect("seller account must exist at settlement");
        seller.apply_sell(trade.price, trade.quantity, trade.id);

        self.tape_index.insert(trade.id, self.tape.len());
        self.tape.push(trade.clone());
    }

    /// Track an order id in its owner's open-order set
    pub fn mark_open(&mut self, account: &AccountId, order_id: OrderId) {
        if let Some(acct) = self.accounts.get_mut(account) {
            acct.open_orders.insert(order_id);
        }
    }

    /// Drop an order id from its owner's open-order set
    pub fn clear_open(&mut self, account: &AccountId, order_id: &OrderId) {
        if let Some(acct) = self.accounts.get_mut(account) {
            acct.open_orders.remove(order_id);
        }
    }

    pub fn trade(&self, id: &TradeId) -> Option<&Trade> {
        self.tape_index.get(id).map(|i| &self.tape[*i])
    }

    /// An account's trades joined via its trade log, oldest first
    pub fn trades_for(&self, account: &AccountId) -> Vec<&Trade> {
        let Some(acct) = self.accounts.get(account) else {
            return Vec::new();
        };
        acct.trade_log
            .iter()
            .filter_map(|id| self.trade(id))
            .collect()
    }

    /// Total number of trades ever executed
    pub fn trade_count(&self) -> usize {
        self.tape.len()
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::numeric::{Price, Quantity};

    fn ledger() -> Ledger {
        Ledger::new(Decimal::from(10_000), Decimal::ZERO)
    }

    #[test]
    fn test_get_or_create_seeds_starting_balances() {
        let mut ledger = ledger();
        let id = AccountId::new();

        let account = ledger.get_or_create(id);
        assert_eq!(account.cash_balance, Decimal::from(10_000));
        assert_eq!(account.asset_balance, Decimal::ZERO);

        // Second lookup returns the same account
        ledger.get_or_create(id).cash_balance = Decimal::from(5);
        assert_eq!(ledger.get(&id).unwrap().cash_balance, Decimal::from(5));
        assert_eq!(ledger.account_count(), 1);
    }

    #[test]
    fn test_settle_is_zero_sum() {
        let mut ledger = ledger();
        let buyer = AccountId::new();
        let seller = AccountId::new();
        ledger.get_or_create(buyer);
        ledger.get_or_create(seller);

        let trade = Trade::new(
            types::ids::OrderId::new(),
            types::ids::OrderId::new(),
            buyer,
            seller,
            Price::from_u64(100_000),
            Quantity::from_str("0.10").unwrap(),
            1_708_123_456_789_000_000,
        );
        ledger.settle(&trade);

        let total_cash: Decimal = ledger.accounts().map(|a| a.cash_balance).sum();
        let total_asset: Decimal = ledger.accounts().map(|a| a.asset_balance).sum();
        assert_eq!(total_cash, Decimal::from(20_000));
        assert_eq!(total_asset, Decimal::ZERO);

        assert_eq!(ledger.trade_count(), 1);
        assert_eq!(ledger.trades_for(&buyer).len(), 1);
        assert_eq!(ledger.trades_for(&seller).len(), 1);
    }

    #[test]
    fn test_open_order_tracking() {
        let mut ledger = ledger();
        let id = AccountId::new();
        ledger.get_or_create(id);

        let order_id = OrderId::new();
        ledger.mark_open(&id, order_id);
        assert!(ledger.get(&id).unwrap().open_orders.contains(&order_id));

        ledger.clear_open(&id, &order_id);
        assert!(ledger.get(&id).unwrap().open_orders.is_empty());
    }

    #[test]
    fn test_trades_for_preserves_settlement_order() {
        let mut ledger = ledger();
        let a = AccountId::new();
        let b = AccountId::new();
        ledger.get_or_create(a);
        ledger.get_or_create(b);

        for i in 1..=3u64 {
            let trade = Trade::new(
                OrderId::new(),
                OrderId::new(),
                a,
                b,
                Price::from_u64(100_000 + i * 10),
                Quantity::from_str("0.01").unwrap(),
                1_708_123_456_789_000_000 + i as i64,
            );
            ledger.settle(&trade);
        }

        let trades = ledger.trades_for(&a);
        assert_eq!(trades.len(), 3);
        assert!(trades.windows(2).all(|w| w[0].executed_at < w[1].executed_at));
    }
}
