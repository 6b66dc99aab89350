//! Account balance arithmetic
//!
//! Balances are signed with debits positive. The only way to undo a change is
//! another posting whose lines carry the opposite signs.

use bigdecimal::BigDecimal;
use std::collections::HashMap;

use crate::traits::BalanceUpdate;
use crate::types::*;

/// Computes running balances at a fixed decimal scale
#[derive(Debug, Clone, Copy)]
pub struct BalanceMaintainer {
    scale: i64,
}

impl BalanceMaintainer {
    pub fn new(scale: i64) -> Self {
        Self { scale }
    }

    pub fn scale(&self) -> i64 {
        self.scale
    }

    /// True if `amount` needs no rounding at the ledger scale
    pub fn fits_scale(&self, amount: &BigDecimal) -> bool {
        amount.round(self.scale) == *amount
    }

    /// `current + debit - credit`, rounded to the ledger scale
    pub fn apply_line(
        &self,
        current: &BigDecimal,
        debit: &BigDecimal,
        credit: &BigDecimal,
    ) -> BigDecimal {
        (current + debit - credit).round(self.scale)
    }

    pub fn current_balance(&self, account: &Account) -> BigDecimal {
        account.current_balance.round(self.scale)
    }

    /// Balance an account should have given its opening balance and ledger movement
    pub fn expected_balance(
        &self,
        account: &Account,
        debit: &BigDecimal,
        credit: &BigDecimal,
    ) -> BigDecimal {
        self.apply_line(&account.signed_opening_balance(), debit, credit)
    }
}

/// Running balances for the accounts touched by one posting.
///
/// Lines touching the same account see each other's effect, so the ledger's
/// balance snapshots follow line order.
#[derive(Debug)]
pub(crate) struct RunningBalances {
    maintainer: BalanceMaintainer,
    /// account id -> (version read, running balance)
    running: HashMap<String, (u64, BigDecimal)>,
    order: Vec<String>,
}

impl RunningBalances {
    pub(crate) fn new(maintainer: BalanceMaintainer, accounts: &HashMap<String, Account>) -> Self {
        let running = accounts
            .values()
            .map(|a| (a.id.clone(), (a.version, maintainer.current_balance(a))))
            .collect();
        Self {
            maintainer,
            running,
            order: Vec::new(),
        }
    }

    /// Apply one line; returns the account's balance right after it, or `None`
    /// if the account was not loaded
    pub(crate) fn apply(
        &mut self,
        account_id: &str,
        debit: &BigDecimal,
        credit: &BigDecimal,
    ) -> Option<BigDecimal> {
        let (_, balance) = self.running.get_mut(account_id)?;
        *balance = self.maintainer.apply_line(balance, debit, credit);
        if !self.order.iter().any(|id| id == account_id) {
            self.order.push(account_id.to_string());
        }
        Some(balance.clone())
    }

    /// One update per touched account, in first-touch order
    pub(crate) fn into_updates(mut self) -> Vec<BalanceUpdate> {
        self.order
            .iter()
            .filter_map(|id| {
                self.running
                    .remove(id)
                    .map(|(expected_version, new_balance)| BalanceUpdate {
                        account_id: id.clone(),
                        expected_version,
                        new_balance,
                    })
            })
            .collect()
    }
}
