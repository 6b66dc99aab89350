//! Account access for the ledger core
//!
//! Chart-of-accounts maintenance lives outside this crate. The ledger only
//! registers accounts it is handed, reads them, and reports balances.

use bigdecimal::BigDecimal;

use crate::error::{LedgerError, LedgerResult, ValidationError};
use crate::ledger::balance::BalanceMaintainer;
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::validate_account;

/// Account manager for the read side of the chart of accounts
pub struct AccountManager<S: LedgerStorage> {
    storage: S,
    maintainer: BalanceMaintainer,
}

impl<S: LedgerStorage> AccountManager<S> {
    /// Create a new account manager
    pub fn new(storage: S, maintainer: BalanceMaintainer) -> Self {
        Self {
            storage,
            maintainer,
        }
    }

    /// Register an account handed over by the chart of accounts.
    ///
    /// The opening balance must already be at the ledger scale; it is the
    /// base every later balance is recomputed from.
    pub async fn register_account(&self, account: Account) -> LedgerResult<Account> {
        validate_account(&account)?;
        if !self.maintainer.fits_scale(&account.opening_balance) {
            return Err(ValidationError::InvalidField {
                field: "opening balance",
                reason: format!(
                    "{} has more than {} decimal places",
                    account.opening_balance,
                    self.maintainer.scale()
                ),
            }
            .into());
        }

        let mut account = account;
        account.current_balance = account.signed_opening_balance();
        account.version = 0;

        self.storage.insert_account(&account).await?;
        tracing::info!(account_id = %account.id, code = %account.code, "account registered");

        Ok(account)
    }

    /// Get an account by ID
    pub async fn get_account(&self, account_id: &str) -> LedgerResult<Option<Account>> {
        self.storage.get_account(account_id).await
    }

    /// Get an account by ID, returning an error if not found
    pub async fn get_account_required(&self, account_id: &str) -> LedgerResult<Account> {
        self.storage
            .get_account(account_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("account", account_id))
    }

    /// List active accounts ordered by code
    pub async fn list_active_accounts(&self) -> LedgerResult<Vec<Account>> {
        let accounts = self.storage.list_accounts().await?;
        Ok(accounts.into_iter().filter(|a| a.is_active).collect())
    }

    /// Current balance of an account, signed with debits positive
    pub async fn get_balance(&self, account_id: &str) -> LedgerResult<BigDecimal> {
        let account = self.get_account_required(account_id).await?;
        Ok(self.maintainer.current_balance(&account))
    }
}
