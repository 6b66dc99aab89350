//! Main ledger service that coordinates journals, posting, periods and trial balances

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::LedgerConfig;
use crate::error::LedgerResult;
use crate::ledger::{
    AccountManager, BalanceMaintainer, DefaultJournalValidator, JournalManager, PeriodController,
    PostingEngine, TrialBalanceGenerator,
};
use crate::traits::*;
use crate::types::*;

/// The general ledger service boundary
///
/// Every operation takes `&self`; share the ledger across tasks behind an `Arc`.
pub struct Ledger<S: LedgerStorage> {
    storage: S,
    config: LedgerConfig,
    maintainer: BalanceMaintainer,
    account_manager: AccountManager<S>,
    period_controller: PeriodController<S>,
    journal_manager: JournalManager<S>,
    posting_engine: PostingEngine<S>,
    trial_balance_generator: TrialBalanceGenerator<S>,
}

impl<S: LedgerStorage + Clone> Ledger<S> {
    /// Create a new ledger with the given storage backend and default configuration
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, LedgerConfig::default())
    }

    /// Create a new ledger with explicit configuration
    pub fn with_config(storage: S, config: LedgerConfig) -> Self {
        Self::with_validator(storage, config, Arc::new(DefaultJournalValidator))
    }

    /// Create a new ledger with a custom journal validator
    pub fn with_validator(
        storage: S,
        config: LedgerConfig,
        validator: Arc<dyn JournalValidator>,
    ) -> Self {
        let maintainer = BalanceMaintainer::new(config.scale);
        Self {
            account_manager: AccountManager::new(storage.clone(), maintainer),
            period_controller: PeriodController::new(storage.clone(), &config),
            journal_manager: JournalManager::new(storage.clone(), validator.clone(), &config),
            posting_engine: PostingEngine::new(storage.clone(), validator, &config),
            trial_balance_generator: TrialBalanceGenerator::new(storage.clone(), &config),
            storage,
            maintainer,
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // Journal entry operations
    /// Validate and store a new DRAFT journal entry
    pub async fn create_journal_entry(&self, draft: JournalDraft) -> LedgerResult<JournalEntry> {
        self.journal_manager.create(draft).await
    }

    /// Replace the header and the whole line set of a DRAFT entry
    pub async fn update_journal_entry(
        &self,
        entry_id: &str,
        draft: JournalDraft,
    ) -> LedgerResult<JournalEntry> {
        self.journal_manager.update(entry_id, draft).await
    }

    /// Post a DRAFT entry into the general ledger
    pub async fn post_journal_entry(
        &self,
        entry_id: &str,
        posted_by: &str,
    ) -> LedgerResult<JournalEntry> {
        self.posting_engine.post(entry_id, posted_by).await
    }

    /// Record approval of a POSTED entry
    pub async fn approve_journal_entry(
        &self,
        entry_id: &str,
        approved_by: &str,
    ) -> LedgerResult<JournalEntry> {
        self.journal_manager.approve(entry_id, approved_by).await
    }

    /// Cancel a DRAFT entry
    pub async fn cancel_journal_entry(
        &self,
        entry_id: &str,
        reason: &str,
    ) -> LedgerResult<JournalEntry> {
        self.journal_manager.cancel(entry_id, reason).await
    }

    /// Delete a DRAFT entry
    pub async fn delete_journal_entry(&self, entry_id: &str) -> LedgerResult<()> {
        self.journal_manager.delete(entry_id).await
    }

    /// Post a reversing entry for a POSTED entry; returns the reversing entry
    pub async fn reverse_journal_entry(
        &self,
        entry_id: &str,
        reversed_by: &str,
        reversal_date: NaiveDate,
        reason: &str,
    ) -> LedgerResult<JournalEntry> {
        self.posting_engine
            .reverse(entry_id, reversed_by, reversal_date, reason)
            .await
    }

    /// Create and post an entry for a document owned by another module
    pub async fn post_source_document(
        &self,
        draft: JournalDraft,
        source: SourceRef,
        posted_by: &str,
    ) -> LedgerResult<JournalEntry> {
        self.posting_engine
            .post_source_document(draft, source, posted_by)
            .await
    }

    pub async fn get_journal_entry(&self, entry_id: &str) -> LedgerResult<Option<JournalEntry>> {
        self.journal_manager.get(entry_id).await
    }

    pub async fn list_journal_entries(
        &self,
        filter: &JournalFilter,
    ) -> LedgerResult<Vec<JournalEntry>> {
        self.journal_manager.list(filter).await
    }

    // Balance and ledger reads
    /// Current balance of an account, signed with debits positive
    pub async fn get_account_balance(&self, account_id: &str) -> LedgerResult<BigDecimal> {
        self.account_manager.get_balance(account_id).await
    }

    /// Ledger rows of an account in chronological order
    pub async fn get_ledger_for_account(
        &self,
        account_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> LedgerResult<Vec<GeneralLedgerEntry>> {
        self.account_manager.get_account_required(account_id).await?;
        self.storage.ledger_for_account(account_id, from, to).await
    }

    /// Ledger rows produced by one journal entry
    pub async fn get_ledger_for_journal(
        &self,
        entry_id: &str,
    ) -> LedgerResult<Vec<GeneralLedgerEntry>> {
        self.storage.ledger_for_journal(entry_id).await
    }

    // Trial balance operations
    /// Rebuild and store the trial balance of a period
    pub async fn generate_trial_balance(
        &self,
        period_id: &str,
        generated_by: &str,
    ) -> LedgerResult<TrialBalance> {
        self.trial_balance_generator
            .generate(period_id, generated_by)
            .await
    }

    /// Last generated trial balance of a period
    pub async fn get_trial_balance(&self, period_id: &str) -> LedgerResult<TrialBalance> {
        self.trial_balance_generator.get_by_period(period_id).await
    }

    // Period operations
    pub async fn create_period(&self, period: FinancialPeriod) -> LedgerResult<FinancialPeriod> {
        self.period_controller.create_period(period).await
    }

    pub async fn get_period(&self, period_id: &str) -> LedgerResult<Option<FinancialPeriod>> {
        self.period_controller.get_period(period_id).await
    }

    pub async fn list_periods(&self) -> LedgerResult<Vec<FinancialPeriod>> {
        self.period_controller.list_periods().await
    }

    pub async fn find_period_for_date(
        &self,
        date: NaiveDate,
    ) -> LedgerResult<Option<FinancialPeriod>> {
        self.period_controller.find_period_for_date(date).await
    }

    pub async fn close_period(
        &self,
        period_id: &str,
        closed_by: &str,
    ) -> LedgerResult<FinancialPeriod> {
        self.period_controller.close_period(period_id, closed_by).await
    }

    pub async fn reopen_period(&self, period_id: &str) -> LedgerResult<FinancialPeriod> {
        self.period_controller.reopen_period(period_id).await
    }

    // Account operations
    /// Register an account supplied by the chart of accounts
    pub async fn register_account(&self, account: Account) -> LedgerResult<Account> {
        self.account_manager.register_account(account).await
    }

    pub async fn get_account(&self, account_id: &str) -> LedgerResult<Option<Account>> {
        self.account_manager.get_account(account_id).await
    }

    pub async fn list_active_accounts(&self) -> LedgerResult<Vec<Account>> {
        self.account_manager.list_active_accounts().await
    }

    /// Recompute every account balance from its opening balance and the ledger
    ///
    /// Accounts and ledger sums come from one store snapshot, so postings
    /// committed concurrently never show up as drift.
    pub async fn verify_balances(&self) -> LedgerResult<IntegrityReport> {
        let BalanceSnapshot {
            accounts,
            movements,
            sequence,
        } = self.storage.balance_snapshot().await?;

        let mut issues = Vec::new();
        let mut mismatches = Vec::new();

        let ledger_total_debit: BigDecimal = movements.values().map(|m| &m.debit).sum();
        let ledger_total_credit: BigDecimal = movements.values().map(|m| &m.credit).sum();
        if ledger_total_debit != ledger_total_credit {
            issues.push(format!(
                "Ledger is not balanced: debits = {}, credits = {}",
                ledger_total_debit, ledger_total_credit
            ));
        }

        let empty = Movement::default();
        for account in &accounts {
            let movement = movements.get(&account.id).unwrap_or(&empty);
            let expected = self
                .maintainer
                .expected_balance(account, &movement.debit, &movement.credit);
            let recorded = self.maintainer.current_balance(account);
            if expected != recorded {
                issues.push(format!(
                    "Account {} balance is {}, ledger implies {}",
                    account.code, recorded, expected
                ));
                mismatches.push(BalanceMismatch {
                    account_id: account.id.clone(),
                    recorded,
                    expected,
                });
            }
        }

        for account_id in movements.keys() {
            if !accounts.iter().any(|a| &a.id == account_id) {
                issues.push(format!("Ledger rows reference unknown account {account_id}"));
            }
        }

        if issues.is_empty() {
            tracing::info!(accounts = accounts.len(), sequence, "ledger balances verified");
        } else {
            tracing::warn!(issues = issues.len(), sequence, "ledger integrity issues found");
        }

        Ok(IntegrityReport {
            is_valid: issues.is_empty(),
            issues,
            mismatches,
            ledger_total_debit,
            ledger_total_credit,
        })
    }
}

/// An account whose stored balance disagrees with its ledger history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceMismatch {
    pub account_id: String,
    pub recorded: BigDecimal,
    pub expected: BigDecimal,
}

/// Report on ledger integrity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub mismatches: Vec<BalanceMismatch>,
    pub ledger_total_debit: BigDecimal,
    pub ledger_total_credit: BigDecimal,
}
