//! Traits for storage abstraction and extensibility

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{LedgerResult, ValidationError};
use crate::types::*;

/// Status a stored journal entry must still have when a write lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalPrecondition {
    /// Operation name reported in `InvalidOperation`
    pub operation: &'static str,
    pub expected_status: JournalStatus,
    /// Both the stored and the incoming entry's period must be open
    pub require_open_period: bool,
}

/// New balance for one account, valid only if the account is still at `expected_version`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceUpdate {
    pub account_id: String,
    pub expected_version: u64,
    pub new_balance: BigDecimal,
}

/// Everything one posting writes, committed as a single unit
#[derive(Debug, Clone, PartialEq)]
pub struct PostingBatch {
    /// The entry in its posted state
    pub entry: JournalEntry,
    /// `Some(status)` when the stored entry must transition from `status`;
    /// `None` when the entry is new and is inserted already posted
    pub expected_status: Option<JournalStatus>,
    /// Ledger rows in line order; the store assigns `sequence`
    pub ledger_entries: Vec<GeneralLedgerEntry>,
    pub balance_updates: Vec<BalanceUpdate>,
    /// Original entry flagged as reversed by `entry`
    pub reverses: Option<JournalEntry>,
}

/// Summed debit and credit movement of one account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub debit: BigDecimal,
    pub credit: BigDecimal,
}

impl Movement {
    pub fn add(&mut self, debit: &BigDecimal, credit: &BigDecimal) {
        self.debit += debit;
        self.credit += credit;
    }

    /// Debit minus credit
    pub fn net(&self) -> BigDecimal {
        &self.debit - &self.credit
    }
}

/// Per-account ledger sums for one period, read in a single consistent view
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerSnapshot {
    /// All accounts ordered by code, as of the same moment
    pub accounts: Vec<Account>,
    /// Movement posted into the period
    pub period: HashMap<String, Movement>,
    /// Movement dated before the period start
    pub prior: HashMap<String, Movement>,
    /// Highest ledger sequence included (0 for an empty ledger)
    pub sequence: u64,
}

/// Accounts and whole-ledger sums, read in a single consistent view
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceSnapshot {
    /// All accounts ordered by code
    pub accounts: Vec<Account>,
    /// Debit and credit totals per account over the whole ledger
    pub movements: HashMap<String, Movement>,
    /// Highest ledger sequence included (0 for an empty ledger)
    pub sequence: u64,
}

/// Storage abstraction for the ledger core
///
/// Every method is a single atomic unit: implementations check the stated
/// preconditions and apply the write under the same lock or transaction, so
/// a failed call leaves the store unchanged. The ledger table is append-only;
/// no method updates or deletes a `GeneralLedgerEntry`.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    /// Insert an account; fails with `DuplicateResource` on a taken id or code
    async fn insert_account(&self, account: &Account) -> LedgerResult<()>;

    /// Get an account by ID
    async fn get_account(&self, account_id: &str) -> LedgerResult<Option<Account>>;

    /// List all accounts ordered by code
    async fn list_accounts(&self) -> LedgerResult<Vec<Account>>;

    /// Insert a period, enforcing unique codes and non-overlapping ranges per fiscal year
    async fn insert_period(&self, period: &FinancialPeriod) -> LedgerResult<()>;

    /// Get a period by ID
    async fn get_period(&self, period_id: &str) -> LedgerResult<Option<FinancialPeriod>>;

    /// List all periods ordered by start date
    async fn list_periods(&self) -> LedgerResult<Vec<FinancialPeriod>>;

    /// OPEN -> CLOSED; `InvalidOperation` if already closed
    async fn close_period(
        &self,
        period_id: &str,
        closed_by: &str,
        closed_at: NaiveDateTime,
    ) -> LedgerResult<FinancialPeriod>;

    /// CLOSED -> OPEN; `InvalidOperation` if already open, or if a trial
    /// balance exists for the period and `allow_with_trial_balance` is false
    async fn reopen_period(
        &self,
        period_id: &str,
        allow_with_trial_balance: bool,
    ) -> LedgerResult<FinancialPeriod>;

    /// Next journal number for `prefix` in the month of `date`; numbers are never handed out twice
    async fn allocate_journal_number(&self, prefix: &str, date: NaiveDate) -> LedgerResult<String>;

    /// Insert a draft entry with its lines. The entry's period must exist and
    /// be open; the journal number is a uniqueness constraint.
    async fn insert_journal_entry(&self, entry: &JournalEntry) -> LedgerResult<()>;

    /// Replace a stored entry wholesale, lines included, if `precondition` still holds.
    ///
    /// `entry.revision` must match the stored revision (`Conflict` otherwise);
    /// the stored copy ends up at `entry.revision + 1`.
    async fn replace_journal_entry(
        &self,
        entry: &JournalEntry,
        precondition: JournalPrecondition,
    ) -> LedgerResult<()>;

    /// Remove an entry and its lines if `precondition` still holds
    async fn delete_journal_entry(
        &self,
        entry_id: &str,
        precondition: JournalPrecondition,
    ) -> LedgerResult<()>;

    /// Get a journal entry by ID
    async fn get_journal_entry(&self, entry_id: &str) -> LedgerResult<Option<JournalEntry>>;

    /// List journal entries ordered by entry date then journal number
    async fn list_journal_entries(&self, filter: &JournalFilter) -> LedgerResult<Vec<JournalEntry>>;

    /// Apply a posting: entry transition, ledger rows and balance writes, all or nothing.
    ///
    /// Fails with `Conflict` if any account moved past its expected version,
    /// `InvalidOperation` if the entry (or the reversed original) is no longer
    /// in the expected state, and `ClosedPeriod` if the period closed. Revisions
    /// are checked and bumped as in `replace_journal_entry`; a new entry is
    /// stored at revision 0.
    async fn commit_posting(&self, batch: &PostingBatch) -> LedgerResult<()>;

    /// Ledger rows of an account in chronological order, optionally bounded by date (inclusive)
    async fn ledger_for_account(
        &self,
        account_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> LedgerResult<Vec<GeneralLedgerEntry>>;

    /// Ledger rows produced by one journal entry, in line order
    async fn ledger_for_journal(&self, entry_id: &str) -> LedgerResult<Vec<GeneralLedgerEntry>>;

    /// Accounts plus per-account sums for `period` and for everything dated before it
    async fn ledger_snapshot(&self, period: &FinancialPeriod) -> LedgerResult<LedgerSnapshot>;

    /// Accounts plus per-account sums over the whole ledger
    async fn balance_snapshot(&self) -> LedgerResult<BalanceSnapshot>;

    /// Swap the stored trial balance of a period for `lines` built from the
    /// ledger up to `as_of_sequence`.
    ///
    /// A stored trial balance built from a later sequence is kept instead.
    /// Returns the lines stored once the call completes.
    async fn replace_trial_balance(
        &self,
        period_id: &str,
        lines: &[TrialBalanceLine],
        as_of_sequence: u64,
    ) -> LedgerResult<Vec<TrialBalanceLine>>;

    /// Last generated trial balance lines of a period (empty if never generated)
    async fn get_trial_balance(&self, period_id: &str) -> LedgerResult<Vec<TrialBalanceLine>>;
}

/// Read-only facts the validator checks a draft against
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    /// The draft's period, if it exists
    pub period: Option<FinancialPeriod>,
    /// Referenced accounts that exist, keyed by id
    pub accounts: HashMap<String, Account>,
    /// Currency precision totals are compared at
    pub scale: i64,
}

/// Trait for implementing journal draft validation rules
///
/// Implementations must be pure: no I/O, no mutation, same answer for the
/// same input.
pub trait JournalValidator: Send + Sync {
    fn validate(&self, draft: &JournalDraft, context: &ValidationContext)
        -> Result<(), ValidationError>;
}
