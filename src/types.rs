//! Core types and data structures for the ledger core

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{LedgerError, LedgerResult};

pub(crate) fn zero() -> BigDecimal {
    BigDecimal::from(0)
}

pub(crate) fn now() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

/// Account types following standard accounting principles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// Assets - what the business owns (Cash, Inventory, Equipment, etc.)
    Asset,
    /// Liabilities - what the business owes (Loans, Accounts Payable, etc.)
    Liability,
    /// Equity - owner's interest in the business (Capital, Retained Earnings, etc.)
    Equity,
    /// Revenue - money earned by the business
    Revenue,
    /// Expenses - costs incurred by the business
    Expense,
}

impl AccountType {
    /// Returns the normal balance side for this account type
    /// Assets and Expenses normally have debit balances
    /// Liabilities, Equity, and Revenue normally have credit balances
    pub fn normal_balance(&self) -> BalanceSide {
        match self {
            AccountType::Asset | AccountType::Expense => BalanceSide::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Revenue => {
                BalanceSide::Credit
            }
        }
    }
}

/// Side of a balance or a journal line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BalanceSide {
    Debit,
    Credit,
}

impl BalanceSide {
    /// Signed value of `amount` on this side, debits positive
    pub fn signed(&self, amount: &BigDecimal) -> BigDecimal {
        match self {
            BalanceSide::Debit => amount.clone(),
            BalanceSide::Credit => -amount.clone(),
        }
    }
}

/// Account as seen by the ledger core.
///
/// Owned by the chart of accounts; this crate only ever writes
/// `current_balance` and `version`, and only through a posting commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier for the account
    pub id: String,
    /// Chart-of-accounts code (unique)
    pub code: String,
    /// Human-readable account name
    pub name: String,
    /// Type of account (Asset, Liability, etc.)
    pub account_type: AccountType,
    /// Opening balance amount, always non-negative
    pub opening_balance: BigDecimal,
    /// Side the opening balance sits on
    pub opening_balance_side: BalanceSide,
    /// Running balance, signed with debits positive
    pub current_balance: BigDecimal,
    /// Inactive accounts are rejected by the validator and skipped by trial balances
    pub is_active: bool,
    /// Optimistic concurrency version, bumped on every balance write
    pub version: u64,
    /// When the account was created
    pub created_at: NaiveDateTime,
    /// When the account was last updated
    pub updated_at: NaiveDateTime,
}

impl Account {
    /// Create a new account with a zero opening balance
    pub fn new(
        id: impl Into<String>,
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
    ) -> Self {
        let now = now();
        Self {
            id: id.into(),
            code: code.into(),
            name: name.into(),
            account_type,
            opening_balance: zero(),
            opening_balance_side: account_type.normal_balance(),
            current_balance: zero(),
            is_active: true,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the opening balance; the current balance starts from it
    pub fn with_opening_balance(mut self, amount: BigDecimal, side: BalanceSide) -> Self {
        self.opening_balance = amount;
        self.opening_balance_side = side;
        self.current_balance = self.signed_opening_balance();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Returns the normal balance side for this account
    pub fn normal_balance(&self) -> BalanceSide {
        self.account_type.normal_balance()
    }

    /// Opening balance signed with debits positive
    pub fn signed_opening_balance(&self) -> BigDecimal {
        self.opening_balance_side.signed(&self.opening_balance)
    }
}

/// A bounded date range gating which entries may be created or posted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialPeriod {
    pub id: String,
    /// Period code, e.g. "2024-01" (unique)
    pub code: String,
    /// Fiscal calendar the period belongs to; ranges within one calendar never overlap
    pub fiscal_year: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_closed: bool,
    pub closed_by: Option<String>,
    pub closed_at: Option<NaiveDateTime>,
}

impl FinancialPeriod {
    pub fn new(
        id: impl Into<String>,
        code: impl Into<String>,
        fiscal_year: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            fiscal_year: fiscal_year.into(),
            start_date,
            end_date,
            is_closed: false,
            closed_by: None,
            closed_at: None,
        }
    }

    /// Whether `date` falls inside the period (both ends inclusive)
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Whether two periods of the same fiscal calendar share any day
    pub fn overlaps(&self, other: &FinancialPeriod) -> bool {
        self.fiscal_year == other.fiscal_year
            && self.start_date <= other.end_date
            && other.start_date <= self.end_date
    }

    pub fn state_label(&self) -> &'static str {
        if self.is_closed {
            "CLOSED"
        } else {
            "OPEN"
        }
    }
}

/// Lifecycle status of a journal entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JournalStatus {
    Draft,
    Posted,
    Cancelled,
}

impl fmt::Display for JournalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JournalStatus::Draft => "DRAFT",
            JournalStatus::Posted => "POSTED",
            JournalStatus::Cancelled => "CANCELLED",
        };
        f.write_str(label)
    }
}

/// Where a ledger posting originated
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    /// Manually entered journal entry
    JournalEntry,
    /// Reversing entry generated for a posted journal entry
    Reversal,
    /// Document from another module (sales invoice, purchase bill, ...)
    External(String),
}

/// Back-reference to the document a journal entry was generated from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub source_type: SourceType,
    pub source_id: String,
}

impl SourceRef {
    pub fn external(source_type: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            source_type: SourceType::External(source_type.into()),
            source_id: source_id.into(),
        }
    }
}

/// Caller-supplied line of a journal draft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftLine {
    pub account_id: String,
    pub debit: BigDecimal,
    pub credit: BigDecimal,
    pub description: Option<String>,
}

impl DraftLine {
    /// Create a debit line
    pub fn debit(account_id: impl Into<String>, amount: BigDecimal) -> Self {
        Self {
            account_id: account_id.into(),
            debit: amount,
            credit: zero(),
            description: None,
        }
    }

    /// Create a credit line
    pub fn credit(account_id: impl Into<String>, amount: BigDecimal) -> Self {
        Self {
            account_id: account_id.into(),
            debit: zero(),
            credit: amount,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Candidate journal entry submitted for create or update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalDraft {
    /// Unique journal number; generated when absent
    pub journal_number: Option<String>,
    pub entry_date: NaiveDate,
    pub period_id: String,
    pub description: String,
    pub lines: Vec<DraftLine>,
}

impl JournalDraft {
    /// Calculate total debits
    pub fn total_debit(&self) -> BigDecimal {
        self.lines.iter().map(|l| &l.debit).sum()
    }

    /// Calculate total credits
    pub fn total_credit(&self) -> BigDecimal {
        self.lines.iter().map(|l| &l.credit).sum()
    }
}

/// One line of a journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntryLine {
    pub id: String,
    /// 1-based position within the entry; posting follows this order
    pub line_number: usize,
    pub account_id: String,
    pub debit: BigDecimal,
    pub credit: BigDecimal,
    pub description: Option<String>,
}

impl JournalEntryLine {
    /// The side carrying the non-zero amount
    pub fn amount_side(&self) -> BalanceSide {
        if self.debit > zero() {
            BalanceSide::Debit
        } else {
            BalanceSide::Credit
        }
    }
}

/// A journal entry and its exclusively owned lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub journal_number: String,
    pub entry_date: NaiveDate,
    pub period_id: String,
    pub description: String,
    pub remarks: Option<String>,
    pub status: JournalStatus,
    lines: Vec<JournalEntryLine>,
    pub total_debit: BigDecimal,
    pub total_credit: BigDecimal,
    pub posted_by: Option<String>,
    pub posted_at: Option<NaiveDateTime>,
    pub approved_by: Option<String>,
    pub approved_at: Option<NaiveDateTime>,
    /// Set on a reversing entry: the entry it reverses
    pub reversal_of: Option<String>,
    /// Set on a posted entry once it has been reversed: the reversing entry
    pub reversed_by: Option<String>,
    pub source: Option<SourceRef>,
    /// Bumped by the store on every write; a write carrying a stale revision is rejected
    pub revision: u64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl JournalEntry {
    /// Build a new draft entry from a caller draft; amounts are rounded to `scale`
    pub fn from_draft(
        id: impl Into<String>,
        journal_number: impl Into<String>,
        draft: &JournalDraft,
        scale: i64,
    ) -> Self {
        let now = now();
        let lines = build_lines(&draft.lines, scale);
        let (total_debit, total_credit) = totals(&lines);
        Self {
            id: id.into(),
            journal_number: journal_number.into(),
            entry_date: draft.entry_date,
            period_id: draft.period_id.clone(),
            description: draft.description.clone(),
            remarks: None,
            status: JournalStatus::Draft,
            lines,
            total_debit,
            total_credit,
            posted_by: None,
            posted_at: None,
            approved_by: None,
            approved_at: None,
            reversal_of: None,
            reversed_by: None,
            source: None,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// The entry's lines in posting order
    pub fn lines(&self) -> &[JournalEntryLine] {
        &self.lines
    }

    /// The entry as a draft, e.g. for re-validation before posting
    pub fn to_draft(&self) -> JournalDraft {
        JournalDraft {
            journal_number: Some(self.journal_number.clone()),
            entry_date: self.entry_date,
            period_id: self.period_id.clone(),
            description: self.description.clone(),
            lines: self
                .lines
                .iter()
                .map(|line| DraftLine {
                    account_id: line.account_id.clone(),
                    debit: line.debit.clone(),
                    credit: line.credit.clone(),
                    description: line.description.clone(),
                })
                .collect(),
        }
    }

    /// Lines with debit and credit swapped, for a reversing entry
    pub fn reversed_lines(&self) -> Vec<DraftLine> {
        self.lines
            .iter()
            .map(|line| DraftLine {
                account_id: line.account_id.clone(),
                debit: line.credit.clone(),
                credit: line.debit.clone(),
                description: Some(format!(
                    "Reversal: {}",
                    line.description.as_deref().unwrap_or(&self.description)
                )),
            })
            .collect()
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed_by.is_some()
    }

    /// Human-readable state including the reversed marker
    pub fn state_label(&self) -> String {
        if self.is_reversed() {
            format!("{} (REVERSED)", self.status)
        } else {
            self.status.to_string()
        }
    }

    /// Fails with `InvalidOperation` unless the entry is a draft
    pub fn ensure_draft(&self, operation: &'static str) -> LedgerResult<()> {
        if self.status == JournalStatus::Draft {
            Ok(())
        } else {
            Err(LedgerError::invalid_operation(operation, self.state_label()))
        }
    }

    /// Replace header fields and the whole line set from `draft`.
    ///
    /// The old lines are dropped in the same assignment the new ones land in.
    pub fn replace_lines(&mut self, draft: &JournalDraft, scale: i64) -> LedgerResult<()> {
        self.ensure_draft("update journal entry")?;
        let lines = build_lines(&draft.lines, scale);
        let (total_debit, total_credit) = totals(&lines);
        if let Some(number) = &draft.journal_number {
            self.journal_number = number.clone();
        }
        self.entry_date = draft.entry_date;
        self.period_id = draft.period_id.clone();
        self.description = draft.description.clone();
        self.lines = lines;
        self.total_debit = total_debit;
        self.total_credit = total_credit;
        self.updated_at = now();
        Ok(())
    }

    /// DRAFT -> POSTED
    pub fn mark_posted(&mut self, posted_by: &str, at: NaiveDateTime) -> LedgerResult<()> {
        self.ensure_draft("post journal entry")?;
        self.status = JournalStatus::Posted;
        self.posted_by = Some(posted_by.to_string());
        self.posted_at = Some(at);
        self.updated_at = at;
        Ok(())
    }

    /// Record approver metadata on a posted entry
    pub fn approve(&mut self, approved_by: &str, at: NaiveDateTime) -> LedgerResult<()> {
        if self.status != JournalStatus::Posted || self.approved_by.is_some() {
            let state = match &self.approved_by {
                Some(approver) => format!("{} (approved by {approver})", self.state_label()),
                None => self.state_label(),
            };
            return Err(LedgerError::invalid_operation("approve journal entry", state));
        }
        self.approved_by = Some(approved_by.to_string());
        self.approved_at = Some(at);
        self.updated_at = at;
        Ok(())
    }

    /// DRAFT -> CANCELLED, appending the reason to the remarks
    pub fn cancel(&mut self, reason: &str, at: NaiveDateTime) -> LedgerResult<()> {
        self.ensure_draft("cancel journal entry")?;
        let note = format!("Cancelled: {reason}");
        self.remarks = Some(match self.remarks.take() {
            Some(existing) if !existing.is_empty() => format!("{existing}\n{note}"),
            _ => note,
        });
        self.status = JournalStatus::Cancelled;
        self.updated_at = at;
        Ok(())
    }

    /// Flag a posted entry as reversed by `reversing_id`
    pub fn mark_reversed(&mut self, reversing_id: &str, at: NaiveDateTime) -> LedgerResult<()> {
        if self.status != JournalStatus::Posted || self.is_reversed() {
            return Err(LedgerError::invalid_operation(
                "reverse journal entry",
                self.state_label(),
            ));
        }
        self.reversed_by = Some(reversing_id.to_string());
        self.updated_at = at;
        Ok(())
    }
}

fn build_lines(lines: &[DraftLine], scale: i64) -> Vec<JournalEntryLine> {
    lines
        .iter()
        .enumerate()
        .map(|(index, line)| JournalEntryLine {
            id: uuid::Uuid::new_v4().to_string(),
            line_number: index + 1,
            account_id: line.account_id.clone(),
            debit: line.debit.round(scale),
            credit: line.credit.round(scale),
            description: line.description.clone(),
        })
        .collect()
}

fn totals(lines: &[JournalEntryLine]) -> (BigDecimal, BigDecimal) {
    let debit = lines.iter().map(|l| &l.debit).sum();
    let credit = lines.iter().map(|l| &l.credit).sum();
    (debit, credit)
}

/// Immutable audit-trail row, one per posted journal line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralLedgerEntry {
    pub id: String,
    /// Store-wide insertion order
    pub sequence: u64,
    pub transaction_date: NaiveDate,
    pub period_id: String,
    pub account_id: String,
    pub journal_entry_id: String,
    pub journal_line_id: String,
    pub debit: BigDecimal,
    pub credit: BigDecimal,
    /// Account balance right after this row was applied
    pub balance_after: BigDecimal,
    pub source_type: SourceType,
    pub source_id: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

/// One account's row of a period trial balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalanceLine {
    pub period_id: String,
    pub account_id: String,
    pub account_code: String,
    pub account_name: String,
    pub opening_debit: BigDecimal,
    pub opening_credit: BigDecimal,
    pub period_debit: BigDecimal,
    pub period_credit: BigDecimal,
    pub closing_debit: BigDecimal,
    pub closing_credit: BigDecimal,
    pub generated_at: NaiveDateTime,
    pub generated_by: String,
}

/// Trial balance for a period with its column totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalance {
    pub period_id: String,
    pub lines: Vec<TrialBalanceLine>,
    pub total_closing_debit: BigDecimal,
    pub total_closing_credit: BigDecimal,
    /// Whether the trial balance is balanced
    pub is_balanced: bool,
}

impl TrialBalance {
    pub fn from_lines(period_id: impl Into<String>, lines: Vec<TrialBalanceLine>) -> Self {
        let total_closing_debit: BigDecimal = lines.iter().map(|l| &l.closing_debit).sum();
        let total_closing_credit: BigDecimal = lines.iter().map(|l| &l.closing_credit).sum();
        let is_balanced = total_closing_debit == total_closing_credit;
        Self {
            period_id: period_id.into(),
            lines,
            total_closing_debit,
            total_closing_credit,
            is_balanced,
        }
    }

    pub fn line_for(&self, account_id: &str) -> Option<&TrialBalanceLine> {
        self.lines.iter().find(|l| l.account_id == account_id)
    }
}

/// Filter for listing journal entries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JournalFilter {
    pub period_id: Option<String>,
    pub status: Option<JournalStatus>,
}

impl JournalFilter {
    pub fn matches(&self, entry: &JournalEntry) -> bool {
        self.period_id
            .as_ref()
            .is_none_or(|p| &entry.period_id == p)
            && self.status.is_none_or(|s| entry.status == s)
    }
}
