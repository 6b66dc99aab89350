//! In-memory storage implementation for testing and development

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{LedgerError, LedgerResult, ValidationError};
use crate::traits::*;
use crate::types::*;

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<String, Account>,
    periods: HashMap<String, FinancialPeriod>,
    journals: HashMap<String, JournalEntry>,
    /// Unique index: journal number -> entry id
    journal_numbers: HashMap<String, String>,
    number_sequences: HashMap<String, u64>,
    ledger: Vec<GeneralLedgerEntry>,
    next_sequence: u64,
    trial_balances: HashMap<String, StoredTrialBalance>,
}

#[derive(Debug)]
struct StoredTrialBalance {
    as_of_sequence: u64,
    lines: Vec<TrialBalanceLine>,
}

impl State {
    fn sorted_accounts(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        accounts
    }

    fn open_period(&self, period_id: &str) -> LedgerResult<&FinancialPeriod> {
        let period = self
            .periods
            .get(period_id)
            .ok_or_else(|| ValidationError::UnknownPeriod {
                period_id: period_id.to_string(),
            })?;
        if period.is_closed {
            return Err(ValidationError::ClosedPeriod {
                period_id: period_id.to_string(),
            }
            .into());
        }
        Ok(period)
    }

    fn check_number_free(&self, number: &str, entry_id: &str) -> LedgerResult<()> {
        match self.journal_numbers.get(number) {
            Some(owner) if owner != entry_id => Err(LedgerError::DuplicateResource {
                kind: "journal number",
                key: number.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn stored_entry(
        &self,
        entry_id: &str,
        precondition: &JournalPrecondition,
    ) -> LedgerResult<&JournalEntry> {
        let stored = self
            .journals
            .get(entry_id)
            .ok_or_else(|| LedgerError::not_found("journal entry", entry_id))?;
        if stored.status != precondition.expected_status {
            return Err(LedgerError::invalid_operation(
                precondition.operation,
                stored.state_label(),
            ));
        }
        if precondition.require_open_period {
            self.open_period(&stored.period_id)?;
        }
        Ok(stored)
    }

    /// Rejects a write built from an older copy than the one stored
    fn check_revision(stored: &JournalEntry, incoming: &JournalEntry) -> LedgerResult<()> {
        if stored.revision != incoming.revision {
            return Err(LedgerError::Conflict(format!(
                "journal entry {} is at revision {}, write was based on {}",
                stored.id, stored.revision, incoming.revision
            )));
        }
        Ok(())
    }

    fn store_entry(&mut self, entry: &JournalEntry) {
        let mut row = entry.clone();
        if let Some(previous) = self.journals.get(&entry.id) {
            if previous.journal_number != entry.journal_number {
                self.journal_numbers.remove(&previous.journal_number);
            }
            row.revision = previous.revision + 1;
        }
        self.journal_numbers
            .insert(row.journal_number.clone(), row.id.clone());
        self.journals.insert(row.id.clone(), row);
    }
}

/// In-memory storage implementation for testing and development
///
/// All state sits behind one lock, so every trait method is atomic and
/// serialized against every other write.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<RwLock<State>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| LedgerError::Storage("ledger state lock poisoned".to_string()))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| LedgerError::Storage("ledger state lock poisoned".to_string()))
    }

    /// Number of ledger rows stored (useful for testing)
    pub fn ledger_len(&self) -> LedgerResult<usize> {
        Ok(self.read()?.ledger.len())
    }
}

#[async_trait]
impl LedgerStorage for MemoryStorage {
    async fn insert_account(&self, account: &Account) -> LedgerResult<()> {
        let mut state = self.write()?;
        if state.accounts.contains_key(&account.id) {
            return Err(LedgerError::DuplicateResource {
                kind: "account",
                key: account.id.clone(),
            });
        }
        if state.accounts.values().any(|a| a.code == account.code) {
            return Err(LedgerError::DuplicateResource {
                kind: "account code",
                key: account.code.clone(),
            });
        }
        state.accounts.insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn get_account(&self, account_id: &str) -> LedgerResult<Option<Account>> {
        Ok(self.read()?.accounts.get(account_id).cloned())
    }

    async fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
        Ok(self.read()?.sorted_accounts())
    }

    async fn insert_period(&self, period: &FinancialPeriod) -> LedgerResult<()> {
        let mut state = self.write()?;
        if state.periods.contains_key(&period.id) {
            return Err(LedgerError::DuplicateResource {
                kind: "financial period",
                key: period.id.clone(),
            });
        }
        for existing in state.periods.values() {
            if existing.code == period.code {
                return Err(LedgerError::DuplicateResource {
                    kind: "period code",
                    key: period.code.clone(),
                });
            }
            if existing.overlaps(period) {
                return Err(ValidationError::InvalidField {
                    field: "date range",
                    reason: format!("overlaps period {}", existing.code),
                }
                .into());
            }
        }
        state.periods.insert(period.id.clone(), period.clone());
        Ok(())
    }

    async fn get_period(&self, period_id: &str) -> LedgerResult<Option<FinancialPeriod>> {
        Ok(self.read()?.periods.get(period_id).cloned())
    }

    async fn list_periods(&self) -> LedgerResult<Vec<FinancialPeriod>> {
        let mut periods: Vec<FinancialPeriod> = self.read()?.periods.values().cloned().collect();
        periods.sort_by(|a, b| (a.start_date, &a.code).cmp(&(b.start_date, &b.code)));
        Ok(periods)
    }

    async fn close_period(
        &self,
        period_id: &str,
        closed_by: &str,
        closed_at: NaiveDateTime,
    ) -> LedgerResult<FinancialPeriod> {
        let mut state = self.write()?;
        let period = state
            .periods
            .get_mut(period_id)
            .ok_or_else(|| LedgerError::not_found("financial period", period_id))?;
        if period.is_closed {
            return Err(LedgerError::invalid_operation(
                "close period",
                period.state_label(),
            ));
        }
        period.is_closed = true;
        period.closed_by = Some(closed_by.to_string());
        period.closed_at = Some(closed_at);
        Ok(period.clone())
    }

    async fn reopen_period(
        &self,
        period_id: &str,
        allow_with_trial_balance: bool,
    ) -> LedgerResult<FinancialPeriod> {
        let mut state = self.write()?;
        let has_trial_balance = state
            .trial_balances
            .get(period_id)
            .is_some_and(|stored| !stored.lines.is_empty());
        let period = state
            .periods
            .get_mut(period_id)
            .ok_or_else(|| LedgerError::not_found("financial period", period_id))?;
        if !period.is_closed {
            return Err(LedgerError::invalid_operation(
                "reopen period",
                period.state_label(),
            ));
        }
        if has_trial_balance && !allow_with_trial_balance {
            return Err(LedgerError::invalid_operation(
                "reopen period",
                "CLOSED (trial balance generated)",
            ));
        }
        period.is_closed = false;
        period.closed_by = None;
        period.closed_at = None;
        Ok(period.clone())
    }

    async fn allocate_journal_number(&self, prefix: &str, date: NaiveDate) -> LedgerResult<String> {
        let mut state = self.write()?;
        let key = format!("{prefix}-{}", date.format("%Y%m"));
        loop {
            let sequence = state.number_sequences.entry(key.clone()).or_insert(0);
            *sequence += 1;
            let number = format!("{key}-{:05}", *sequence);
            // Skip numbers a caller already took by hand
            if !state.journal_numbers.contains_key(&number) {
                return Ok(number);
            }
        }
    }

    async fn insert_journal_entry(&self, entry: &JournalEntry) -> LedgerResult<()> {
        let mut state = self.write()?;
        if state.journals.contains_key(&entry.id) {
            return Err(LedgerError::DuplicateResource {
                kind: "journal entry",
                key: entry.id.clone(),
            });
        }
        state.open_period(&entry.period_id)?;
        state.check_number_free(&entry.journal_number, &entry.id)?;
        state.store_entry(entry);
        Ok(())
    }

    async fn replace_journal_entry(
        &self,
        entry: &JournalEntry,
        precondition: JournalPrecondition,
    ) -> LedgerResult<()> {
        let mut state = self.write()?;
        let stored = state.stored_entry(&entry.id, &precondition)?;
        State::check_revision(stored, entry)?;
        if precondition.require_open_period {
            state.open_period(&entry.period_id)?;
        }
        state.check_number_free(&entry.journal_number, &entry.id)?;
        state.store_entry(entry);
        Ok(())
    }

    async fn delete_journal_entry(
        &self,
        entry_id: &str,
        precondition: JournalPrecondition,
    ) -> LedgerResult<()> {
        let mut state = self.write()?;
        let number = state
            .stored_entry(entry_id, &precondition)?
            .journal_number
            .clone();
        state.journal_numbers.remove(&number);
        state.journals.remove(entry_id);
        Ok(())
    }

    async fn get_journal_entry(&self, entry_id: &str) -> LedgerResult<Option<JournalEntry>> {
        Ok(self.read()?.journals.get(entry_id).cloned())
    }

    async fn list_journal_entries(&self, filter: &JournalFilter) -> LedgerResult<Vec<JournalEntry>> {
        let mut entries: Vec<JournalEntry> = self
            .read()?
            .journals
            .values()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            (a.entry_date, &a.journal_number).cmp(&(b.entry_date, &b.journal_number))
        });
        Ok(entries)
    }

    async fn commit_posting(&self, batch: &PostingBatch) -> LedgerResult<()> {
        let mut state = self.write()?;
        let entry = &batch.entry;

        match batch.expected_status {
            Some(expected_status) => {
                let precondition = JournalPrecondition {
                    operation: "post journal entry",
                    expected_status,
                    require_open_period: false,
                };
                let stored = state.stored_entry(&entry.id, &precondition)?;
                State::check_revision(stored, entry)?;
            }
            None => {
                if state.journals.contains_key(&entry.id) {
                    return Err(LedgerError::DuplicateResource {
                        kind: "journal entry",
                        key: entry.id.clone(),
                    });
                }
            }
        }
        state.check_number_free(&entry.journal_number, &entry.id)?;
        state.open_period(&entry.period_id)?;

        if let Some(original) = &batch.reverses {
            let stored = state
                .journals
                .get(&original.id)
                .ok_or_else(|| LedgerError::not_found("journal entry", original.id.as_str()))?;
            if stored.status != JournalStatus::Posted || stored.is_reversed() {
                return Err(LedgerError::invalid_operation(
                    "reverse journal entry",
                    stored.state_label(),
                ));
            }
            State::check_revision(stored, original)?;
        }

        for update in &batch.balance_updates {
            let account = state
                .accounts
                .get(&update.account_id)
                .ok_or_else(|| LedgerError::not_found("account", update.account_id.as_str()))?;
            if account.version != update.expected_version {
                return Err(LedgerError::Conflict(format!(
                    "account {} is at version {}, expected {}",
                    account.id, account.version, update.expected_version
                )));
            }
        }

        // All checks passed; nothing below can fail
        let now = now();
        for update in &batch.balance_updates {
            if let Some(account) = state.accounts.get_mut(&update.account_id) {
                account.current_balance = update.new_balance.clone();
                account.version += 1;
                account.updated_at = now;
            }
        }
        for ledger_entry in &batch.ledger_entries {
            state.next_sequence += 1;
            let mut row = ledger_entry.clone();
            row.sequence = state.next_sequence;
            state.ledger.push(row);
        }
        state.store_entry(entry);
        if let Some(original) = &batch.reverses {
            state.store_entry(original);
        }
        Ok(())
    }

    async fn ledger_for_account(
        &self,
        account_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> LedgerResult<Vec<GeneralLedgerEntry>> {
        let mut rows: Vec<GeneralLedgerEntry> = self
            .read()?
            .ledger
            .iter()
            .filter(|row| {
                row.account_id == account_id
                    && from.is_none_or(|start| row.transaction_date >= start)
                    && to.is_none_or(|end| row.transaction_date <= end)
            })
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.transaction_date, row.sequence));
        Ok(rows)
    }

    async fn ledger_for_journal(&self, entry_id: &str) -> LedgerResult<Vec<GeneralLedgerEntry>> {
        Ok(self
            .read()?
            .ledger
            .iter()
            .filter(|row| row.journal_entry_id == entry_id)
            .cloned()
            .collect())
    }

    async fn ledger_snapshot(&self, period: &FinancialPeriod) -> LedgerResult<LedgerSnapshot> {
        let state = self.read()?;
        let mut snapshot = LedgerSnapshot {
            accounts: state.sorted_accounts(),
            sequence: state.next_sequence,
            ..LedgerSnapshot::default()
        };
        for row in &state.ledger {
            let bucket = if row.period_id == period.id {
                &mut snapshot.period
            } else if row.transaction_date < period.start_date {
                &mut snapshot.prior
            } else {
                continue;
            };
            bucket
                .entry(row.account_id.clone())
                .or_default()
                .add(&row.debit, &row.credit);
        }
        Ok(snapshot)
    }

    async fn balance_snapshot(&self) -> LedgerResult<BalanceSnapshot> {
        let state = self.read()?;
        let mut movements: HashMap<String, Movement> = HashMap::new();
        for row in &state.ledger {
            movements
                .entry(row.account_id.clone())
                .or_default()
                .add(&row.debit, &row.credit);
        }
        Ok(BalanceSnapshot {
            accounts: state.sorted_accounts(),
            movements,
            sequence: state.next_sequence,
        })
    }

    async fn replace_trial_balance(
        &self,
        period_id: &str,
        lines: &[TrialBalanceLine],
        as_of_sequence: u64,
    ) -> LedgerResult<Vec<TrialBalanceLine>> {
        let mut state = self.write()?;
        if !state.periods.contains_key(period_id) {
            return Err(LedgerError::not_found("financial period", period_id));
        }
        match state.trial_balances.get(period_id) {
            Some(stored) if stored.as_of_sequence > as_of_sequence => Ok(stored.lines.clone()),
            _ => {
                state.trial_balances.insert(
                    period_id.to_string(),
                    StoredTrialBalance {
                        as_of_sequence,
                        lines: lines.to_vec(),
                    },
                );
                Ok(lines.to_vec())
            }
        }
    }

    async fn get_trial_balance(&self, period_id: &str) -> LedgerResult<Vec<TrialBalanceLine>> {
        Ok(self
            .read()?
            .trial_balances
            .get(period_id)
            .map(|stored| stored.lines.clone())
            .unwrap_or_default())
    }
}
