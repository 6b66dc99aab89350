//! Journal entry lifecycle up to (but not including) posting

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::validator::{validate_balance, validate_lines};
use crate::traits::*;
use crate::types::*;

/// Load the period and referenced accounts a draft is validated against
pub(crate) async fn validation_context<S: LedgerStorage>(
    storage: &S,
    draft: &JournalDraft,
    scale: i64,
) -> LedgerResult<ValidationContext> {
    let period = storage.get_period(&draft.period_id).await?;

    let mut accounts = HashMap::new();
    for line in &draft.lines {
        if accounts.contains_key(&line.account_id) {
            continue;
        }
        if let Some(account) = storage.get_account(&line.account_id).await? {
            accounts.insert(account.id.clone(), account);
        }
    }

    Ok(ValidationContext {
        period,
        accounts,
        scale,
    })
}

/// Run `validator` and log a rejection
pub(crate) fn check_draft(
    validator: &dyn JournalValidator,
    draft: &JournalDraft,
    context: &ValidationContext,
) -> LedgerResult<()> {
    validator.validate(draft, context).map_err(|err| {
        tracing::warn!(
            period_id = %draft.period_id,
            journal_number = draft.journal_number.as_deref().unwrap_or("-"),
            error = %err,
            "journal draft rejected"
        );
        LedgerError::from(err)
    })
}

/// Journal manager for draft entries and the informational transitions
pub struct JournalManager<S: LedgerStorage> {
    storage: S,
    validator: Arc<dyn JournalValidator>,
    scale: i64,
    number_prefix: String,
}

impl<S: LedgerStorage> JournalManager<S> {
    pub fn new(storage: S, validator: Arc<dyn JournalValidator>, config: &LedgerConfig) -> Self {
        Self {
            storage,
            validator,
            scale: config.scale,
            number_prefix: config.journal_number_prefix.clone(),
        }
    }

    /// Validate and persist a new DRAFT entry with its lines
    pub async fn create(&self, draft: JournalDraft) -> LedgerResult<JournalEntry> {
        let context = validation_context(&self.storage, &draft, self.scale).await?;
        check_draft(self.validator.as_ref(), &draft, &context)?;

        let number = match &draft.journal_number {
            Some(number) => number.clone(),
            None => {
                self.storage
                    .allocate_journal_number(&self.number_prefix, draft.entry_date)
                    .await?
            }
        };
        let entry = JournalEntry::from_draft(
            uuid::Uuid::new_v4().to_string(),
            number,
            &draft,
            self.scale,
        );

        self.storage.insert_journal_entry(&entry).await?;
        tracing::info!(
            journal_id = %entry.id,
            journal_number = %entry.journal_number,
            period_id = %entry.period_id,
            lines = entry.lines().len(),
            "journal entry created"
        );

        Ok(entry)
    }

    /// Replace header and the whole line set of a DRAFT entry
    pub async fn update(&self, entry_id: &str, draft: JournalDraft) -> LedgerResult<JournalEntry> {
        let mut entry = self.get_required(entry_id).await?;
        entry.ensure_draft("update journal entry")?;

        let context = validation_context(&self.storage, &draft, self.scale).await?;
        check_draft(self.validator.as_ref(), &draft, &context)?;

        entry.replace_lines(&draft, self.scale)?;
        self.storage
            .replace_journal_entry(
                &entry,
                JournalPrecondition {
                    operation: "update journal entry",
                    expected_status: JournalStatus::Draft,
                    require_open_period: true,
                },
            )
            .await?;
        entry.revision += 1;

        tracing::info!(
            journal_id = %entry.id,
            lines = entry.lines().len(),
            "journal entry updated"
        );
        Ok(entry)
    }

    /// Record approver metadata on a POSTED entry
    pub async fn approve(&self, entry_id: &str, approved_by: &str) -> LedgerResult<JournalEntry> {
        let mut entry = self.get_required(entry_id).await?;
        entry.approve(approved_by, now())?;

        self.storage
            .replace_journal_entry(
                &entry,
                JournalPrecondition {
                    operation: "approve journal entry",
                    expected_status: JournalStatus::Posted,
                    require_open_period: false,
                },
            )
            .await?;
        entry.revision += 1;

        tracing::info!(journal_id = %entry.id, approved_by, "journal entry approved");
        Ok(entry)
    }

    /// DRAFT -> CANCELLED
    pub async fn cancel(&self, entry_id: &str, reason: &str) -> LedgerResult<JournalEntry> {
        let mut entry = self.get_required(entry_id).await?;
        entry.cancel(reason, now())?;

        self.storage
            .replace_journal_entry(
                &entry,
                JournalPrecondition {
                    operation: "cancel journal entry",
                    expected_status: JournalStatus::Draft,
                    require_open_period: false,
                },
            )
            .await?;
        entry.revision += 1;

        tracing::info!(journal_id = %entry.id, reason, "journal entry cancelled");
        Ok(entry)
    }

    /// Hard-remove a DRAFT entry and its lines
    pub async fn delete(&self, entry_id: &str) -> LedgerResult<()> {
        let entry = self.get_required(entry_id).await?;
        entry.ensure_draft("delete journal entry")?;

        self.storage
            .delete_journal_entry(
                entry_id,
                JournalPrecondition {
                    operation: "delete journal entry",
                    expected_status: JournalStatus::Draft,
                    require_open_period: false,
                },
            )
            .await?;

        tracing::info!(journal_id = entry_id, "journal entry deleted");
        Ok(())
    }

    /// Get a journal entry by ID
    pub async fn get(&self, entry_id: &str) -> LedgerResult<Option<JournalEntry>> {
        self.storage.get_journal_entry(entry_id).await
    }

    /// Get a journal entry by ID, returning an error if not found
    pub async fn get_required(&self, entry_id: &str) -> LedgerResult<JournalEntry> {
        self.storage
            .get_journal_entry(entry_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("journal entry", entry_id))
    }

    pub async fn list(&self, filter: &JournalFilter) -> LedgerResult<Vec<JournalEntry>> {
        self.storage.list_journal_entries(filter).await
    }
}

/// Builder for journal drafts
#[derive(Debug)]
pub struct JournalDraftBuilder {
    draft: JournalDraft,
    scale: i64,
}

impl JournalDraftBuilder {
    /// Create a new draft builder
    pub fn new(
        period_id: impl Into<String>,
        entry_date: NaiveDate,
        description: impl Into<String>,
    ) -> Self {
        Self {
            draft: JournalDraft {
                journal_number: None,
                entry_date,
                period_id: period_id.into(),
                description: description.into(),
                lines: Vec::new(),
            },
            scale: LedgerConfig::default().scale,
        }
    }

    /// Use a caller-chosen journal number instead of a generated one
    pub fn journal_number(mut self, number: impl Into<String>) -> Self {
        self.draft.journal_number = Some(number.into());
        self
    }

    /// Precision the structural checks in `build` use
    pub fn scale(mut self, scale: i64) -> Self {
        self.scale = scale;
        self
    }

    /// Add a debit line
    pub fn debit(
        mut self,
        account_id: impl Into<String>,
        amount: BigDecimal,
        description: Option<String>,
    ) -> Self {
        let mut line = DraftLine::debit(account_id, amount);
        line.description = description;
        self.draft.lines.push(line);
        self
    }

    /// Add a credit line
    pub fn credit(
        mut self,
        account_id: impl Into<String>,
        amount: BigDecimal,
        description: Option<String>,
    ) -> Self {
        let mut line = DraftLine::credit(account_id, amount);
        line.description = description;
        self.draft.lines.push(line);
        self
    }

    /// Add a custom line
    pub fn line(mut self, line: DraftLine) -> Self {
        self.draft.lines.push(line);
        self
    }

    /// Build the draft; only line shape and balance are checked here
    pub fn build(self) -> LedgerResult<JournalDraft> {
        validate_lines(&self.draft.lines, self.scale)?;
        validate_balance(&self.draft, self.scale)?;
        Ok(self.draft)
    }
}
