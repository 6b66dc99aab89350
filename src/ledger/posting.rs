//! Posting engine: the only path that writes ledger rows and account balances
//!
//! A posting reads account snapshots, computes every ledger row and balance in
//! line order, and hands the result to the store as one `PostingBatch`. The
//! store applies the batch only if no account moved in the meantime; on a
//! version conflict the whole posting is rebuilt from a fresh read.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult, ValidationError};
use crate::ledger::balance::{BalanceMaintainer, RunningBalances};
use crate::ledger::journal::{check_draft, validation_context};
use crate::traits::*;
use crate::types::*;

/// Retry budget and backoff for optimistic-concurrency conflicts
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RetryPolicy {
    /// Retries after the first attempt
    pub(crate) max_retries: u32,
    pub(crate) initial_backoff: Duration,
    pub(crate) max_backoff: Duration,
}

impl RetryPolicy {
    pub(crate) fn from_config(config: &LedgerConfig) -> Self {
        Self {
            max_retries: config.max_posting_retries,
            initial_backoff: Duration::from_millis(config.retry_initial_backoff_ms),
            max_backoff: Duration::from_millis(config.retry_max_backoff_ms),
        }
    }

    /// Doubles per retry up to `max_backoff`, plus up to 25% jitter
    fn backoff(&self, retry: u32) -> Duration {
        let base = self
            .initial_backoff
            .saturating_mul(1 << retry.min(16))
            .min(self.max_backoff);
        base + base.mul_f64(0.25 * jitter())
    }
}

/// Pseudo-random factor in `[0, 1)` so colliding postings spread out
fn jitter() -> f64 {
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    f64::from(nanos % 1000) / 1000.0
}

async fn pause(duration: Duration) {
    if duration.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(duration).await;
    }
}

/// Run `attempt` until it succeeds, fails with anything but `Conflict`, or
/// the policy's retries are used up. Each retry waits out the backoff first.
async fn retry_on_conflict<F, Fut, T>(
    policy: RetryPolicy,
    operation: &'static str,
    journal_id: &str,
    attempt: F,
) -> LedgerResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = LedgerResult<T>>,
{
    let mut retries = 0;

    loop {
        match attempt().await {
            Ok(result) => {
                if retries > 0 {
                    tracing::info!(operation, journal_id, retries, "posting succeeded after retry");
                }
                return Ok(result);
            }
            Err(LedgerError::Conflict(reason)) if retries < policy.max_retries => {
                let backoff = policy.backoff(retries);
                retries += 1;
                tracing::warn!(
                    operation,
                    journal_id,
                    retries,
                    backoff_ms = backoff.as_millis() as u64,
                    reason = %reason,
                    "posting conflict, retrying from a fresh read"
                );
                pause(backoff).await;
            }
            Err(err) => {
                tracing::warn!(operation, journal_id, error = %err, "posting rejected");
                return Err(err);
            }
        }
    }
}

/// Drives journal entries from DRAFT to POSTED
pub struct PostingEngine<S: LedgerStorage> {
    storage: S,
    validator: Arc<dyn JournalValidator>,
    maintainer: BalanceMaintainer,
    scale: i64,
    retry: RetryPolicy,
    number_prefix: String,
}

impl<S: LedgerStorage> PostingEngine<S> {
    pub fn new(storage: S, validator: Arc<dyn JournalValidator>, config: &LedgerConfig) -> Self {
        Self {
            storage,
            validator,
            maintainer: BalanceMaintainer::new(config.scale),
            scale: config.scale,
            retry: RetryPolicy::from_config(config),
            number_prefix: config.journal_number_prefix.clone(),
        }
    }

    /// Post a DRAFT entry: one ledger row and one balance write per line, all or nothing
    pub async fn post(&self, entry_id: &str, posted_by: &str) -> LedgerResult<JournalEntry> {
        let posted = retry_on_conflict(self.retry, "post journal entry", entry_id, || {
            self.try_post(entry_id, posted_by)
        })
        .await?;

        tracing::info!(
            journal_id = %posted.id,
            journal_number = %posted.journal_number,
            period_id = %posted.period_id,
            lines = posted.lines().len(),
            posted_by,
            "journal entry posted"
        );
        Ok(posted)
    }

    /// Post a reversing entry for a POSTED entry and flag the original as reversed
    ///
    /// Returns the reversing entry. It lands in the period containing
    /// `reversal_date`, preferring the original's fiscal year.
    pub async fn reverse(
        &self,
        entry_id: &str,
        reversed_by: &str,
        reversal_date: NaiveDate,
        reason: &str,
    ) -> LedgerResult<JournalEntry> {
        let original = self.load_entry(entry_id).await?;
        if original.status != JournalStatus::Posted || original.is_reversed() {
            let err =
                LedgerError::invalid_operation("reverse journal entry", original.state_label());
            tracing::warn!(journal_id = entry_id, error = %err, "reversal rejected");
            return Err(err);
        }

        let period = self.reversal_period(&original, reversal_date).await?;
        let reversal_id = uuid::Uuid::new_v4().to_string();
        let number = self
            .storage
            .allocate_journal_number(&self.number_prefix, reversal_date)
            .await?;

        let reversal = retry_on_conflict(self.retry, "reverse journal entry", entry_id, || {
            self.try_reverse(
                entry_id,
                &reversal_id,
                &number,
                &period,
                reversal_date,
                reversed_by,
                reason,
            )
        })
        .await?;

        tracing::info!(
            journal_id = entry_id,
            reversal_id = %reversal.id,
            journal_number = %reversal.journal_number,
            period_id = %reversal.period_id,
            reversed_by,
            "journal entry reversed"
        );
        Ok(reversal)
    }

    /// Create and post an entry generated by another module in one step
    pub async fn post_source_document(
        &self,
        draft: JournalDraft,
        source: SourceRef,
        posted_by: &str,
    ) -> LedgerResult<JournalEntry> {
        let context = validation_context(&self.storage, &draft, self.scale).await?;
        check_draft(self.validator.as_ref(), &draft, &context)?;

        let entry_id = uuid::Uuid::new_v4().to_string();
        let number = match &draft.journal_number {
            Some(number) => number.clone(),
            None => {
                self.storage
                    .allocate_journal_number(&self.number_prefix, draft.entry_date)
                    .await?
            }
        };

        let posted = retry_on_conflict(self.retry, "post source document", &entry_id, || {
            self.try_post_new(&entry_id, &number, &draft, &source, posted_by)
        })
        .await?;

        tracing::info!(
            journal_id = %posted.id,
            journal_number = %posted.journal_number,
            source_id = %source.source_id,
            posted_by,
            "source document posted"
        );
        Ok(posted)
    }

    async fn load_entry(&self, entry_id: &str) -> LedgerResult<JournalEntry> {
        self.storage
            .get_journal_entry(entry_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("journal entry", entry_id))
    }

    async fn reversal_period(
        &self,
        original: &JournalEntry,
        reversal_date: NaiveDate,
    ) -> LedgerResult<FinancialPeriod> {
        let fiscal_year = self
            .storage
            .get_period(&original.period_id)
            .await?
            .map(|p| p.fiscal_year);

        let candidates: Vec<FinancialPeriod> = self
            .storage
            .list_periods()
            .await?
            .into_iter()
            .filter(|p| p.contains(reversal_date))
            .collect();

        let preferred = candidates
            .iter()
            .position(|p| Some(&p.fiscal_year) == fiscal_year.as_ref())
            .unwrap_or(0);

        candidates
            .into_iter()
            .nth(preferred)
            .ok_or_else(|| {
                ValidationError::InvalidField {
                    field: "reversal date",
                    reason: format!("no financial period contains {reversal_date}"),
                }
                .into()
            })
    }

    async fn try_post(&self, entry_id: &str, posted_by: &str) -> LedgerResult<JournalEntry> {
        let entry = self.load_entry(entry_id).await?;
        entry.ensure_draft("post journal entry")?;

        let draft = entry.to_draft();
        let context = validation_context(&self.storage, &draft, self.scale).await?;
        check_draft(self.validator.as_ref(), &draft, &context)?;

        let batch = self.build_batch(
            entry,
            &context.accounts,
            posted_by,
            Some(JournalStatus::Draft),
            None,
        )?;
        self.storage.commit_posting(&batch).await?;

        let mut posted = batch.entry;
        posted.revision += 1;
        Ok(posted)
    }

    #[allow(clippy::too_many_arguments)]
    async fn try_reverse(
        &self,
        entry_id: &str,
        reversal_id: &str,
        number: &str,
        period: &FinancialPeriod,
        reversal_date: NaiveDate,
        reversed_by: &str,
        reason: &str,
    ) -> LedgerResult<JournalEntry> {
        let original = self.load_entry(entry_id).await?;
        let mut flagged = original.clone();
        flagged.mark_reversed(reversal_id, now())?;

        let draft = JournalDraft {
            journal_number: Some(number.to_string()),
            entry_date: reversal_date,
            period_id: period.id.clone(),
            description: format!("Reversal of {}: {}", original.journal_number, reason),
            lines: original.reversed_lines(),
        };
        let context = validation_context(&self.storage, &draft, self.scale).await?;
        check_draft(self.validator.as_ref(), &draft, &context)?;

        let mut entry = JournalEntry::from_draft(reversal_id, number, &draft, self.scale);
        entry.reversal_of = Some(original.id.clone());
        entry.source = Some(SourceRef {
            source_type: SourceType::Reversal,
            source_id: original.id.clone(),
        });

        let batch =
            self.build_batch(entry, &context.accounts, reversed_by, None, Some(flagged))?;
        self.storage.commit_posting(&batch).await?;
        Ok(batch.entry)
    }

    async fn try_post_new(
        &self,
        entry_id: &str,
        number: &str,
        draft: &JournalDraft,
        source: &SourceRef,
        posted_by: &str,
    ) -> LedgerResult<JournalEntry> {
        let context = validation_context(&self.storage, draft, self.scale).await?;
        check_draft(self.validator.as_ref(), draft, &context)?;

        let mut entry = JournalEntry::from_draft(entry_id, number, draft, self.scale);
        entry.source = Some(source.clone());

        let batch = self.build_batch(entry, &context.accounts, posted_by, None, None)?;
        self.storage.commit_posting(&batch).await?;
        Ok(batch.entry)
    }

    /// Compute the posted entry, its ledger rows and balance updates
    fn build_batch(
        &self,
        mut entry: JournalEntry,
        accounts: &HashMap<String, Account>,
        posted_by: &str,
        expected_status: Option<JournalStatus>,
        reverses: Option<JournalEntry>,
    ) -> LedgerResult<PostingBatch> {
        let posted_at = now();
        entry.mark_posted(posted_by, posted_at)?;

        let source = entry.source.clone().unwrap_or_else(|| SourceRef {
            source_type: SourceType::JournalEntry,
            source_id: entry.id.clone(),
        });

        let mut running = RunningBalances::new(self.maintainer, accounts);
        let mut ledger_entries = Vec::with_capacity(entry.lines().len());
        for line in entry.lines() {
            let balance_after = running
                .apply(&line.account_id, &line.debit, &line.credit)
                .ok_or_else(|| ValidationError::UnknownAccount {
                    account_id: line.account_id.clone(),
                })?;

            tracing::debug!(
                journal_id = %entry.id,
                line = line.line_number,
                account_id = %line.account_id,
                debit = %line.debit,
                credit = %line.credit,
                balance_after = %balance_after,
                "ledger row computed"
            );

            ledger_entries.push(GeneralLedgerEntry {
                id: uuid::Uuid::new_v4().to_string(),
                sequence: 0,
                transaction_date: entry.entry_date,
                period_id: entry.period_id.clone(),
                account_id: line.account_id.clone(),
                journal_entry_id: entry.id.clone(),
                journal_line_id: line.id.clone(),
                debit: line.debit.clone(),
                credit: line.credit.clone(),
                balance_after,
                source_type: source.source_type.clone(),
                source_id: source.source_id.clone(),
                description: line
                    .description
                    .clone()
                    .or_else(|| Some(entry.description.clone())),
                created_at: posted_at,
            });
        }

        Ok(PostingBatch {
            entry,
            expected_status,
            ledger_entries,
            balance_updates: running.into_updates(),
            reverses,
        })
    }
}
