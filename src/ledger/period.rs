//! Financial period lifecycle: create, open/close, lookup by date

use chrono::NaiveDate;

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::validate_period;

/// Gates which periods accept postings
pub struct PeriodController<S: LedgerStorage> {
    storage: S,
    allow_reopen_with_trial_balance: bool,
}

impl<S: LedgerStorage> PeriodController<S> {
    pub fn new(storage: S, config: &LedgerConfig) -> Self {
        Self {
            storage,
            allow_reopen_with_trial_balance: config.allow_reopen_with_trial_balance,
        }
    }

    /// Create a new open period
    pub async fn create_period(&self, period: FinancialPeriod) -> LedgerResult<FinancialPeriod> {
        validate_period(&period)?;

        let mut period = period;
        period.is_closed = false;
        period.closed_by = None;
        period.closed_at = None;

        self.storage.insert_period(&period).await?;
        tracing::info!(
            period_id = %period.id,
            code = %period.code,
            start = %period.start_date,
            end = %period.end_date,
            "financial period created"
        );
        Ok(period)
    }

    pub async fn get_period(&self, period_id: &str) -> LedgerResult<Option<FinancialPeriod>> {
        self.storage.get_period(period_id).await
    }

    pub async fn get_period_required(&self, period_id: &str) -> LedgerResult<FinancialPeriod> {
        self.storage
            .get_period(period_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("financial period", period_id))
    }

    /// All periods ordered by start date
    pub async fn list_periods(&self) -> LedgerResult<Vec<FinancialPeriod>> {
        self.storage.list_periods().await
    }

    /// First period (by start date) whose range contains `date`
    pub async fn find_period_for_date(
        &self,
        date: NaiveDate,
    ) -> LedgerResult<Option<FinancialPeriod>> {
        let periods = self.storage.list_periods().await?;
        Ok(periods.into_iter().find(|p| p.contains(date)))
    }

    pub async fn is_closed(&self, period_id: &str) -> LedgerResult<bool> {
        Ok(self.get_period_required(period_id).await?.is_closed)
    }

    /// OPEN -> CLOSED
    pub async fn close_period(
        &self,
        period_id: &str,
        closed_by: &str,
    ) -> LedgerResult<FinancialPeriod> {
        match self.storage.close_period(period_id, closed_by, now()).await {
            Ok(period) => {
                tracing::info!(period_id, closed_by, "financial period closed");
                Ok(period)
            }
            Err(err) => {
                tracing::warn!(period_id, error = %err, "close period rejected");
                Err(err)
            }
        }
    }

    /// CLOSED -> OPEN
    ///
    /// Refused once a trial balance exists for the period unless
    /// `allow_reopen_with_trial_balance` is set.
    pub async fn reopen_period(&self, period_id: &str) -> LedgerResult<FinancialPeriod> {
        match self
            .storage
            .reopen_period(period_id, self.allow_reopen_with_trial_balance)
            .await
        {
            Ok(period) => {
                tracing::info!(period_id, "financial period reopened");
                Ok(period)
            }
            Err(err) => {
                tracing::warn!(period_id, error = %err, "reopen period rejected");
                Err(err)
            }
        }
    }
}
