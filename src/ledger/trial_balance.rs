//! Period trial balances, always rebuilt from the ledger

use bigdecimal::BigDecimal;

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::traits::*;
use crate::types::*;

/// Split a signed amount (debits positive) into debit and credit columns
fn split(signed: &BigDecimal, scale: i64) -> (BigDecimal, BigDecimal) {
    let zero = zero();
    if *signed >= zero {
        (signed.round(scale), zero)
    } else {
        (zero, (-signed.clone()).round(scale))
    }
}

/// Aggregates ledger rows per account and period into trial balance lines
pub struct TrialBalanceGenerator<S: LedgerStorage> {
    storage: S,
    scale: i64,
    carry_forward_opening: bool,
}

impl<S: LedgerStorage> TrialBalanceGenerator<S> {
    pub fn new(storage: S, config: &LedgerConfig) -> Self {
        Self {
            storage,
            scale: config.scale,
            carry_forward_opening: config.carry_forward_opening,
        }
    }

    /// Rebuild the period's trial balance and replace the stored one.
    ///
    /// Active accounts always get a line; inactive accounts only when they
    /// have movement in the period or carried-forward movement. If a
    /// concurrent run already stored a trial balance built from a later
    /// ledger state, that one is kept and returned.
    pub async fn generate(
        &self,
        period_id: &str,
        generated_by: &str,
    ) -> LedgerResult<TrialBalance> {
        let period = self
            .storage
            .get_period(period_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("financial period", period_id))?;

        let snapshot = self.storage.ledger_snapshot(&period).await?;
        let generated_at = now();
        let empty = Movement::default();

        let lines: Vec<TrialBalanceLine> = snapshot
            .accounts
            .iter()
            .filter(|account| {
                account.is_active
                    || snapshot.period.contains_key(&account.id)
                    || (self.carry_forward_opening && snapshot.prior.contains_key(&account.id))
            })
            .map(|account| {
                let mut opening = account.signed_opening_balance();
                if self.carry_forward_opening {
                    if let Some(prior) = snapshot.prior.get(&account.id) {
                        opening += prior.net();
                    }
                }
                let (opening_debit, opening_credit) = split(&opening, self.scale);

                let movement = snapshot.period.get(&account.id).unwrap_or(&empty);
                let period_debit = movement.debit.round(self.scale);
                let period_credit = movement.credit.round(self.scale);

                let debit_side = &opening_debit + &period_debit;
                let credit_side = &opening_credit + &period_credit;
                let (closing_debit, closing_credit) =
                    split(&(debit_side - credit_side), self.scale);

                TrialBalanceLine {
                    period_id: period.id.clone(),
                    account_id: account.id.clone(),
                    account_code: account.code.clone(),
                    account_name: account.name.clone(),
                    opening_debit,
                    opening_credit,
                    period_debit,
                    period_credit,
                    closing_debit,
                    closing_credit,
                    generated_at,
                    generated_by: generated_by.to_string(),
                }
            })
            .collect();

        let lines = self
            .storage
            .replace_trial_balance(&period.id, &lines, snapshot.sequence)
            .await?;

        let trial_balance = TrialBalance::from_lines(period.id.clone(), lines);
        if trial_balance.is_balanced {
            tracing::info!(
                period_id,
                generated_by,
                accounts = trial_balance.lines.len(),
                total = %trial_balance.total_closing_debit,
                "trial balance generated"
            );
        } else {
            tracing::warn!(
                period_id,
                total_debit = %trial_balance.total_closing_debit,
                total_credit = %trial_balance.total_closing_credit,
                "trial balance generated out of balance"
            );
        }
        Ok(trial_balance)
    }

    /// Last generated trial balance of a period; empty if never generated
    pub async fn get_by_period(&self, period_id: &str) -> LedgerResult<TrialBalance> {
        if self.storage.get_period(period_id).await?.is_none() {
            return Err(LedgerError::not_found("financial period", period_id));
        }
        let lines = self.storage.get_trial_balance(period_id).await?;
        Ok(TrialBalance::from_lines(period_id, lines))
    }
}
