//! Journal entry validation
//!
//! Checks run in a fixed order so the same draft always fails the same way:
//! line count, line shape, balance, period, accounts.

use bigdecimal::BigDecimal;

use crate::error::ValidationError;
use crate::traits::{JournalValidator, ValidationContext};
use crate::types::*;
use crate::utils::validation::validate_journal_number;

/// Double-entry rules every journal draft must satisfy
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultJournalValidator;

impl JournalValidator for DefaultJournalValidator {
    fn validate(
        &self,
        draft: &JournalDraft,
        context: &ValidationContext,
    ) -> Result<(), ValidationError> {
        if let Some(number) = &draft.journal_number {
            validate_journal_number(number)?;
        }
        validate_lines(&draft.lines, context.scale)?;
        validate_balance(draft, context.scale)?;
        validate_period(draft, context.period.as_ref())?;
        validate_accounts(draft, context)
    }
}

/// At least two lines, each with exactly one positive side once rounded to `scale`
pub fn validate_lines(lines: &[DraftLine], scale: i64) -> Result<(), ValidationError> {
    if lines.len() < 2 {
        return Err(ValidationError::InsufficientLines { count: lines.len() });
    }

    let zero = zero();
    for (index, line) in lines.iter().enumerate() {
        let malformed = |reason: &str| ValidationError::MalformedLine {
            line: index + 1,
            reason: reason.to_string(),
        };

        if line.account_id.trim().is_empty() {
            return Err(malformed("account is missing"));
        }
        let (debit, credit) = (line.debit.round(scale), line.credit.round(scale));
        if debit < zero || credit < zero {
            return Err(malformed("amounts cannot be negative"));
        }
        match (debit > zero, credit > zero) {
            (true, true) => return Err(malformed("debit and credit are both non-zero")),
            (false, false) => return Err(malformed("debit and credit are both zero")),
            _ => {}
        }
    }
    Ok(())
}

/// Total debit equals total credit at `scale` decimal places
pub fn validate_balance(draft: &JournalDraft, scale: i64) -> Result<(), ValidationError> {
    let debit: BigDecimal = draft.lines.iter().map(|l| l.debit.round(scale)).sum();
    let credit: BigDecimal = draft.lines.iter().map(|l| l.credit.round(scale)).sum();
    if debit != credit {
        return Err(ValidationError::Unbalanced { debit, credit });
    }
    Ok(())
}

fn validate_period(
    draft: &JournalDraft,
    period: Option<&FinancialPeriod>,
) -> Result<(), ValidationError> {
    let period = period
        .filter(|p| p.id == draft.period_id)
        .ok_or_else(|| ValidationError::UnknownPeriod {
            period_id: draft.period_id.clone(),
        })?;

    if period.is_closed {
        return Err(ValidationError::ClosedPeriod {
            period_id: period.id.clone(),
        });
    }
    if !period.contains(draft.entry_date) {
        return Err(ValidationError::DateOutsidePeriod {
            date: draft.entry_date,
            period_id: period.id.clone(),
        });
    }
    Ok(())
}

fn validate_accounts(
    draft: &JournalDraft,
    context: &ValidationContext,
) -> Result<(), ValidationError> {
    for line in &draft.lines {
        match context.accounts.get(&line.account_id) {
            None => {
                return Err(ValidationError::UnknownAccount {
                    account_id: line.account_id.clone(),
                })
            }
            Some(account) if !account.is_active => {
                return Err(ValidationError::InactiveAccount {
                    account_id: account.id.clone(),
                })
            }
            Some(_) => {}
        }
    }
    Ok(())
}
