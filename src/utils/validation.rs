//! Field-level validation helpers

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::ledger::validator::DefaultJournalValidator;
use crate::traits::*;
use crate::types::*;

fn invalid(field: &'static str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidField {
        field,
        reason: reason.into(),
    }
}

/// Validate that an identifier is non-empty, short, and uses safe characters
pub fn validate_identifier(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid(field, "cannot be empty"));
    }

    if value.len() > 50 {
        return Err(invalid(field, "cannot exceed 50 characters"));
    }

    // Check for valid characters (alphanumeric, dashes, underscores, dots)
    if !value
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(invalid(
            field,
            "can only contain alphanumeric characters, dashes, underscores, and dots",
        ));
    }

    Ok(())
}

/// Validate a caller-supplied journal number
pub fn validate_journal_number(number: &str) -> Result<(), ValidationError> {
    validate_identifier("journal number", number)
}

/// Validate a free-text description
pub fn validate_description(description: &str) -> Result<(), ValidationError> {
    if description.trim().is_empty() {
        return Err(invalid("description", "cannot be empty"));
    }

    if description.len() > 500 {
        return Err(invalid("description", "cannot exceed 500 characters"));
    }

    Ok(())
}

/// Validate an account before it is registered
pub fn validate_account(account: &Account) -> Result<(), ValidationError> {
    validate_identifier("account id", &account.id)?;
    validate_identifier("account code", &account.code)?;

    if account.name.trim().is_empty() {
        return Err(invalid("account name", "cannot be empty"));
    }
    if account.name.len() > 100 {
        return Err(invalid("account name", "cannot exceed 100 characters"));
    }
    if account.opening_balance < zero() {
        return Err(invalid(
            "opening balance",
            "must be non-negative; use the opening side for direction",
        ));
    }

    Ok(())
}

/// Validate a period before it is created
pub fn validate_period(period: &FinancialPeriod) -> Result<(), ValidationError> {
    validate_identifier("period id", &period.id)?;
    validate_identifier("period code", &period.code)?;
    validate_identifier("fiscal year", &period.fiscal_year)?;

    if period.end_date < period.start_date {
        return Err(invalid("date range", "end date is before start date"));
    }

    Ok(())
}

/// Journal validator that adds bookkeeping hygiene on top of the double-entry rules
pub struct StrictJournalValidator;

impl JournalValidator for StrictJournalValidator {
    fn validate(
        &self,
        draft: &JournalDraft,
        context: &ValidationContext,
    ) -> Result<(), ValidationError> {
        DefaultJournalValidator.validate(draft, context)?;

        validate_description(&draft.description)?;

        // Same account cannot appear twice on the same side
        let mut seen = HashSet::new();
        for (index, line) in draft.lines.iter().enumerate() {
            let side = if line.debit > zero() {
                BalanceSide::Debit
            } else {
                BalanceSide::Credit
            };
            if !seen.insert((line.account_id.as_str(), side)) {
                return Err(ValidationError::MalformedLine {
                    line: index + 1,
                    reason: format!(
                        "account '{}' appears more than once on the same side",
                        line.account_id
                    ),
                });
            }
        }

        Ok(())
    }
}
