//! Error types for the ledger core
//!
//! Validation failures are always raised before any state is touched.
//! `Conflict` and `Storage` are transient: the caller may retry the whole
//! operation after re-reading the entry status.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

/// Reasons a journal draft is rejected by the validator
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Journal entry is not balanced: debit = {debit}, credit = {credit}")]
    Unbalanced {
        debit: BigDecimal,
        credit: BigDecimal,
    },
    #[error("Unknown account: {account_id}")]
    UnknownAccount { account_id: String },
    #[error("Account {account_id} is inactive")]
    InactiveAccount { account_id: String },
    #[error("Unknown financial period: {period_id}")]
    UnknownPeriod { period_id: String },
    #[error("Financial period {period_id} is closed")]
    ClosedPeriod { period_id: String },
    #[error("Entry date {date} falls outside financial period {period_id}")]
    DateOutsidePeriod { date: NaiveDate, period_id: String },
    #[error("Journal entry must have at least two lines, got {count}")]
    InsufficientLines { count: usize },
    #[error("Line {line} is malformed: {reason}")]
    MalformedLine { line: usize, reason: String },
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Errors that can occur in the ledger system
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{kind} '{key}' already exists")]
    DuplicateResource { kind: &'static str, key: String },
    #[error("Cannot {operation}: current state is {current_state}")]
    InvalidOperation {
        operation: &'static str,
        current_state: String,
    },
    #[error("{kind} not found: {id}")]
    ResourceNotFound { kind: &'static str, id: String },
    #[error("Concurrent modification detected, retry the operation: {0}")]
    Conflict(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    pub(crate) fn invalid_operation(operation: &'static str, current_state: impl ToString) -> Self {
        Self::InvalidOperation {
            operation,
            current_state: current_state.to_string(),
        }
    }

    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            kind,
            id: id.into(),
        }
    }

    /// Whether retrying the whole operation may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Storage(_))
    }

    /// Stable error code for callers mapping errors onto a transport
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(inner) => match inner {
                ValidationError::Unbalanced { .. } => "UNBALANCED",
                ValidationError::UnknownAccount { .. } => "UNKNOWN_ACCOUNT",
                ValidationError::InactiveAccount { .. } => "INACTIVE_ACCOUNT",
                ValidationError::UnknownPeriod { .. } => "UNKNOWN_PERIOD",
                ValidationError::ClosedPeriod { .. } => "CLOSED_PERIOD",
                ValidationError::DateOutsidePeriod { .. } => "DATE_OUTSIDE_PERIOD",
                ValidationError::InsufficientLines { .. } => "INSUFFICIENT_LINES",
                ValidationError::MalformedLine { .. } => "MALFORMED_LINE",
                ValidationError::InvalidField { .. } => "INVALID_FIELD",
            },
            Self::DuplicateResource { .. } => "DUPLICATE_RESOURCE",
            Self::InvalidOperation { .. } => "INVALID_OPERATION",
            Self::ResourceNotFound { .. } => "RESOURCE_NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_converts_and_keeps_code() {
        let err: LedgerError = ValidationError::ClosedPeriod {
            period_id: "2024-01".to_string(),
        }
        .into();

        assert_eq!(err.error_code(), "CLOSED_PERIOD");
        assert!(!err.is_transient());
        assert_eq!(err.to_string(), "Financial period 2024-01 is closed");
    }

    #[test]
    fn test_unbalanced_message_carries_both_totals() {
        let err = ValidationError::Unbalanced {
            debit: BigDecimal::from(100),
            credit: BigDecimal::from(90),
        };
        assert_eq!(
            err.to_string(),
            "Journal entry is not balanced: debit = 100, credit = 90"
        );
    }

    #[test]
    fn test_transient_errors() {
        assert!(LedgerError::Conflict("account cash".to_string()).is_transient());
        assert!(LedgerError::Storage("poisoned".to_string()).is_transient());
        assert!(!LedgerError::invalid_operation("post", "POSTED").is_transient());
    }
}
