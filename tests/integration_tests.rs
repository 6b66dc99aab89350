//! Integration tests for ledger-core

mod common;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use ledger_core::{
    JournalDraftBuilder, JournalFilter, JournalStatus, Ledger, LedgerConfig, LedgerError,
    LedgerStorage, MemoryStorage, SourceRef, SourceType, StrictJournalValidator, ValidationError,
};
use std::sync::Arc;

use common::{amount, date, simple_draft, standard_ledger};

#[tokio::test]
async fn test_post_balanced_entry() {
    let (ledger, storage) = standard_ledger(LedgerConfig::default()).await;

    // Debit cash 100, credit sales 100
    let entry = ledger
        .create_journal_entry(simple_draft("jan", date(1, 10), "cash", "sales", "100"))
        .await
        .unwrap();
    assert_eq!(entry.status, JournalStatus::Draft);
    assert_eq!(storage.ledger_len().unwrap(), 0);

    ledger.post_journal_entry(&entry.id, "clerk").await.unwrap();

    assert_eq!(
        ledger.get_account_balance("cash").await.unwrap(),
        BigDecimal::from(5100)
    );
    assert_eq!(
        ledger.get_account_balance("sales").await.unwrap(),
        BigDecimal::from(-100)
    );
    let rows = ledger.get_ledger_for_journal(&entry.id).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(storage.ledger_len().unwrap(), 2);
}

#[tokio::test]
async fn test_unbalanced_entry_is_rejected_before_anything_is_stored() {
    let (ledger, _) = standard_ledger(LedgerConfig::default()).await;

    let mut draft = simple_draft("jan", date(1, 10), "cash", "sales", "100");
    draft.lines[1].credit = amount("90");

    let err = ledger.create_journal_entry(draft).await.unwrap_err();
    assert_eq!(
        err,
        LedgerError::Validation(ValidationError::Unbalanced {
            debit: BigDecimal::from(100),
            credit: BigDecimal::from(90),
        })
    );
    assert!(ledger
        .list_journal_entries(&JournalFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_posting_twice_keeps_first_rows() {
    let (ledger, storage) = standard_ledger(LedgerConfig::default()).await;
    let entry = ledger
        .create_journal_entry(simple_draft("jan", date(1, 10), "cash", "sales", "100"))
        .await
        .unwrap();
    ledger.post_journal_entry(&entry.id, "clerk").await.unwrap();

    let err = ledger.post_journal_entry(&entry.id, "clerk").await.unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidOperation {
            operation: "post journal entry",
            current_state: "POSTED".to_string(),
        }
    );
    assert_eq!(storage.ledger_len().unwrap(), 2);
    assert_eq!(
        ledger.get_account_balance("cash").await.unwrap(),
        BigDecimal::from(5100)
    );
}

#[tokio::test]
async fn test_posting_into_closed_period_fails_cleanly() {
    let (ledger, storage) = standard_ledger(LedgerConfig::default()).await;
    let entry = ledger
        .create_journal_entry(simple_draft("jan", date(1, 10), "cash", "sales", "100"))
        .await
        .unwrap();

    ledger.close_period("jan", "controller").await.unwrap();

    let err = ledger.post_journal_entry(&entry.id, "clerk").await.unwrap_err();
    assert_eq!(
        err,
        LedgerError::Validation(ValidationError::ClosedPeriod {
            period_id: "jan".to_string(),
        })
    );
    assert_eq!(
        ledger.get_account_balance("cash").await.unwrap(),
        BigDecimal::from(5000)
    );
    assert_eq!(storage.ledger_len().unwrap(), 0);
    let stored = ledger.get_journal_entry(&entry.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JournalStatus::Draft);
}

#[tokio::test]
async fn test_trial_balance_after_one_posting() {
    let (ledger, _) = standard_ledger(LedgerConfig::default()).await;
    let entry = ledger
        .create_journal_entry(simple_draft("jan", date(1, 10), "cash", "sales", "100"))
        .await
        .unwrap();
    ledger.post_journal_entry(&entry.id, "clerk").await.unwrap();

    let tb = ledger.generate_trial_balance("jan", "auditor").await.unwrap();

    let cash = tb.line_for("cash").unwrap();
    assert_eq!(cash.opening_debit, BigDecimal::from(5000));
    assert_eq!(cash.period_debit, BigDecimal::from(100));
    assert_eq!(cash.closing_debit, BigDecimal::from(5100));
    assert_eq!(cash.closing_credit, BigDecimal::from(0));

    let sales = tb.line_for("sales").unwrap();
    assert_eq!(sales.period_credit, BigDecimal::from(100));
    assert_eq!(sales.closing_credit, BigDecimal::from(100));
    assert_eq!(sales.closing_debit, BigDecimal::from(0));

    assert!(tb.is_balanced);
    assert_eq!(tb.total_closing_debit, BigDecimal::from(5100));
    assert_eq!(tb.total_closing_credit, BigDecimal::from(5100));

    // Inactive accounts without movement are left out
    assert!(tb.line_for("legacy").is_none());
    assert_eq!(tb.lines[0].account_code, "1000");
}

#[tokio::test]
async fn test_posted_entry_is_immutable() {
    let (ledger, _) = standard_ledger(LedgerConfig::default()).await;
    let entry = ledger
        .create_journal_entry(simple_draft("jan", date(1, 10), "rent", "cash", "750"))
        .await
        .unwrap();
    let posted = ledger.post_journal_entry(&entry.id, "clerk").await.unwrap();

    let err = ledger
        .update_journal_entry(&entry.id, simple_draft("jan", date(1, 10), "rent", "cash", "700"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidOperation {
            operation: "update journal entry",
            current_state: "POSTED".to_string(),
        }
    );

    let err = ledger.delete_journal_entry(&entry.id).await.unwrap_err();
    assert_eq!(err.error_code(), "INVALID_OPERATION");
    let err = ledger.cancel_journal_entry(&entry.id, "typo").await.unwrap_err();
    assert_eq!(err.error_code(), "INVALID_OPERATION");

    let stored = ledger.get_journal_entry(&entry.id).await.unwrap().unwrap();
    assert_eq!(stored, posted);
    assert_eq!(stored.total_debit, BigDecimal::from(750));
}

#[tokio::test]
async fn test_trial_balance_regeneration_is_idempotent() {
    let (ledger, _) = standard_ledger(LedgerConfig::default()).await;
    for (debit, credit, value) in [("cash", "sales", "120.50"), ("rent", "cash", "40.25")] {
        let entry = ledger
            .create_journal_entry(simple_draft("jan", date(1, 12), debit, credit, value))
            .await
            .unwrap();
        ledger.post_journal_entry(&entry.id, "clerk").await.unwrap();
    }

    let columns = |tb: &ledger_core::TrialBalance| {
        tb.lines
            .iter()
            .map(|l| {
                (
                    l.account_id.clone(),
                    l.opening_debit.clone(),
                    l.opening_credit.clone(),
                    l.period_debit.clone(),
                    l.period_credit.clone(),
                    l.closing_debit.clone(),
                    l.closing_credit.clone(),
                )
            })
            .collect::<Vec<_>>()
    };

    let first = ledger.generate_trial_balance("jan", "auditor").await.unwrap();
    let second = ledger.generate_trial_balance("jan", "auditor").await.unwrap();
    assert_eq!(columns(&first), columns(&second));
    assert_eq!(ledger.get_trial_balance("jan").await.unwrap(), second);
}

#[tokio::test]
async fn test_closed_period_gates_create_update_and_post() {
    let (ledger, _) = standard_ledger(LedgerConfig::default()).await;
    let feb_entry = ledger
        .create_journal_entry(simple_draft("feb", date(2, 2), "cash", "sales", "10"))
        .await
        .unwrap();

    ledger.close_period("jan", "controller").await.unwrap();

    let err = ledger
        .create_journal_entry(simple_draft("jan", date(1, 5), "cash", "sales", "10"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "CLOSED_PERIOD");

    // Moving an open-period draft into the closed period
    let err = ledger
        .update_journal_entry(
            &feb_entry.id,
            simple_draft("jan", date(1, 5), "cash", "sales", "10"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "CLOSED_PERIOD");

    let err = ledger.close_period("jan", "controller").await.unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidOperation {
            operation: "close period",
            current_state: "CLOSED".to_string(),
        }
    );

    // The feb draft is untouched and still postable
    ledger.post_journal_entry(&feb_entry.id, "clerk").await.unwrap();
}

#[tokio::test]
async fn test_entry_date_must_fall_inside_period() {
    let (ledger, _) = standard_ledger(LedgerConfig::default()).await;

    let err = ledger
        .create_journal_entry(simple_draft("jan", date(2, 1), "cash", "sales", "10"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::Validation(ValidationError::DateOutsidePeriod {
            date: date(2, 1),
            period_id: "jan".to_string(),
        })
    );
}

#[tokio::test]
async fn test_unknown_and_inactive_accounts_rejected() {
    let (ledger, _) = standard_ledger(LedgerConfig::default()).await;

    let err = ledger
        .create_journal_entry(simple_draft("jan", date(1, 5), "ghost", "sales", "10"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "UNKNOWN_ACCOUNT");

    let err = ledger
        .create_journal_entry(simple_draft("jan", date(1, 5), "legacy", "cash", "10"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::Validation(ValidationError::InactiveAccount {
            account_id: "legacy".to_string(),
        })
    );
}

#[tokio::test]
async fn test_reopen_is_refused_once_trial_balance_exists() {
    let (ledger, _) = standard_ledger(LedgerConfig::default()).await;

    ledger.close_period("jan", "controller").await.unwrap();
    ledger.reopen_period("jan").await.unwrap();

    ledger.close_period("jan", "controller").await.unwrap();
    ledger.generate_trial_balance("jan", "auditor").await.unwrap();

    let err = ledger.reopen_period("jan").await.unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidOperation {
            operation: "reopen period",
            current_state: "CLOSED (trial balance generated)".to_string(),
        }
    );
    assert!(ledger.get_period("jan").await.unwrap().unwrap().is_closed);
}

#[tokio::test]
async fn test_reopen_with_trial_balance_when_configured() {
    let config = LedgerConfig {
        allow_reopen_with_trial_balance: true,
        ..LedgerConfig::default()
    };
    let (ledger, _) = standard_ledger(config).await;

    ledger.close_period("jan", "controller").await.unwrap();
    ledger.generate_trial_balance("jan", "auditor").await.unwrap();

    let reopened = ledger.reopen_period("jan").await.unwrap();
    assert!(!reopened.is_closed);
}

#[tokio::test]
async fn test_full_journal_lifecycle() {
    let (ledger, _) = standard_ledger(LedgerConfig::default()).await;

    // Invoice on credit
    let invoice = JournalDraftBuilder::new("jan", date(1, 8), "Invoice 1001")
        .journal_number("INV-1001")
        .debit("receivables", amount("1180"), None)
        .credit("sales", amount("1180"), Some("Consulting".to_string()))
        .build()
        .unwrap();
    let invoice = ledger.create_journal_entry(invoice).await.unwrap();
    assert_eq!(invoice.journal_number, "INV-1001");

    // Correct the draft before posting
    let corrected = JournalDraftBuilder::new("jan", date(1, 9), "Invoice 1001 (corrected)")
        .debit("receivables", amount("1200"), None)
        .credit("sales", amount("1200"), None)
        .build()
        .unwrap();
    let invoice = ledger
        .update_journal_entry(&invoice.id, corrected)
        .await
        .unwrap();
    assert_eq!(invoice.journal_number, "INV-1001");
    assert_eq!(invoice.total_credit, amount("1200"));

    ledger.post_journal_entry(&invoice.id, "clerk").await.unwrap();
    let approved = ledger
        .approve_journal_entry(&invoice.id, "manager")
        .await
        .unwrap();
    assert_eq!(approved.approved_by.as_deref(), Some("manager"));
    assert_eq!(approved.status, JournalStatus::Posted);

    let err = ledger
        .approve_journal_entry(&invoice.id, "manager")
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_OPERATION");

    // Approval does not touch the ledger
    assert_eq!(ledger.get_ledger_for_journal(&invoice.id).await.unwrap().len(), 2);
    assert_eq!(
        ledger.get_account_balance("receivables").await.unwrap(),
        amount("1200")
    );

    // A draft that is abandoned and one that is deleted
    let abandoned = ledger
        .create_journal_entry(simple_draft("jan", date(1, 15), "rent", "cash", "500"))
        .await
        .unwrap();
    ledger
        .cancel_journal_entry(&abandoned.id, "entered in wrong month")
        .await
        .unwrap();
    let scratch = ledger
        .create_journal_entry(simple_draft("jan", date(1, 16), "rent", "cash", "1"))
        .await
        .unwrap();
    ledger.delete_journal_entry(&scratch.id).await.unwrap();
    assert!(ledger.get_journal_entry(&scratch.id).await.unwrap().is_none());

    let cancelled = ledger
        .list_journal_entries(&JournalFilter {
            period_id: Some("jan".to_string()),
            status: Some(JournalStatus::Cancelled),
        })
        .await
        .unwrap();
    assert_eq!(cancelled.len(), 1);
    assert_eq!(
        cancelled[0].remarks.as_deref(),
        Some("Cancelled: entered in wrong month")
    );

    let all = ledger
        .list_journal_entries(&JournalFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_reversal_restores_balances_and_keeps_history() {
    let (ledger, storage) = standard_ledger(LedgerConfig::default()).await;
    let entry = ledger
        .create_journal_entry(simple_draft("jan", date(1, 20), "utilities", "payables", "310.40"))
        .await
        .unwrap();
    ledger.post_journal_entry(&entry.id, "clerk").await.unwrap();

    let reversal = ledger
        .reverse_journal_entry(&entry.id, "controller", date(2, 1), "billed twice")
        .await
        .unwrap();

    assert_eq!(reversal.period_id, "feb");
    assert_eq!(reversal.reversal_of.as_deref(), Some(entry.id.as_str()));
    assert!(reversal.description.contains("billed twice"));
    assert_eq!(
        ledger.get_account_balance("utilities").await.unwrap(),
        BigDecimal::from(0)
    );
    assert_eq!(
        ledger.get_account_balance("payables").await.unwrap(),
        BigDecimal::from(0)
    );
    assert_eq!(storage.ledger_len().unwrap(), 4);

    let original = ledger.get_journal_entry(&entry.id).await.unwrap().unwrap();
    assert_eq!(original.status, JournalStatus::Posted);
    assert_eq!(original.state_label(), "POSTED (REVERSED)");

    // Both periods balance on their own
    let jan = ledger.generate_trial_balance("jan", "auditor").await.unwrap();
    let feb = ledger.generate_trial_balance("feb", "auditor").await.unwrap();
    assert!(jan.is_balanced && feb.is_balanced);
    assert_eq!(
        feb.line_for("utilities").unwrap().period_credit,
        amount("310.40")
    );

    let history = ledger
        .get_ledger_for_account("utilities", None, None)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].balance_after, amount("310.40"));
    assert_eq!(history[1].balance_after, BigDecimal::from(0));
    assert_eq!(history[1].source_type, SourceType::Reversal);
}

#[tokio::test]
async fn test_reversal_into_closed_period_is_rejected() {
    let (ledger, _) = standard_ledger(LedgerConfig::default()).await;
    let entry = ledger
        .create_journal_entry(simple_draft("jan", date(1, 20), "utilities", "payables", "50"))
        .await
        .unwrap();
    ledger.post_journal_entry(&entry.id, "clerk").await.unwrap();
    ledger.close_period("feb", "controller").await.unwrap();

    let err = ledger
        .reverse_journal_entry(&entry.id, "controller", date(2, 10), "late correction")
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "CLOSED_PERIOD");

    let original = ledger.get_journal_entry(&entry.id).await.unwrap().unwrap();
    assert!(!original.is_reversed());
    assert_eq!(
        ledger.get_account_balance("utilities").await.unwrap(),
        BigDecimal::from(50)
    );
}

#[tokio::test]
async fn test_source_document_posting() {
    let (ledger, _) = standard_ledger(LedgerConfig::default()).await;

    let posted = ledger
        .post_source_document(
            simple_draft("feb", date(2, 14), "receivables", "sales", "99.99"),
            SourceRef::external("SALES_INVOICE", "SI-2024-0042"),
            "sales-module",
        )
        .await
        .unwrap();
    assert_eq!(posted.status, JournalStatus::Posted);
    assert_eq!(posted.journal_number, "JE-202402-00001");

    let rows = ledger
        .get_ledger_for_account("receivables", Some(date(2, 1)), Some(date(2, 29)))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].source_id, "SI-2024-0042");

    let err = ledger
        .post_source_document(
            simple_draft("feb", date(2, 14), "receivables", "sales", "0"),
            SourceRef::external("SALES_INVOICE", "SI-2024-0043"),
            "sales-module",
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "MALFORMED_LINE");
}

#[tokio::test]
async fn test_ledger_for_account_is_chronological_and_bounded() {
    let (ledger, _) = standard_ledger(LedgerConfig::default()).await;
    for (day, value) in [(20, "30"), (5, "10"), (12, "20")] {
        let entry = ledger
            .create_journal_entry(simple_draft("jan", date(1, day), "rent", "cash", value))
            .await
            .unwrap();
        ledger.post_journal_entry(&entry.id, "clerk").await.unwrap();
    }

    let rows = ledger.get_ledger_for_account("rent", None, None).await.unwrap();
    let dates: Vec<_> = rows.iter().map(|r| r.transaction_date).collect();
    assert_eq!(dates, vec![date(1, 5), date(1, 12), date(1, 20)]);

    let bounded = ledger
        .get_ledger_for_account("rent", Some(date(1, 10)), Some(date(1, 15)))
        .await
        .unwrap();
    assert_eq!(bounded.len(), 1);
    assert_eq!(bounded[0].debit, amount("20"));

    let err = ledger
        .get_ledger_for_account("ghost", None, None)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "RESOURCE_NOT_FOUND");
}

#[tokio::test]
async fn test_verify_balances_reports_drift() {
    let (ledger, storage) = standard_ledger(LedgerConfig::default()).await;
    let entry = ledger
        .create_journal_entry(simple_draft("jan", date(1, 10), "cash", "sales", "100"))
        .await
        .unwrap();
    ledger.post_journal_entry(&entry.id, "clerk").await.unwrap();

    let report = ledger.verify_balances().await.unwrap();
    assert!(report.is_valid, "{:?}", report.issues);
    assert_eq!(report.ledger_total_debit, BigDecimal::from(100));

    // An account written straight to storage with a balance the ledger cannot explain
    let mut drifted = ledger_core::Account::new(
        "suspense",
        "9999",
        "Suspense",
        ledger_core::AccountType::Asset,
    );
    drifted.current_balance = BigDecimal::from(42);
    storage.insert_account(&drifted).await.unwrap();

    let report = ledger.verify_balances().await.unwrap();
    assert!(!report.is_valid);
    assert_eq!(report.mismatches.len(), 1);
    assert_eq!(report.mismatches[0].account_id, "suspense");
    assert_eq!(report.mismatches[0].expected, BigDecimal::from(0));
}

#[tokio::test]
async fn test_custom_validator_and_number_prefix() {
    let storage = MemoryStorage::new();
    let config = LedgerConfig::from_toml("journal_number_prefix = \"GJ\"").unwrap();
    let ledger = Ledger::with_validator(storage, config, Arc::new(StrictJournalValidator));

    ledger
        .create_period(ledger_core::FinancialPeriod::new(
            "jan",
            "2024-01",
            "FY2024",
            date(1, 1),
            date(1, 31),
        ))
        .await
        .unwrap();
    for (id, code, account_type) in [
        ("cash", "1000", ledger_core::AccountType::Asset),
        ("sales", "4000", ledger_core::AccountType::Revenue),
    ] {
        ledger
            .register_account(ledger_core::Account::new(id, code, id, account_type))
            .await
            .unwrap();
    }

    let mut blank = simple_draft("jan", date(1, 3), "cash", "sales", "5");
    blank.description = String::new();
    let err = ledger.create_journal_entry(blank).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Validation(ValidationError::InvalidField { field: "description", .. })
    ));

    let entry = ledger
        .create_journal_entry(simple_draft("jan", date(1, 3), "cash", "sales", "5"))
        .await
        .unwrap();
    assert_eq!(entry.journal_number, "GJ-202401-00001");
    assert_eq!(ledger.list_active_accounts().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_period_rules() {
    let (ledger, _) = standard_ledger(LedgerConfig::default()).await;

    let err = ledger
        .create_period(ledger_core::FinancialPeriod::new(
            "jan-dup",
            "2024-01b",
            "FY2024",
            date(1, 15),
            date(2, 15),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_FIELD");

    let err = ledger
        .create_period(ledger_core::FinancialPeriod::new(
            "mar",
            "2024-01",
            "FY2024",
            date(3, 1),
            date(3, 31),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "DUPLICATE_RESOURCE");

    let period = ledger.find_period_for_date(date(2, 10)).await.unwrap().unwrap();
    assert_eq!(period.id, "feb");
    assert_eq!(ledger.list_periods().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_entries_survive_json_round_trip() {
    let (ledger, _) = standard_ledger(LedgerConfig::default()).await;
    let entry = ledger
        .create_journal_entry(simple_draft("jan", date(1, 10), "cash", "sales", "12.34"))
        .await
        .unwrap();
    let posted = ledger.post_journal_entry(&entry.id, "clerk").await.unwrap();
    let rows = ledger.get_ledger_for_journal(&entry.id).await.unwrap();

    let json = serde_json::to_string(&posted).unwrap();
    assert!(json.contains("\"status\":\"POSTED\""));
    let back: ledger_core::JournalEntry = serde_json::from_str(&json).unwrap();
    assert_eq!(back, posted);

    let json = serde_json::to_string(&rows).unwrap();
    let back: Vec<ledger_core::GeneralLedgerEntry> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, rows);
}

#[tokio::test]
async fn test_opening_balance_must_fit_ledger_scale() {
    let (ledger, _) = standard_ledger(LedgerConfig::default()).await;

    let err = ledger
        .register_account(
            ledger_core::Account::new("fx", "1100", "FX Clearing", ledger_core::AccountType::Asset)
                .with_opening_balance(amount("100.005"), ledger_core::BalanceSide::Debit),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Validation(ValidationError::InvalidField { field: "opening balance", .. })
    ));
    assert!(ledger.get_account("fx").await.unwrap().is_none());

    ledger
        .register_account(
            ledger_core::Account::new("fx", "1100", "FX Clearing", ledger_core::AccountType::Asset)
                .with_opening_balance(amount("100.01"), ledger_core::BalanceSide::Debit),
        )
        .await
        .unwrap();
    let entry = ledger
        .create_journal_entry(simple_draft("jan", date(1, 10), "fx", "sales", "1"))
        .await
        .unwrap();
    ledger.post_journal_entry(&entry.id, "clerk").await.unwrap();

    // Stored balance equals opening plus movement exactly
    assert_eq!(ledger.get_account_balance("fx").await.unwrap(), amount("101.01"));
    let rows = ledger.get_ledger_for_account("fx", None, None).await.unwrap();
    assert_eq!(rows[0].balance_after, amount("101.01"));
    assert!(ledger.verify_balances().await.unwrap().is_valid);
}

#[tokio::test]
async fn test_carry_forward_opening_includes_earlier_movement() {
    let config = LedgerConfig {
        carry_forward_opening: true,
        ..LedgerConfig::default()
    };
    let (ledger, storage) = standard_ledger(config).await;

    // A period from the previous fiscal year, dated before January
    let december = NaiveDate::from_ymd_opt(2023, 12, 15).unwrap();
    ledger
        .create_period(ledger_core::FinancialPeriod::new(
            "dec23",
            "2023-12",
            "FY2023",
            NaiveDate::from_ymd_opt(2023, 12, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        ))
        .await
        .unwrap();

    for (period, entry_date, debit, credit, value) in [
        ("dec23", december, "cash", "sales", "300"),
        ("jan", date(1, 10), "rent", "cash", "100"),
        ("feb", date(2, 5), "cash", "sales", "50"),
    ] {
        let entry = ledger
            .create_journal_entry(simple_draft(period, entry_date, debit, credit, value))
            .await
            .unwrap();
        ledger.post_journal_entry(&entry.id, "clerk").await.unwrap();
    }

    let feb = ledger.generate_trial_balance("feb", "auditor").await.unwrap();
    let cash = feb.line_for("cash").unwrap();
    assert_eq!(cash.opening_debit, BigDecimal::from(5200));
    assert_eq!(cash.period_debit, BigDecimal::from(50));
    assert_eq!(cash.closing_debit, BigDecimal::from(5250));
    let sales = feb.line_for("sales").unwrap();
    assert_eq!(sales.opening_credit, BigDecimal::from(300));
    assert_eq!(sales.closing_credit, BigDecimal::from(350));
    let rent = feb.line_for("rent").unwrap();
    assert_eq!(rent.opening_debit, BigDecimal::from(100));
    assert_eq!(rent.period_debit, BigDecimal::from(0));
    assert!(feb.is_balanced);
    assert_eq!(feb.total_closing_debit, BigDecimal::from(5350));

    // December belongs to FY2023 but is still dated before January
    let jan = ledger.generate_trial_balance("jan", "auditor").await.unwrap();
    assert_eq!(jan.line_for("cash").unwrap().opening_debit, BigDecimal::from(5300));
    assert_eq!(jan.line_for("sales").unwrap().opening_credit, BigDecimal::from(300));
    assert!(jan.is_balanced);

    // Without carry-forward the opening columns are the static openings
    let static_view = Ledger::with_config(storage, LedgerConfig::default());
    let feb = static_view.generate_trial_balance("feb", "auditor").await.unwrap();
    assert_eq!(feb.line_for("cash").unwrap().opening_debit, BigDecimal::from(5000));
    assert_eq!(feb.line_for("sales").unwrap().opening_credit, BigDecimal::from(0));
    assert!(feb.is_balanced);
}
