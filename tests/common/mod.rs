//! Shared fixtures for the integration tests
#![allow(dead_code)]

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use ledger_core::{
    init_tracing, Account, AccountType, BalanceSide, DraftLine, FinancialPeriod, JournalDraft,
    Ledger, LedgerConfig, MemoryStorage,
};

pub fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

pub fn amount(value: &str) -> BigDecimal {
    value.parse().unwrap()
}

/// January and February of FY2024 plus a small chart of accounts.
///
/// Cash opens at 5,000 debit against 5,000 credit capital.
pub async fn standard_ledger(config: LedgerConfig) -> (Ledger<MemoryStorage>, MemoryStorage) {
    init_tracing();

    let storage = MemoryStorage::new();
    let ledger = Ledger::with_config(storage.clone(), config);

    ledger
        .create_period(FinancialPeriod::new("jan", "2024-01", "FY2024", date(1, 1), date(1, 31)))
        .await
        .unwrap();
    ledger
        .create_period(FinancialPeriod::new("feb", "2024-02", "FY2024", date(2, 1), date(2, 29)))
        .await
        .unwrap();

    for account in [
        Account::new("cash", "1000", "Cash", AccountType::Asset)
            .with_opening_balance(BigDecimal::from(5000), BalanceSide::Debit),
        Account::new("receivables", "1200", "Accounts Receivable", AccountType::Asset),
        Account::new("payables", "2000", "Accounts Payable", AccountType::Liability),
        Account::new("capital", "3000", "Owner's Capital", AccountType::Equity)
            .with_opening_balance(BigDecimal::from(5000), BalanceSide::Credit),
        Account::new("sales", "4000", "Sales", AccountType::Revenue),
        Account::new("rent", "6100", "Rent Expense", AccountType::Expense),
        Account::new("utilities", "6200", "Utilities Expense", AccountType::Expense),
        Account::new("legacy", "6900", "Legacy Expense", AccountType::Expense).inactive(),
    ] {
        ledger.register_account(account).await.unwrap();
    }

    (ledger, storage)
}

/// Draft with one debit and one credit line of the same amount
pub fn simple_draft(
    period_id: &str,
    entry_date: NaiveDate,
    debit_account: &str,
    credit_account: &str,
    value: &str,
) -> JournalDraft {
    JournalDraft {
        journal_number: None,
        entry_date,
        period_id: period_id.to_string(),
        description: format!("{debit_account} / {credit_account}"),
        lines: vec![
            DraftLine::debit(debit_account, amount(value)),
            DraftLine::credit(credit_account, amount(value)),
        ],
    }
}
