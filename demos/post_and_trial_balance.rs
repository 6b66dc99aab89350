//! Posting journal entries and producing a period trial balance

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use ledger_core::{
    init_tracing, Account, AccountType, BalanceSide, FinancialPeriod, JournalDraftBuilder, Ledger,
    MemoryStorage, SourceRef,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    println!("📒 Ledger Core - Post and Trial Balance Example\n");

    let ledger = Ledger::new(MemoryStorage::new());

    // 1. Open a period and register the chart of accounts
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("bad date")?;
    let end = NaiveDate::from_ymd_opt(2024, 1, 31).ok_or("bad date")?;
    ledger
        .create_period(FinancialPeriod::new("jan", "2024-01", "FY2024", start, end))
        .await?;

    for account in [
        Account::new("cash", "1000", "Cash", AccountType::Asset)
            .with_opening_balance(BigDecimal::from(20000), BalanceSide::Debit),
        Account::new("receivables", "1200", "Accounts Receivable", AccountType::Asset),
        Account::new("capital", "3000", "Owner's Capital", AccountType::Equity)
            .with_opening_balance(BigDecimal::from(20000), BalanceSide::Credit),
        Account::new("sales", "4000", "Sales", AccountType::Revenue),
        Account::new("rent", "6100", "Rent Expense", AccountType::Expense),
    ] {
        let account = ledger.register_account(account).await?;
        println!("  ✓ Registered {} - {}", account.code, account.name);
    }
    println!();

    // 2. A manual journal entry: draft, then post
    let rent_day = NaiveDate::from_ymd_opt(2024, 1, 5).ok_or("bad date")?;
    let draft = JournalDraftBuilder::new("jan", rent_day, "January rent")
        .debit("rent", BigDecimal::from(1500), None)
        .credit("cash", BigDecimal::from(1500), None)
        .build()?;
    let entry = ledger.create_journal_entry(draft).await?;
    println!("📝 Drafted {} ({})", entry.journal_number, entry.status);

    let entry = ledger.post_journal_entry(&entry.id, "accountant").await?;
    println!("✅ Posted {} ({})", entry.journal_number, entry.status);

    // 3. A sales invoice posted straight from its source document
    let invoice_day = NaiveDate::from_ymd_opt(2024, 1, 12).ok_or("bad date")?;
    let invoice = JournalDraftBuilder::new("jan", invoice_day, "Invoice INV-042")
        .debit("receivables", BigDecimal::from(4200), None)
        .credit("sales", BigDecimal::from(4200), None)
        .build()?;
    let entry = ledger
        .post_source_document(invoice, SourceRef::external("SALES_INVOICE", "INV-042"), "billing")
        .await?;
    println!("✅ Posted {} from INV-042\n", entry.journal_number);

    // 4. Balances and the trial balance
    println!("💰 Balances (debit positive):");
    for account in ledger.list_active_accounts().await? {
        let balance = ledger.get_account_balance(&account.id).await?;
        println!("  {:<6} {:<22} {:>12}", account.code, account.name, balance);
    }
    println!();

    let trial_balance = ledger.generate_trial_balance("jan", "controller").await?;
    println!("📊 Trial Balance for {}:", trial_balance.period_id);
    println!("  {:<6} {:<22} {:>12} {:>12}", "Code", "Account", "Debit", "Credit");
    for line in &trial_balance.lines {
        println!(
            "  {:<6} {:<22} {:>12} {:>12}",
            line.account_code, line.account_name, line.closing_debit, line.closing_credit
        );
    }
    println!(
        "  {:<29} {:>12} {:>12}",
        "Total", trial_balance.total_closing_debit, trial_balance.total_closing_credit
    );
    println!(
        "\n{} Trial balance is {}",
        if trial_balance.is_balanced { "✓" } else { "✗" },
        if trial_balance.is_balanced { "balanced" } else { "out of balance" }
    );

    // 5. Close the period
    let period = ledger.close_period("jan", "controller").await?;
    println!("🔒 Period {} closed by {}", period.code, period.closed_by.unwrap_or_default());

    Ok(())
}
