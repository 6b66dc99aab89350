//! # Ledger Core
//!
//! The general-ledger core of an ERP: balanced double-entry journal entries,
//! an append-only general ledger, running account balances, financial period
//! gating and period trial balances.
//!
//! ## Features
//!
//! - **Journal entries**: validated drafts that move DRAFT -> POSTED or DRAFT -> CANCELLED
//! - **Posting**: one ledger row and one balance write per line, committed atomically
//! - **Reversal**: posted entries are corrected by a mirrored reversing entry, never edited
//! - **Financial periods**: open/close gating of creation, update and posting
//! - **Trial balance**: per-period opening, movement and closing columns, rebuilt from the ledger
//! - **Storage abstraction**: database-agnostic design with trait-based storage
//!
//! ## Quick Start
//!
//! ```rust
//! use ledger_core::{
//!     Account, AccountType, FinancialPeriod, JournalDraftBuilder, Ledger, MemoryStorage,
//! };
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! # async fn run() -> ledger_core::LedgerResult<()> {
//! let ledger = Ledger::new(MemoryStorage::new());
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
//! ledger
//!     .create_period(FinancialPeriod::new("2024-01", "2024-01", "FY2024", start, end))
//!     .await?;
//! ledger
//!     .register_account(Account::new("cash", "1000", "Cash", AccountType::Asset))
//!     .await?;
//! ledger
//!     .register_account(Account::new("sales", "4000", "Sales", AccountType::Revenue))
//!     .await?;
//!
//! let draft = JournalDraftBuilder::new("2024-01", start, "Cash sale")
//!     .debit("cash", BigDecimal::from(100), None)
//!     .credit("sales", BigDecimal::from(100), None)
//!     .build()?;
//! let entry = ledger.create_journal_entry(draft).await?;
//! ledger.post_journal_entry(&entry.id, "clerk").await?;
//!
//! assert_eq!(ledger.get_account_balance("cash").await?, BigDecimal::from(100));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod ledger;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::LedgerConfig;
pub use error::*;
pub use ledger::{
    AccountManager, BalanceMaintainer, BalanceMismatch, DefaultJournalValidator, IntegrityReport,
    JournalDraftBuilder, JournalManager, Ledger, PeriodController, PostingEngine,
    TrialBalanceGenerator,
};
pub use traits::*;
pub use types::*;
pub use utils::{init_tracing, MemoryStorage, StrictJournalValidator};
