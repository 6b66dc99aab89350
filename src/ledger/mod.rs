//! Ledger module containing the journal, posting, period and trial balance engines

pub mod account;
pub mod balance;
pub mod core;
pub mod journal;
pub mod period;
pub mod posting;
pub mod trial_balance;
pub mod validator;

pub use account::*;
pub use balance::BalanceMaintainer;
pub use self::core::*;
pub use journal::{JournalDraftBuilder, JournalManager};
pub use period::*;
pub use posting::*;
pub use trial_balance::*;
pub use validator::*;
