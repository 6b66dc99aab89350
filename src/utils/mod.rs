//! Utility modules

pub mod memory_storage;
pub mod validation;

pub use memory_storage::*;
pub use validation::*;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Installs a global `fmt` subscriber filtered by `RUST_LOG`, defaulting to
/// `ledger_core=info`. Later calls are no-ops, as is a call made after some
/// other subscriber was installed.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("ledger_core=info"));

        fmt().with_env_filter(filter).try_init().ok();
    });
}
