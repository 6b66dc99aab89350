//! Ledger configuration

use serde::Deserialize;

use crate::error::ValidationError;
use crate::utils::validation::validate_identifier;

/// Longest prefix whose generated numbers (`{prefix}-YYYYMM-NNNNN`) stay valid journal numbers
const MAX_PREFIX_LEN: usize = 36;

/// Tunables for the ledger core.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LedgerConfig {
    /// Decimal places kept for amounts and balances.
    #[serde(default = "default_scale")]
    pub scale: i64,
    /// Optimistic-concurrency retries for a posting before giving up.
    #[serde(default = "default_max_posting_retries")]
    pub max_posting_retries: u32,
    /// Wait before the first posting retry; doubles on each further retry.
    #[serde(default = "default_retry_initial_backoff_ms")]
    pub retry_initial_backoff_ms: u64,
    /// Upper bound on the wait between posting retries.
    #[serde(default = "default_retry_max_backoff_ms")]
    pub retry_max_backoff_ms: u64,
    /// Prefix for generated journal numbers.
    #[serde(default = "default_journal_number_prefix")]
    pub journal_number_prefix: String,
    /// Allow reopening a period that already has a generated trial balance.
    #[serde(default)]
    pub allow_reopen_with_trial_balance: bool,
    /// Include movement before the period start in trial balance opening columns.
    #[serde(default)]
    pub carry_forward_opening: bool,
}

fn default_scale() -> i64 {
    2
}

fn default_max_posting_retries() -> u32 {
    3
}

fn default_retry_initial_backoff_ms() -> u64 {
    1
}

fn default_retry_max_backoff_ms() -> u64 {
    50
}

fn default_journal_number_prefix() -> String {
    "JE".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            max_posting_retries: default_max_posting_retries(),
            retry_initial_backoff_ms: default_retry_initial_backoff_ms(),
            retry_max_backoff_ms: default_retry_max_backoff_ms(),
            journal_number_prefix: default_journal_number_prefix(),
            allow_reopen_with_trial_balance: false,
            carry_forward_opening: false,
        }
    }
}

impl LedgerConfig {
    /// Loads configuration from `config/ledger.toml` and `LEDGER__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a source exists but cannot be parsed, or if the
    /// resulting values fail [`LedgerConfig::validate`].
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("config/ledger").required(false))
            .add_source(config::Environment::with_prefix("LEDGER").separator("__"))
            .build()?
            .try_deserialize::<Self>()?
            .validated()
    }

    /// Parses configuration from a TOML document.
    pub fn from_toml(toml: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize::<Self>()?
            .validated()
    }

    /// Checks values the engines rely on.
    ///
    /// Generated journal numbers must pass the same rules as caller-supplied
    /// ones, so the prefix follows identifier rules and leaves room for the
    /// `-YYYYMM-NNNNN` suffix.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.scale < 0 {
            return Err(ValidationError::InvalidField {
                field: "scale",
                reason: "cannot be negative".to_string(),
            });
        }
        if self.retry_initial_backoff_ms > self.retry_max_backoff_ms {
            return Err(ValidationError::InvalidField {
                field: "retry backoff",
                reason: "initial backoff exceeds the maximum".to_string(),
            });
        }
        validate_identifier("journal number prefix", &self.journal_number_prefix)?;
        if self.journal_number_prefix.len() > MAX_PREFIX_LEN {
            return Err(ValidationError::InvalidField {
                field: "journal number prefix",
                reason: format!("cannot exceed {MAX_PREFIX_LEN} characters"),
            });
        }
        Ok(())
    }

    fn validated(self) -> Result<Self, config::ConfigError> {
        self.validate()
            .map_err(|err| config::ConfigError::Message(err.to_string()))?;
        Ok(self)
    }
}
