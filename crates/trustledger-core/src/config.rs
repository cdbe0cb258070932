//! Configuration management for ledger hosts.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`TRUSTLEDGER__` prefix, e.g. `TRUSTLEDGER__LEDGER__JSON_LOGS=true`)
//! 2. Config file (`trustledger.toml`, `[ledger]` table)
//! 3. Defaults

use serde::Deserialize;

/// Host-level settings. Protocol constants (score bounds, history capacity)
/// are not configurable.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Default tracing filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Emit logs as JSON lines instead of human-readable text.
    #[serde(default)]
    pub json_logs: bool,

    /// Append the hash-chained event journal to this file.
    #[serde(default)]
    pub journal_path: Option<String>,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            json_logs: false,
            journal_path: None,
        }
    }
}

impl LedgerConfig {
    /// Load from `{file_prefix}.toml` (optional) and the environment.
    ///
    /// A missing or malformed `[ledger]` table falls back to defaults.
    pub fn load(file_prefix: &str) -> Result<Self, config::ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("TRUSTLEDGER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        match cfg.get::<LedgerConfig>("ledger") {
            Ok(c) => Ok(c),
            Err(e) => {
                tracing::debug!(error = %e, "No [ledger] config section, using defaults");
                Ok(LedgerConfig::default())
            }
        }
    }
}
