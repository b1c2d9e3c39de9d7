//! Configuration for the Lakewise SQL Guard.
//!
//! The guard never reads environment variables or probes for config files on
//! its own — the table whitelist and row cap are owned by the embedding
//! application and supplied via [`GuardConfig`]. For applications that keep
//! guard policy in a `lakewise.toml`, [`GuardConfig::from_path`] loads an
//! explicit file.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::Dialect;

/// Default row cap injected into non-aggregating queries without a `LIMIT`.
pub const DEFAULT_MAX_ROWS: u64 = 1000;

/// Default maximum query length in bytes, bounding parser CPU and memory.
pub const DEFAULT_MAX_QUERY_LEN: usize = 50_000;

/// Guard configuration: the whitelist, the row cap, and policy knobs.
///
/// Read-only for the lifetime of a [`crate::SqlGuard`]. Two guards built from
/// equal configs produce identical results for identical inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// SQL dialect for the parser adapter.
    pub dialect: Dialect,

    /// Permitted table names. A reference passes if its fully-qualified
    /// form (`dataset.table`) or its final component is present here.
    pub allowed_tables: BTreeSet<String>,

    /// Row cap injected into non-aggregating queries lacking a `LIMIT`.
    pub max_rows: u64,

    /// Maximum accepted query length in bytes.
    pub max_query_len: usize,

    /// Fold table names to lowercase before whitelist comparison.
    /// Off by default: matching is exact and case-sensitive.
    pub fold_table_case: bool,

    /// Clamp an explicit `LIMIT` larger than `max_rows` down to `max_rows`.
    /// Off by default: an explicit LIMIT is treated as intentional and
    /// preserved as written.
    pub clamp_excess_limit: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::BigQuery,
            allowed_tables: BTreeSet::new(),
            max_rows: DEFAULT_MAX_ROWS,
            max_query_len: DEFAULT_MAX_QUERY_LEN,
            fold_table_case: false,
            clamp_excess_limit: false,
        }
    }
}

impl GuardConfig {
    /// Build a config from a whitelist and row cap, with everything else
    /// defaulted. The common construction path for embedding callers.
    pub fn with_whitelist<I, S>(allowed_tables: I, max_rows: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_tables: allowed_tables.into_iter().map(Into::into).collect(),
            max_rows,
            ..Self::default()
        }
    }

    /// Parse a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not valid TOML or does
    /// not match the config schema.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load a config from an explicit TOML file path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read and
    /// [`ConfigError::Parse`] when its contents are invalid.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.display().to_string(), e.to_string()))?;
        Self::from_toml_str(&text)
    }

    /// Whether a (possibly folded) name is present in the whitelist.
    pub(crate) fn table_allowed(&self, name: &str) -> bool {
        if self.fold_table_case {
            let folded = name.to_lowercase();
            self.allowed_tables.iter().any(|t| t.to_lowercase() == folded)
        } else {
            self.allowed_tables.contains(name)
        }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("failed to read config file '{0}': {1}")]
    Read(String, String),

    /// Failed to parse configuration text.
    #[error("failed to parse config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = GuardConfig::default();
        assert_eq!(config.dialect, Dialect::BigQuery);
        assert_eq!(config.max_rows, 1000);
        assert_eq!(config.max_query_len, 50_000);
        assert!(config.allowed_tables.is_empty());
        assert!(!config.fold_table_case);
        assert!(!config.clamp_excess_limit);
    }

    #[test]
    fn test_with_whitelist() {
        let config = GuardConfig::with_whitelist(["orders", "users"], 500);
        assert_eq!(config.max_rows, 500);
        assert!(config.table_allowed("orders"));
        assert!(!config.table_allowed("admin_users"));
    }

    #[test]
    fn test_table_allowed_case_sensitive_by_default() {
        let config = GuardConfig::with_whitelist(["orders"], 1000);
        assert!(config.table_allowed("orders"));
        assert!(!config.table_allowed("Orders"));
    }

    #[test]
    fn test_table_allowed_case_folding() {
        let mut config = GuardConfig::with_whitelist(["Orders"], 1000);
        config.fold_table_case = true;
        assert!(config.table_allowed("ORDERS"));
        assert!(config.table_allowed("orders"));
    }

    #[test]
    fn test_from_toml_str() {
        let config = GuardConfig::from_toml_str(
            r#"
            dialect = "bigquery"
            allowed_tables = ["orders", "order_items", "products", "users"]
            max_rows = 2000
            clamp_excess_limit = true
            "#,
        )
        .unwrap();
        assert_eq!(config.max_rows, 2000);
        assert_eq!(config.allowed_tables.len(), 4);
        assert!(config.clamp_excess_limit);
        // Unspecified fields fall back to defaults
        assert_eq!(config.max_query_len, 50_000);
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let err = GuardConfig::from_toml_str("allowed_tables = 5").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "allowed_tables = [\"orders\"]\nmax_rows = 100").unwrap();
        let config = GuardConfig::from_path(file.path()).unwrap();
        assert_eq!(config.max_rows, 100);
        assert!(config.table_allowed("orders"));
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = GuardConfig::from_path(Path::new("/nonexistent/lakewise.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read(_, _)));
    }
}
