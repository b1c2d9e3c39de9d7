//! Content-addressable cache for validation results.
//!
//! Validation is pure and idempotent: the result is a function of the SQL
//! text, the whitelist, and the cap. That makes results safe to cache by a
//! SHA-256 digest of the text, with the whole cache keyed to a fingerprint
//! of the config and the engine version — change either and every entry is
//! invalid at once.
//!
//! The cache is an optional layer on top of [`crate::SqlGuard`]; the guard
//! itself never caches. Eviction is coarse: a full cache is cleared rather
//! than tracked entry-by-entry, since re-validating is cheap.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::config::{ConfigError, GuardConfig};
use crate::types::ValidationResult;

/// Current engine version, part of the cache fingerprint.
const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default maximum number of cached entries.
const DEFAULT_MAX_ENTRIES: usize = 4096;

/// A single cached validation outcome.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached result.
    pub result: ValidationResult,
    /// When the entry was stored.
    pub cached_at: DateTime<Utc>,
}

/// In-memory validation result cache keyed by SQL content hash.
#[derive(Debug)]
pub struct ValidationCache {
    config_fingerprint: String,
    entries: HashMap<String, CacheEntry>,
    max_entries: usize,
}

impl ValidationCache {
    /// Create a cache bound to the given config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the config cannot be fingerprinted
    /// (serialization failure; does not happen for well-formed configs).
    pub fn new(config: &GuardConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            config_fingerprint: config_fingerprint(config)?,
            entries: HashMap::new(),
            max_entries: DEFAULT_MAX_ENTRIES,
        })
    }

    /// Look up a cached result for this exact SQL text under this config.
    #[must_use]
    pub fn get(&self, config: &GuardConfig, sql: &str) -> Option<&ValidationResult> {
        let fingerprint = config_fingerprint(config).ok()?;
        if fingerprint != self.config_fingerprint {
            return None;
        }
        self.entries.get(&sql_fingerprint(sql)).map(|e| &e.result)
    }

    /// Store a result. If the config changed since construction, the cache
    /// rebinds to the new config and drops all prior entries.
    pub fn insert(&mut self, config: &GuardConfig, sql: &str, result: ValidationResult) {
        let Ok(fingerprint) = config_fingerprint(config) else {
            return;
        };
        if fingerprint != self.config_fingerprint {
            log::debug!("config fingerprint changed; clearing validation cache");
            self.entries.clear();
            self.config_fingerprint = fingerprint;
        }
        if self.entries.len() >= self.max_entries {
            log::debug!("validation cache full ({} entries); clearing", self.entries.len());
            self.entries.clear();
        }
        self.entries.insert(
            sql_fingerprint(sql),
            CacheEntry {
                result,
                cached_at: Utc::now(),
            },
        );
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// SHA-256 hex digest of SQL text.
#[must_use]
pub fn sql_fingerprint(sql: &str) -> String {
    hex::encode(Sha256::digest(sql.as_bytes()))
}

/// SHA-256 hex digest over the serialized config plus the engine version.
fn config_fingerprint(config: &GuardConfig) -> Result<String, ConfigError> {
    let serialized =
        serde_json::to_string(config).map_err(|e| ConfigError::Parse(e.to_string()))?;
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    hasher.update(ENGINE_VERSION.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}
