//! Validation orchestrator — the main entry point of the guard.
//!
//! Fixed pipeline: pre-parse screen (length, emptiness, structural probes) →
//! parse → statement-type policy → table-access policy → limit injection.
//! The order fails fast on the cheapest, most dangerous violations, and a
//! rewrite is never computed for a statement that will be rejected.
//!
//! The whole pipeline is wrapped in `catch_unwind`: an unhandled fault in
//! this path is itself a crash vector, so every input — however malformed or
//! adversarial — resolves to a [`ValidationResult`], never a panic. The call
//! is pure and synchronous: no I/O, no shared mutable state, no suspension
//! point; repeated calls with the same input and config are idempotent.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::config::GuardConfig;
use crate::parser;
use crate::policies::{build_policy_registry, PolicyRule};
use crate::prescreen;
use crate::types::{ErrorKind, Rejection, ValidationResult};

/// The SQL safety gate between query synthesis and query execution.
///
/// Holds the configuration and the fixed policy registry. Safe to share
/// across threads; each `validate` call is fully independent.
pub struct SqlGuard {
    config: GuardConfig,
    policies: Vec<Box<dyn PolicyRule>>,
}

impl SqlGuard {
    /// Create a guard with the given configuration.
    #[must_use]
    pub fn new(config: GuardConfig) -> Self {
        let policies = build_policy_registry();
        Self { config, policies }
    }

    /// The configuration this guard was built with.
    #[must_use]
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Validate a candidate query.
    ///
    /// Returns `Accepted { rewritten_sql }` — possibly with an injected row
    /// cap — or `Rejected` with the first policy violation found. The
    /// downstream executor must run `rewritten_sql`, never the input text.
    pub fn validate(&self, sql: &str) -> ValidationResult {
        match catch_unwind(AssertUnwindSafe(|| self.validate_inner(sql))) {
            Ok(result) => result,
            Err(_) => {
                log::error!("validation pipeline panicked; rejecting query");
                ValidationResult::Rejected(Rejection::new(
                    ErrorKind::Internal,
                    "internal validation fault; the query was not executed",
                ))
            }
        }
    }

    fn validate_inner(&self, sql: &str) -> ValidationResult {
        if let Err(rejection) = prescreen::screen(sql, &self.config) {
            log::warn!("prescreen rejected query: {rejection}");
            return ValidationResult::Rejected(rejection);
        }

        let mut statement = match parser::parse_single(sql, &self.config) {
            Ok(statement) => statement,
            Err(rejection) => {
                log::warn!("parser rejected query: {rejection}");
                return ValidationResult::Rejected(rejection);
            }
        };

        let mut rewrote = false;
        for policy in &self.policies {
            match policy.apply(&mut statement, &self.config) {
                Ok(changed) => {
                    log::debug!("policy '{}' passed (rewrote: {changed})", policy.name());
                    rewrote |= changed;
                }
                Err(rejection) => {
                    log::warn!("policy '{}' rejected query: {rejection}", policy.name());
                    return ValidationResult::Rejected(rejection);
                }
            }
        }

        let rewritten_sql = if rewrote {
            statement.to_string()
        } else {
            sql.to_owned()
        };
        ValidationResult::Accepted { rewritten_sql }
    }
}

/// One-shot validation with a whitelist and row cap, everything else default.
///
/// Convenience wrapper for callers that do not hold a [`SqlGuard`]:
/// constructs the config, runs the full pipeline, returns the result.
pub fn validate<I, S>(sql: &str, whitelist: I, max_rows: u64) -> ValidationResult
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    SqlGuard::new(GuardConfig::with_whitelist(whitelist, max_rows)).validate(sql)
}
