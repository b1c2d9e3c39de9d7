//! Output rendering for validation results.
//!
//! Two formats:
//!
//! 1. **JSON** — `serde_json` serialization of [`ValidationResult`], for the
//!    agent pipeline and for log shipping.
//! 2. **Human** — a single actionable line for the CLI layer: what was wrong
//!    (disallowed table, statement keyword, parse diagnostic), never a
//!    generic "invalid query".

use crate::types::{RejectionDetail, ValidationResult};

/// Serialize a validation result to pretty-printed JSON.
///
/// # Errors
///
/// Returns the underlying serialization error (does not happen for
/// well-formed results).
pub fn to_json(result: &ValidationResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

/// Render a single human-readable line describing the result.
#[must_use]
pub fn render_human(result: &ValidationResult) -> String {
    match result {
        ValidationResult::Accepted { rewritten_sql } => {
            format!("accepted: {rewritten_sql}")
        }
        ValidationResult::Rejected(rejection) => {
            let mut line = format!("rejected ({}): {}", rejection.kind, rejection.message);
            match &rejection.detail {
                Some(RejectionDetail::DisallowedTables { disallowed }) => {
                    line.push_str(&format!(" [tables: {}]", disallowed.join(", ")));
                }
                Some(RejectionDetail::StatementCount { count }) => {
                    line.push_str(&format!(" [statements: {count}]"));
                }
                Some(RejectionDetail::QueryLength { length, max_length }) => {
                    line.push_str(&format!(" [{length} bytes, max {max_length}]"));
                }
                None => {}
            }
            line
        }
    }
}
