//! Core type definitions for the Lakewise SQL Guard.
//!
//! These types form the contract between the guard and its callers (the SQL
//! synthesis stage upstream, the query execution stage downstream):
//!
//! - [`Dialect`] selects the parser grammar for the target warehouse
//! - [`ErrorKind`] is the rejection taxonomy
//! - [`Rejection`] is the atomic unit of rejection output
//! - [`ValidationResult`] is the single externally visible artifact
//!
//! A query that fails any policy is never returned as `Accepted` — there is
//! no partial-acceptance state.

use serde::{Deserialize, Serialize};

/// Maximum length of query text echoed back inside rejection messages.
///
/// Rejection messages must name the offending construct, but must not
/// reflect a full injection payload or an accidentally embedded secret.
pub(crate) const MAX_SNIPPET_LEN: usize = 120;

/// SQL dialect used by the parser adapter.
///
/// The warehouse is BigQuery; `Generic` exists for tests and for callers
/// validating against a non-BigQuery engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// BigQuery Standard SQL (default).
    #[default]
    BigQuery,
    /// ANSI-ish generic SQL.
    Generic,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BigQuery => write!(f, "bigquery"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

impl Dialect {
    /// The sqlparser dialect implementation for this variant.
    pub(crate) fn parser_dialect(self) -> Box<dyn sqlparser::dialect::Dialect> {
        match self {
            Self::BigQuery => Box::new(sqlparser::dialect::BigQueryDialect {}),
            Self::Generic => Box::new(sqlparser::dialect::GenericDialect {}),
        }
    }
}

/// Why a candidate query was rejected.
///
/// Every kind is permanent from the guard's point of view: re-submitting the
/// identical input yields the identical result. The upstream caller may
/// regenerate a corrected query, but that retry loop lives outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The text is not valid SQL in the configured dialect, or is empty.
    ParseError,
    /// A non-SELECT statement (DML/DDL/DCL) was found anywhere in the tree.
    DisallowedStatementType,
    /// A referenced table is not on the whitelist.
    TableAccessDenied,
    /// More than one statement was supplied.
    MultipleStatements,
    /// The query text exceeds the configured maximum length.
    QueryTooLong,
    /// Reserved for callers that impose a wall-clock deadline around the
    /// (otherwise synchronous) validation call.
    ValidationTimeout,
    /// A fault inside the guard itself; the query is rejected, not executed.
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParseError => write!(f, "parse_error"),
            Self::DisallowedStatementType => write!(f, "disallowed_statement_type"),
            Self::TableAccessDenied => write!(f, "table_access_denied"),
            Self::MultipleStatements => write!(f, "multiple_statements"),
            Self::QueryTooLong => write!(f, "query_too_long"),
            Self::ValidationTimeout => write!(f, "validation_timeout"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Structured data attached to a rejection, for callers that want more than
/// the human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionDetail {
    /// Tables referenced by the query but absent from the whitelist, sorted.
    DisallowedTables {
        /// The offending table names as written in the query.
        disallowed: Vec<String>,
    },
    /// How many statements the input parsed into.
    StatementCount {
        /// Number of parsed statements.
        count: usize,
    },
    /// Input length versus the configured bound.
    QueryLength {
        /// Length of the input in bytes.
        length: usize,
        /// Configured maximum length in bytes.
        max_length: usize,
    },
}

/// A single rejection: the kind, an actionable message, and optional detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// Rejection taxonomy kind.
    pub kind: ErrorKind,
    /// Human-readable, actionable message naming the offending construct.
    pub message: String,
    /// Optional structured detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<RejectionDetail>,
}

impl Rejection {
    /// Create a rejection with no structured detail.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    /// Attach structured detail.
    #[must_use]
    pub fn with_detail(mut self, detail: RejectionDetail) -> Self {
        self.detail = Some(detail);
        self
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// The guard's output: the query is either accepted (possibly rewritten) or
/// rejected with a reason. Immutable, returned by value.
///
/// The downstream executor must consume `rewritten_sql` only — never the
/// original input — so that an injected row cap actually reaches execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationResult {
    /// The query passed every policy. `rewritten_sql` may differ from the
    /// input (an injected `LIMIT` clause); it is byte-identical when no
    /// rewrite was needed.
    Accepted {
        /// The validated SQL text to hand to the executor.
        rewritten_sql: String,
    },
    /// The query failed a policy; nothing may be executed.
    Rejected(Rejection),
}

impl ValidationResult {
    /// Whether the query was accepted.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// The rejection, if any.
    #[must_use]
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            Self::Accepted { .. } => None,
        }
    }

    /// The rejection kind, if rejected.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        self.rejection().map(|r| r.kind)
    }
}

/// Truncate text for safe inclusion in a rejection message.
///
/// Operates on character boundaries so multi-byte input never splits.
pub(crate) fn truncate_snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::TableAccessDenied.to_string(), "table_access_denied");
        assert_eq!(ErrorKind::ParseError.to_string(), "parse_error");
    }

    #[test]
    fn test_dialect_default_is_bigquery() {
        assert_eq!(Dialect::default(), Dialect::BigQuery);
    }

    #[test]
    fn test_rejection_display() {
        let rej = Rejection::new(ErrorKind::MultipleStatements, "two statements found");
        assert_eq!(rej.to_string(), "multiple_statements: two statements found");
    }

    #[test]
    fn test_result_accessors() {
        let ok = ValidationResult::Accepted {
            rewritten_sql: "SELECT 1".to_owned(),
        };
        assert!(ok.is_accepted());
        assert!(ok.rejection().is_none());
        assert!(ok.kind().is_none());

        let bad = ValidationResult::Rejected(Rejection::new(ErrorKind::ParseError, "nope"));
        assert!(!bad.is_accepted());
        assert_eq!(bad.kind(), Some(ErrorKind::ParseError));
    }

    #[test]
    fn test_result_serializes_with_status_tag() {
        let ok = ValidationResult::Accepted {
            rewritten_sql: "SELECT 1".to_owned(),
        };
        let json = serde_json::to_string(&ok).unwrap();
        assert!(json.contains("\"status\":\"accepted\""));
        assert!(json.contains("\"rewritten_sql\":\"SELECT 1\""));

        let bad = ValidationResult::Rejected(
            Rejection::new(ErrorKind::TableAccessDenied, "access denied to table(s): x")
                .with_detail(RejectionDetail::DisallowedTables {
                    disallowed: vec!["x".to_owned()],
                }),
        );
        let json = serde_json::to_string(&bad).unwrap();
        assert!(json.contains("\"status\":\"rejected\""));
        assert!(json.contains("\"kind\":\"table_access_denied\""));
        assert!(json.contains("\"disallowed\":[\"x\"]"));
    }

    #[test]
    fn test_truncate_snippet_short_text_unchanged() {
        assert_eq!(truncate_snippet("SELECT 1", 120), "SELECT 1");
    }

    #[test]
    fn test_truncate_snippet_long_text_capped() {
        let long = "x".repeat(500);
        let out = truncate_snippet(&long, 120);
        assert_eq!(out.chars().count(), 123);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn test_truncate_snippet_multibyte_safe() {
        let text = "é".repeat(200);
        let out = truncate_snippet(&text, 120);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 123);
    }
}
