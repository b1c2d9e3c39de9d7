//! Parser adapter: candidate SQL text → a single parsed statement.
//!
//! Wraps sqlparser configured for the target warehouse dialect. The adapter
//! is a pure transformation: text in, AST out, no side effects. Parse
//! failures are permanent — the same text re-submitted unchanged fails
//! identically — so the rejection carries the parser diagnostic (truncated)
//! for display, never as a retry signal.

use sqlparser::ast::Statement;
use sqlparser::parser::Parser;

use crate::config::GuardConfig;
use crate::types::{truncate_snippet, ErrorKind, Rejection, RejectionDetail, MAX_SNIPPET_LEN};

/// Parse candidate text into exactly one statement.
///
/// Comment-hidden separators (`/* x */ DELETE`) surface here as multiple
/// parsed statements; they are never detected by substring matching.
///
/// # Errors
///
/// - [`ErrorKind::ParseError`] when the text is not valid SQL in the
///   configured dialect, or parses to nothing (e.g. a lone `;`).
/// - [`ErrorKind::MultipleStatements`] when more than one statement parses.
pub fn parse_single(sql: &str, config: &GuardConfig) -> Result<Statement, Rejection> {
    let dialect = config.dialect.parser_dialect();

    let mut statements = Parser::parse_sql(&*dialect, sql).map_err(|e| {
        Rejection::new(
            ErrorKind::ParseError,
            format!(
                "SQL parse error: {}",
                truncate_snippet(&e.to_string(), MAX_SNIPPET_LEN)
            ),
        )
    })?;

    match statements.len() {
        0 => Err(Rejection::new(
            ErrorKind::ParseError,
            "input contains no SQL statement",
        )),
        1 => Ok(statements.remove(0)),
        count => Err(Rejection::new(
            ErrorKind::MultipleStatements,
            format!("expected a single statement, found {count}"),
        )
        .with_detail(RejectionDetail::StatementCount { count })),
    }
}
