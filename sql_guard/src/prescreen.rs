//! Fast pre-parse screening of candidate SQL text.
//!
//! These checks run before the parser: length and emptiness bounds, then a
//! small set of regex screens over the text with string literals and comments
//! stripped out (so a semicolon inside `'a; b'` never causes a false reject).
//!
//! The screen deliberately does NOT do keyword-level DML detection — substring
//! matching is defeated by whitespace and encoding tricks, and the AST
//! statement-type policy covers that ground with no false positives. What
//! lives here is the structural screening the parser would otherwise paper
//! over: interior statement separators, block-comment smuggling, and
//! procedure-call probes that some dialects accept as function syntax.

use std::sync::OnceLock;

use regex::Regex;

use crate::config::GuardConfig;
use crate::types::{truncate_snippet, ErrorKind, Rejection, RejectionDetail, MAX_SNIPPET_LEN};

/// Procedure-call probes (EXEC(...), sp_/xp_ procedures) parse as ordinary
/// function calls in permissive dialects, so they are screened by name.
fn probe_patterns() -> &'static [Regex; 2] {
    static PROBES: OnceLock<[Regex; 2]> = OnceLock::new();
    PROBES.get_or_init(|| {
        [
            Regex::new(r"(?i)\b(?:exec|execute)\s*\(").expect("probe pattern is valid"),
            Regex::new(r"(?i)\b(?:sp|xp)_[a-z0-9_]+").expect("probe pattern is valid"),
        ]
    })
}

/// Patterns blanked out by [`strip_strings_and_comments`].
///
/// BigQuery accepts single- and double-quoted strings, backtick-quoted
/// identifiers, `--` and `#` line comments, and `/* */` block comments.
fn strip_patterns() -> &'static [Regex; 5] {
    static PATTERNS: OnceLock<[Regex; 5]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"'(?:[^'\\]|\\.)*'").expect("strip pattern is valid"),
            Regex::new(r#""(?:[^"\\]|\\.)*""#).expect("strip pattern is valid"),
            Regex::new("`[^`]*`").expect("strip pattern is valid"),
            Regex::new(r"--[^\n]*").expect("strip pattern is valid"),
            Regex::new(r"#[^\n]*").expect("strip pattern is valid"),
        ]
    })
}

/// Screen raw SQL text before parsing.
///
/// # Errors
///
/// Returns a [`Rejection`] when the text is empty, oversized, contains more
/// than one statement separator, uses block comments, or matches a
/// procedure-call probe pattern.
pub fn screen(sql: &str, config: &GuardConfig) -> Result<(), Rejection> {
    if sql.trim().is_empty() {
        return Err(Rejection::new(
            ErrorKind::ParseError,
            "empty or whitespace-only query",
        ));
    }

    if sql.len() > config.max_query_len {
        return Err(Rejection::new(
            ErrorKind::QueryTooLong,
            format!(
                "query is {} bytes, exceeding the {}-byte maximum",
                sql.len(),
                config.max_query_len
            ),
        )
        .with_detail(RejectionDetail::QueryLength {
            length: sql.len(),
            max_length: config.max_query_len,
        }));
    }

    let stripped = strip_strings_and_comments(sql);

    // Block comments are a classic smuggling vector ("/* */ DELETE ...") and
    // never appear in the SQL our synthesis stage emits. Checked after string
    // stripping so a literal containing "/*" stays legal.
    if stripped.contains("/*") || stripped.contains("*/") {
        return Err(Rejection::new(
            ErrorKind::DisallowedStatementType,
            "block comments are not permitted in candidate queries",
        ));
    }

    // A semicolon anywhere but the very end means stacked statements. The
    // parser re-checks this on the statement list; this screen catches it
    // before any parse work happens.
    let trimmed = stripped.trim_end();
    let interior = trimmed.strip_suffix(';').unwrap_or(trimmed);
    if interior.contains(';') {
        return Err(Rejection::new(
            ErrorKind::MultipleStatements,
            "multiple SQL statements detected; submit a single SELECT",
        ));
    }

    for re in probe_patterns() {
        if let Some(m) = re.find(&stripped) {
            return Err(Rejection::new(
                ErrorKind::DisallowedStatementType,
                format!(
                    "forbidden construct '{}' detected",
                    truncate_snippet(m.as_str(), MAX_SNIPPET_LEN)
                ),
            ));
        }
    }

    Ok(())
}

/// Replace string literals, quoted identifiers, and comments with blanks,
/// leaving everything else intact.
fn strip_strings_and_comments(sql: &str) -> String {
    let mut out = sql.to_owned();
    for re in strip_patterns() {
        out = re.replace_all(&out, "").into_owned();
    }
    out
}
