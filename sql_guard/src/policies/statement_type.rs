//! Statement-type policy: a single read-only `SELECT`, nothing else.
//!
//! Checking only the top-level node is insufficient — CTE bodies, derived
//! tables, `IN (...)` subqueries, and set-operation arms can all smuggle
//! mutating statements in dialects that permit them. This policy walks the
//! entire parsed tree with sqlparser's visitor: every `Statement` node
//! reachable anywhere must be a query, and the root query body must bottom
//! out in `SELECT` (possibly through `WITH` and `UNION`/`INTERSECT`/`EXCEPT`).
//!
//! There is no false-negative tolerance here: anything the walk does not
//! positively recognize as a read is rejected, never default-accepted.

use std::ops::ControlFlow;

use sqlparser::ast::{Query, SetExpr, Statement, Visit, Visitor};

use crate::config::GuardConfig;
use crate::policies::PolicyRule;
use crate::types::{truncate_snippet, ErrorKind, Rejection, MAX_SNIPPET_LEN};

/// Statement-type policy: rejects DML, DDL, DCL, and anything else that is
/// not a plain query, anywhere in the tree.
pub struct StatementTypePolicy;

impl PolicyRule for StatementTypePolicy {
    fn name(&self) -> &'static str {
        "statement_type"
    }

    fn apply(&self, statement: &mut Statement, _config: &GuardConfig) -> Result<bool, Rejection> {
        // Root must be a query whose body bottoms out in SELECT.
        match statement {
            Statement::Query(query) => {
                if !body_is_select(&query.body) {
                    return Err(Rejection::new(
                        ErrorKind::DisallowedStatementType,
                        "query body is not a SELECT; only read-only SELECT queries are allowed",
                    ));
                }
            }
            other => return Err(reject_statement(other)),
        }

        // Walk every statement node reachable in the tree. Nested writes
        // (DELETE in a CTE, INSERT in a UNION arm) appear as non-query
        // statements and break the walk.
        let mut scan = ReadOnlyScan;
        if let ControlFlow::Break(rejection) = statement.visit(&mut scan) {
            return Err(rejection);
        }

        Ok(false)
    }
}

/// Visitor that breaks on the first non-query statement node, `SELECT INTO`
/// target, or locking clause.
struct ReadOnlyScan;

impl Visitor for ReadOnlyScan {
    type Break = Rejection;

    fn pre_visit_statement(&mut self, statement: &Statement) -> ControlFlow<Rejection> {
        if matches!(statement, Statement::Query(_)) {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(reject_statement(statement))
        }
    }

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<Rejection> {
        // FOR UPDATE / FOR SHARE take row locks; nothing read-only needs one.
        if !query.locks.is_empty() {
            return ControlFlow::Break(Rejection::new(
                ErrorKind::DisallowedStatementType,
                "locking clauses are not permitted; only read-only SELECT queries are allowed",
            ));
        }
        if let Some(rejection) = find_select_into(&query.body) {
            return ControlFlow::Break(rejection);
        }
        ControlFlow::Continue(())
    }
}

/// A `SELECT ... INTO target` parses as a query but creates a table; it must
/// be refused wherever it appears. Nested `SetExpr::Query` bodies are covered
/// by the visitor calling back for the inner query node.
fn find_select_into(body: &SetExpr) -> Option<Rejection> {
    match body {
        SetExpr::Select(select) if select.into.is_some() => Some(Rejection::new(
            ErrorKind::DisallowedStatementType,
            "SELECT INTO writes to a table and is not permitted; only read-only SELECT queries are allowed",
        )),
        SetExpr::SetOperation { left, right, .. } => {
            find_select_into(left).or_else(|| find_select_into(right))
        }
        _ => None,
    }
}

/// Whether a query body bottoms out in SELECT through nesting and set ops.
///
/// `VALUES` lists and bare table bodies are not SELECTs and fail here; a
/// nested write (`SetExpr::Insert` and friends) also fails, though the
/// visitor walk reports those with a keyword-specific message first.
fn body_is_select(body: &SetExpr) -> bool {
    match body {
        SetExpr::Select(_) => true,
        SetExpr::Query(query) => body_is_select(&query.body),
        SetExpr::SetOperation { left, right, .. } => {
            body_is_select(left) && body_is_select(right)
        }
        _ => false,
    }
}

/// Build a rejection naming the offending statement keyword.
fn reject_statement(statement: &Statement) -> Rejection {
    Rejection::new(
        ErrorKind::DisallowedStatementType,
        format!(
            "statement type '{}' is not permitted; only read-only SELECT queries are allowed",
            leading_keyword(statement)
        ),
    )
}

/// The leading keyword of a statement's canonical rendering, e.g. `DROP`.
fn leading_keyword(statement: &Statement) -> String {
    let rendered = statement.to_string();
    let first = rendered.split_whitespace().next().unwrap_or("UNKNOWN");
    truncate_snippet(&first.to_uppercase(), MAX_SNIPPET_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_single;

    fn check(sql: &str) -> Result<bool, Rejection> {
        let config = GuardConfig::default();
        let mut stmt = parse_single(sql, &config).expect("fixture must parse");
        StatementTypePolicy.apply(&mut stmt, &config)
    }

    fn kind_of(sql: &str) -> ErrorKind {
        check(sql).unwrap_err().kind
    }

    // ── Happy path ─────────────────────────────────────────────────────────

    #[test]
    fn test_plain_select_passes() {
        assert!(check("SELECT * FROM orders").is_ok());
    }

    #[test]
    fn test_cte_select_passes() {
        assert!(check(
            "WITH recent AS (SELECT * FROM orders WHERE status = 'Complete') \
             SELECT COUNT(*) FROM recent"
        )
        .is_ok());
    }

    #[test]
    fn test_union_of_selects_passes() {
        assert!(check("SELECT id FROM orders UNION ALL SELECT id FROM users").is_ok());
    }

    #[test]
    fn test_parenthesized_select_passes() {
        assert!(check("(SELECT 1)").is_ok());
    }

    #[test]
    fn test_scalar_subquery_passes() {
        assert!(check(
            "SELECT id, (SELECT MAX(created_at) FROM orders) AS latest FROM users"
        )
        .is_ok());
    }

    // ── Top-level writes ───────────────────────────────────────────────────

    #[test]
    fn test_insert_rejected() {
        let err = check("INSERT INTO orders VALUES (1)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::DisallowedStatementType);
        assert!(err.message.contains("INSERT"));
    }

    #[test]
    fn test_update_rejected() {
        let err = check("UPDATE orders SET status = 'x'").unwrap_err();
        assert!(err.message.contains("UPDATE"));
    }

    #[test]
    fn test_delete_rejected() {
        let err = check("DELETE FROM orders WHERE id = 1").unwrap_err();
        assert!(err.message.contains("DELETE"));
    }

    #[test]
    fn test_merge_rejected() {
        let err = check(
            "MERGE INTO orders o USING staged s ON o.id = s.id \
             WHEN MATCHED THEN UPDATE SET status = s.status",
        )
        .unwrap_err();
        assert!(err.message.contains("MERGE"));
    }

    #[test]
    fn test_truncate_rejected() {
        assert_eq!(kind_of("TRUNCATE TABLE orders"), ErrorKind::DisallowedStatementType);
    }

    #[test]
    fn test_create_rejected() {
        let err = check("CREATE TABLE staging (id INT64)").unwrap_err();
        assert!(err.message.contains("CREATE"));
    }

    #[test]
    fn test_drop_rejected() {
        let err = check("DROP TABLE users").unwrap_err();
        assert!(err.message.contains("DROP"));
    }

    #[test]
    fn test_alter_rejected() {
        let err = check("ALTER TABLE orders ADD COLUMN note STRING").unwrap_err();
        assert!(err.message.contains("ALTER"));
    }

    #[test]
    fn test_explain_rejected() {
        // EXPLAIN is read-only but is not a SELECT, and the execution stage
        // has no business receiving one from the synthesis stage.
        assert_eq!(
            kind_of("EXPLAIN SELECT * FROM orders"),
            ErrorKind::DisallowedStatementType
        );
    }

    // ── Whitespace / casing evasion ────────────────────────────────────────

    #[test]
    fn test_whitespace_evasion_rejected() {
        assert_eq!(
            kind_of("DROP\t\n  TABLE\nusers"),
            ErrorKind::DisallowedStatementType
        );
    }

    #[test]
    fn test_mixed_case_rejected() {
        assert_eq!(kind_of("dRoP tAbLe users"), ErrorKind::DisallowedStatementType);
    }

    // ── Query-shaped writes ────────────────────────────────────────────────

    #[test]
    fn test_select_into_rejected() {
        // Parses as a Query, but the INTO target makes it a table write.
        let err = check("SELECT * INTO admin_backup FROM orders").unwrap_err();
        assert_eq!(err.kind, ErrorKind::DisallowedStatementType);
        assert!(err.message.contains("INTO"));
    }

    #[test]
    fn test_select_into_in_derived_table_rejected() {
        assert_eq!(
            kind_of("SELECT * FROM (SELECT * INTO stash FROM orders) AS t"),
            ErrorKind::DisallowedStatementType
        );
    }

    #[test]
    fn test_select_into_in_union_arm_rejected() {
        assert_eq!(
            kind_of("SELECT id FROM orders UNION ALL SELECT id INTO stash FROM users"),
            ErrorKind::DisallowedStatementType
        );
    }

    #[test]
    fn test_for_update_rejected() {
        assert_eq!(
            kind_of("SELECT * FROM orders FOR UPDATE"),
            ErrorKind::DisallowedStatementType
        );
    }

    // ── Nested writes ──────────────────────────────────────────────────────

    #[test]
    fn test_values_body_rejected() {
        let err = check("VALUES (1, 2)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::DisallowedStatementType);
    }

    #[test]
    fn test_keyword_inside_string_literal_passes() {
        // "DROP TABLE" inside a string literal is data, not a statement.
        assert!(check("SELECT 'DROP TABLE users' AS note FROM orders").is_ok());
    }
}
