//! Aggregation-aware limit injection.
//!
//! Exploratory (non-aggregated) queries scan unbounded row counts against a
//! metered warehouse; aggregated queries already bound their own output
//! cardinality. The classification:
//!
//! - `GROUP BY`, `DISTINCT`, or `HAVING` present → aggregating
//! - projection consisting solely of aggregate function calls → aggregating
//! - window functions (`... OVER (...)`) do NOT count — they do not reduce
//!   row cardinality, so a window-only query still gets the row cap
//! - set operations are aggregating only when every arm is
//!
//! Non-aggregating queries with no explicit `LIMIT` get `LIMIT max_rows`
//! injected and are re-serialized from the AST. An explicit `LIMIT` is
//! treated as intentional and preserved, even above the cap, unless
//! `clamp_excess_limit` is set — then an over-cap literal is clamped down.

use sqlparser::ast::{
    Expr, GroupByExpr, Query, Select, SelectItem, SetExpr, Statement, Value,
};

use crate::config::GuardConfig;
use crate::policies::PolicyRule;
use crate::types::Rejection;

/// Aggregate function names recognized for the pure-aggregate-projection rule.
const AGGREGATE_FUNCTIONS: &[&str] = &[
    "count",
    "sum",
    "avg",
    "min",
    "max",
    "stddev",
    "stddev_pop",
    "stddev_samp",
    "variance",
    "var_pop",
    "var_samp",
    "array_agg",
    "string_agg",
    "approx_count_distinct",
    "approx_quantiles",
];

/// Limit-injection policy: bounds result-set size for exploratory queries.
pub struct LimitGuardPolicy;

impl PolicyRule for LimitGuardPolicy {
    fn name(&self) -> &'static str {
        "limit_guard"
    }

    fn apply(&self, statement: &mut Statement, config: &GuardConfig) -> Result<bool, Rejection> {
        let Statement::Query(query) = statement else {
            // Statement-type policy runs first; nothing to bound otherwise.
            return Ok(false);
        };

        if query.limit.is_some() {
            let requested = query.limit.as_ref().and_then(literal_limit);
            if config.clamp_excess_limit {
                if let Some(requested) = requested {
                    if requested > config.max_rows {
                        log::debug!(
                            "clamping explicit LIMIT {} to cap {}",
                            requested,
                            config.max_rows
                        );
                        query.limit = Some(limit_expr(config.max_rows));
                        return Ok(true);
                    }
                }
            }
            // Explicit LIMIT is intentional, leave it as written.
            return Ok(false);
        }

        if is_aggregating(query) {
            return Ok(false);
        }

        log::debug!("injecting LIMIT {} into non-aggregating query", config.max_rows);
        query.limit = Some(limit_expr(config.max_rows));
        Ok(true)
    }
}

/// Build a numeric `LIMIT` expression.
fn limit_expr(max_rows: u64) -> Expr {
    Expr::Value(Value::Number(max_rows.to_string(), false))
}

/// Extract a plain numeric literal from a `LIMIT` expression, if it is one.
fn literal_limit(expr: &Expr) -> Option<u64> {
    match expr {
        Expr::Value(Value::Number(text, _)) => text.parse().ok(),
        _ => None,
    }
}

/// Whether the query's output cardinality is bounded by its own shape.
fn is_aggregating(query: &Query) -> bool {
    body_is_aggregating(&query.body)
}

fn body_is_aggregating(body: &SetExpr) -> bool {
    match body {
        SetExpr::Select(select) => select_is_aggregating(select),
        SetExpr::Query(query) => is_aggregating(query),
        SetExpr::SetOperation { left, right, .. } => {
            body_is_aggregating(left) && body_is_aggregating(right)
        }
        _ => false,
    }
}

fn select_is_aggregating(select: &Select) -> bool {
    if select.distinct.is_some() || select.having.is_some() {
        return true;
    }
    match &select.group_by {
        GroupByExpr::Expressions(exprs, _) if !exprs.is_empty() => return true,
        GroupByExpr::All(_) => return true,
        GroupByExpr::Expressions(_, _) => {}
    }
    // Pure-aggregate projection: every item is an aggregate call. A window
    // function (OVER clause) emits one value per row and does not qualify.
    !select.projection.is_empty()
        && select.projection.iter().all(|item| match item {
            SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
                is_aggregate_call(expr)
            }
            SelectItem::QualifiedWildcard(..) | SelectItem::Wildcard(..) => false,
        })
}

fn is_aggregate_call(expr: &Expr) -> bool {
    match expr {
        Expr::Function(func) if func.over.is_none() => {
            let name = func
                .name
                .0
                .last()
                .map(|ident| ident.value.to_ascii_lowercase())
                .unwrap_or_default();
            AGGREGATE_FUNCTIONS.contains(&name.as_str())
        }
        _ => false,
    }
}
