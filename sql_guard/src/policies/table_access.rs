//! Table-access policy: every referenced table must be on the whitelist.
//!
//! The visitor collects every relation referenced anywhere in the tree —
//! FROM clauses, JOINs, derived tables, CTE bodies, set-operation arms,
//! scalar subqueries. CTE names are virtual tables, not real ones, but a CTE
//! only shadows references in queries where it is actually in scope: a CTE's
//! own body (non-recursive) and earlier siblings still resolve the name to
//! the real table, so `WITH x AS (SELECT * FROM x) ...` cannot launder a
//! forbidden `x`. Resolution operates on the base table name, never the
//! alias, so an alias cannot launder a forbidden table either, and only
//! unqualified references can resolve to a CTE.
//!
//! System and metadata namespaces (`INFORMATION_SCHEMA`, `__TABLES__`,
//! `pg_catalog`, ...) are reconnaissance vectors and are implicitly denied
//! regardless of the whitelist's literal content, unless the exact qualified
//! name was whitelisted on purpose.

use std::collections::BTreeSet;
use std::ops::ControlFlow;

use sqlparser::ast::{ObjectName, Query, Statement, Visit, Visitor};

use crate::config::GuardConfig;
use crate::policies::PolicyRule;
use crate::types::{ErrorKind, Rejection, RejectionDetail};

/// Schema/catalog prefixes that are denied even when not textually excluded.
const SYSTEM_NAMESPACES: &[&str] = &[
    "information_schema",
    "pg_catalog",
    "performance_schema",
    "sys",
    "mysql",
];

/// Table-access policy: whitelist enforcement over every relation in the tree.
pub struct TableAccessPolicy;

impl PolicyRule for TableAccessPolicy {
    fn name(&self) -> &'static str {
        "table_access"
    }

    fn apply(&self, statement: &mut Statement, config: &GuardConfig) -> Result<bool, Rejection> {
        let mut scan = RelationScan::default();
        // Break type is Infallible-like unit; the scan itself never fails.
        let _ = statement.visit(&mut scan);

        let mut disallowed = BTreeSet::new();
        for reference in &scan.relations {
            if !reference.allowed(config) {
                disallowed.insert(reference.qualified.clone());
            }
        }

        if disallowed.is_empty() {
            return Ok(false);
        }

        let disallowed: Vec<String> = disallowed.into_iter().collect();
        Err(Rejection::new(
            ErrorKind::TableAccessDenied,
            format!("access denied to table(s): {}", disallowed.join(", ")),
        )
        .with_detail(RejectionDetail::DisallowedTables { disallowed }))
    }
}

/// A single table reference found in the tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct TableReference {
    /// Fully-qualified rendering as written, e.g. `analytics.orders`.
    qualified: String,
}

impl TableReference {
    fn from_object_name(name: &ObjectName) -> Self {
        let qualified = name
            .0
            .iter()
            .map(|ident| ident.value.clone())
            .collect::<Vec<_>>()
            .join(".");
        Self { qualified }
    }

    /// The final path component — the table itself, without dataset/project.
    fn base_name(&self) -> &str {
        self.qualified.rsplit('.').next().unwrap_or(&self.qualified)
    }

    /// Whether any path component lands in a system/metadata namespace.
    fn is_system_namespace(&self) -> bool {
        self.qualified.split('.').any(|part| {
            SYSTEM_NAMESPACES
                .iter()
                .any(|ns| part.eq_ignore_ascii_case(ns))
        }) || self.base_name().starts_with("__")
    }

    /// Whitelist resolution: system namespaces pass only on an exact
    /// qualified-name match; ordinary tables pass on the qualified name or
    /// the base name.
    fn allowed(&self, config: &GuardConfig) -> bool {
        if self.is_system_namespace() {
            return config.table_allowed(&self.qualified);
        }
        config.table_allowed(&self.qualified) || config.table_allowed(self.base_name())
    }
}

/// A CTE body that has not been walked yet, keyed by the address of its
/// `Query` node so the visitor can recognize it on entry and exit.
struct PendingCte {
    body_addr: usize,
    name: String,
    recursive: bool,
}

/// Scope frame for one `Query` node. `names` holds the CTE names that have
/// come into scope so far: with `WITH a AS (...), b AS (...)`, `a` is added
/// only once its body has been fully walked, so `a`'s own body and any
/// earlier sibling still see the real table behind the name.
struct ScopeFrame {
    query_addr: usize,
    names: BTreeSet<String>,
    pending: Vec<PendingCte>,
}

/// Visitor collecting relations over the whole tree, resolving CTE names
/// with lexical scoping so a shadowing CTE never hides its own source table.
#[derive(Default)]
struct RelationScan {
    relations: BTreeSet<TableReference>,
    frames: Vec<ScopeFrame>,
}

impl RelationScan {
    fn cte_in_scope(&self, name: &str) -> bool {
        self.frames.iter().any(|frame| frame.names.contains(name))
    }
}

impl Visitor for RelationScan {
    type Break = ();

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<()> {
        let query_addr = query as *const Query as usize;
        let mut names = BTreeSet::new();
        // A recursive CTE may reference itself inside its own body.
        if let Some(frame) = self.frames.last() {
            if let Some(plan) = frame
                .pending
                .iter()
                .find(|plan| plan.body_addr == query_addr)
            {
                if plan.recursive {
                    names.insert(plan.name.clone());
                }
            }
        }
        let pending = match &query.with {
            Some(with) => with
                .cte_tables
                .iter()
                .map(|cte| PendingCte {
                    body_addr: &*cte.query as *const Query as usize,
                    name: cte.alias.name.value.clone(),
                    recursive: with.recursive,
                })
                .collect(),
            None => Vec::new(),
        };
        self.frames.push(ScopeFrame {
            query_addr,
            names,
            pending,
        });
        ControlFlow::Continue(())
    }

    fn post_visit_query(&mut self, query: &Query) -> ControlFlow<()> {
        let query_addr = query as *const Query as usize;
        if self.frames.last().map(|frame| frame.query_addr) == Some(query_addr) {
            self.frames.pop();
        }
        // Leaving a CTE body brings its name into scope for later siblings
        // and for the enclosing query's own body.
        if let Some(frame) = self.frames.last_mut() {
            if let Some(pos) = frame
                .pending
                .iter()
                .position(|plan| plan.body_addr == query_addr)
            {
                let plan = frame.pending.remove(pos);
                frame.names.insert(plan.name);
            }
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_relation(&mut self, relation: &ObjectName) -> ControlFlow<()> {
        let reference = TableReference::from_object_name(relation);
        // Qualified names always address a real table; only a bare name can
        // resolve to a CTE.
        if !reference.qualified.contains('.') && self.cte_in_scope(&reference.qualified) {
            return ControlFlow::Continue(());
        }
        self.relations.insert(reference);
        ControlFlow::Continue(())
    }
}
