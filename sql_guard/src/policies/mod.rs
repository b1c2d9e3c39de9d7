//! Policy rule trait definition and policy registry.
//!
//! Every safety policy implements the [`PolicyRule`] trait. Policies are
//! stateless pure functions over the parsed statement — all context is passed
//! via parameters, so a guard is safe to share across threads.
//!
//! The registry fixes the evaluation order: statement type first (the
//! cheapest, most dangerous class of violation), then table access, then
//! limit injection — a rewrite is never computed for a statement that is
//! going to be rejected anyway. No policy can be skipped or bypassed by a
//! flag on the request path.

pub mod limit_guard;
pub mod statement_type;
pub mod table_access;

use sqlparser::ast::Statement;

use crate::config::GuardConfig;
use crate::types::Rejection;

/// Every safety policy implements this trait.
///
/// Policies are stateless and must be `Send + Sync` so a guard can be shared
/// across callers without coordination.
pub trait PolicyRule: Send + Sync {
    /// Unique name for this policy (used in log output).
    fn name(&self) -> &'static str;

    /// Apply the policy to the parsed statement.
    ///
    /// Returns `Ok(true)` when the policy rewrote the statement (currently
    /// only limit injection does), `Ok(false)` when it passed untouched.
    ///
    /// # Errors
    ///
    /// Returns a [`Rejection`] when the statement violates the policy.
    fn apply(&self, statement: &mut Statement, config: &GuardConfig) -> Result<bool, Rejection>;
}

/// Build the policy registry in fixed evaluation order.
#[must_use]
pub fn build_policy_registry() -> Vec<Box<dyn PolicyRule>> {
    vec![
        Box::new(statement_type::StatementTypePolicy),
        Box::new(table_access::TableAccessPolicy),
        Box::new(limit_guard::LimitGuardPolicy),
    ]
}
