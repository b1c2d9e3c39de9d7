//! Lakewise SQL Guard — the safety-policy engine of the Lakewise analytics
//! agent.
//!
//! The agent plans an analysis from a business question, synthesizes BigQuery
//! SQL with an LLM, and executes it against a metered, multi-tenant
//! warehouse. This crate is the mandatory gate between synthesis and
//! execution: it parses a candidate statement, enforces the security policy
//! (single read-only SELECT, table whitelist, no metadata reconnaissance),
//! injects a row cap into unbounded exploratory queries, and returns either
//! the validated SQL text or an actionable rejection.
//!
//! ```
//! use lakewise_sql_guard::{validate, ValidationResult};
//!
//! let result = validate(
//!     "SELECT * FROM orders",
//!     ["orders", "order_items", "products", "users"],
//!     1000,
//! );
//! assert_eq!(
//!     result,
//!     ValidationResult::Accepted {
//!         rewritten_sql: "SELECT * FROM orders LIMIT 1000".to_owned()
//!     }
//! );
//! ```
//!
//! Validation is a pure, synchronous function of the SQL text and the
//! [`GuardConfig`]: no I/O, no shared mutable state, safe for concurrent
//! callers, and idempotent — which is what makes the optional
//! [`cache::ValidationCache`] correct.

pub mod cache;
pub mod config;
pub mod engine;
pub mod parser;
pub mod policies;
pub mod prescreen;
pub mod reporter;
pub mod types;

pub use config::{ConfigError, GuardConfig};
pub use engine::{validate, SqlGuard};
pub use types::{Dialect, ErrorKind, Rejection, RejectionDetail, ValidationResult};
