//! Domain entities and invariants for mediated analytic queries.

#![forbid(unsafe_code)]

mod audit;
mod company;
mod enforcer;
mod query;

pub use audit::{AuditRecord, QueryType};
pub use company::{Company, CredentialSource};
pub use enforcer::{
    Enforcement, MEMBER_EMAIL_DIMENSION, ScopeViolation, enforce, validate_scope,
};
pub use query::{
    Dimension, FilterOperator, FilterPredicate, Metric, OrderBy, OrderTarget, QuerySpec, TimeGrain,
};
