use async_trait::async_trait;
use claimlens_core::{AppResult, CompanyId, MemberEmail, ScopedCredential};
use claimlens_domain::{AuditRecord, QuerySpec, QueryType};
use serde_json::Value;

/// Constrained request dispatched to the external analytics engine.
#[derive(Debug, Clone)]
pub struct EngineRequest {
    /// Query specification carrying the enforced member-scope predicate.
    pub spec: QuerySpec,
    /// Credential scoped to the member's company (or the fallback).
    pub credential: ScopedCredential,
}

/// Row set returned by the external analytics engine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngineResponse {
    /// Homogeneous result rows as JSON objects.
    pub rows: Vec<Value>,
}

impl EngineResponse {
    /// Returns the number of rows returned.
    #[must_use]
    pub fn row_count(&self) -> u64 {
        self.rows.len() as u64
    }
}

/// Port for the external analytics query engine.
///
/// Adapters normalize engine failures (timeout, auth, malformed query) to
/// `AppError::Backend`; the mediator never retries them.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Executes one constrained query and returns its rows.
    async fn execute(&self, request: EngineRequest) -> AppResult<EngineResponse>;
}

/// Filter criteria for audit trail retrieval.
///
/// All criteria are optional and conjunctive; records are returned in
/// insertion order.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Restrict to one member identity.
    pub member: Option<MemberEmail>,
    /// Restrict to one company.
    pub company: Option<CompanyId>,
    /// Restrict to one query category.
    pub query_type: Option<QueryType>,
    /// Restrict by success flag.
    pub success: Option<bool>,
    /// Restrict by violation flag.
    pub violation: Option<bool>,
    /// Maximum rows returned, unbounded when absent.
    pub limit: Option<usize>,
    /// Number of matching rows skipped for offset pagination.
    pub offset: usize,
}

impl AuditQuery {
    /// Returns true when the record satisfies every present criterion.
    #[must_use]
    pub fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(member) = &self.member
            && record.member() != member
        {
            return false;
        }
        if let Some(company) = &self.company
            && record.company() != Some(company)
        {
            return false;
        }
        if let Some(query_type) = self.query_type
            && record.query_type() != query_type
        {
            return false;
        }
        if let Some(success) = self.success
            && record.success() != success
        {
            return false;
        }
        if let Some(violation) = self.violation
            && record.violation() != violation
        {
            return false;
        }

        true
    }
}

/// Port for the append-only audit trail.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Appends one audit record, preserving insertion order under concurrent writers.
    async fn append(&self, record: AuditRecord) -> AppResult<()>;

    /// Lists records matching the criteria, in insertion order.
    async fn list(&self, query: AuditQuery) -> AppResult<Vec<AuditRecord>>;
}
