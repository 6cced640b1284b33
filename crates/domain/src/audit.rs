use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use claimlens_core::{AppError, CompanyId, MemberEmail};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::company::CredentialSource;
use crate::enforcer::validate_scope;
use crate::query::FilterPredicate;

/// Category of the surface a mediated query originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    /// Pre-built member dashboard query.
    Dashboard,
    /// Interactive query-builder query.
    QueryBuilder,
    /// Natural-language question translated into a query.
    NaturalLanguage,
    /// Agent tool call issued on the member's behalf.
    AgentTool,
}

impl QueryType {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::QueryBuilder => "query_builder",
            Self::NaturalLanguage => "natural_language",
            Self::AgentTool => "agent_tool",
        }
    }
}

impl FromStr for QueryType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "dashboard" => Ok(Self::Dashboard),
            "query_builder" => Ok(Self::QueryBuilder),
            "natural_language" => Ok(Self::NaturalLanguage),
            "agent_tool" => Ok(Self::AgentTool),
            _ => Err(AppError::Validation(format!(
                "unknown query type '{value}'"
            ))),
        }
    }
}

/// Immutable audit entry for one mediated query attempt.
///
/// The violation flag is computed inside the constructors by re-running the
/// scope validation over the filter set actually dispatched; upstream
/// components cannot supply it, so an enforcement bug still surfaces in the
/// trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    record_id: Uuid,
    recorded_at: DateTime<Utc>,
    member: MemberEmail,
    company: Option<CompanyId>,
    query_type: QueryType,
    dispatched_filters: Vec<FilterPredicate>,
    row_count: Option<u64>,
    success: bool,
    error: Option<String>,
    latency_ms: u64,
    used_fallback_credential: bool,
    violation: bool,
}

impl AuditRecord {
    /// Records an attempt that reached the dispatch boundary.
    ///
    /// Covers both engine successes and engine failures; the filters are the
    /// ones actually sent, and the violation flag is recomputed from them.
    #[must_use]
    pub fn dispatched(
        member: MemberEmail,
        company: CompanyId,
        query_type: QueryType,
        dispatched_filters: Vec<FilterPredicate>,
        row_count: Option<u64>,
        error: Option<String>,
        latency: Duration,
        credential_source: CredentialSource,
    ) -> Self {
        let violation = validate_scope(&dispatched_filters, &member).is_err();
        let success = error.is_none();

        Self {
            record_id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            member,
            company: Some(company),
            query_type,
            dispatched_filters,
            row_count,
            success,
            error,
            latency_ms: duration_millis(latency),
            used_fallback_credential: credential_source.is_fallback(),
            violation,
        }
    }

    /// Records an attempt rejected before any dispatch took place.
    ///
    /// No filter set was sent, so the violation flag is set only when the
    /// rejection cause was a filter-validation failure.
    #[must_use]
    pub fn rejected(
        member: MemberEmail,
        company: Option<CompanyId>,
        query_type: QueryType,
        cause: &AppError,
        latency: Duration,
    ) -> Self {
        Self {
            record_id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            member,
            company,
            query_type,
            dispatched_filters: Vec::new(),
            row_count: None,
            success: false,
            error: Some(cause.to_string()),
            latency_ms: duration_millis(latency),
            used_fallback_credential: false,
            violation: matches!(cause, AppError::FilterValidationFailed(_)),
        }
    }

    /// Returns the stable record identifier.
    #[must_use]
    pub fn record_id(&self) -> Uuid {
        self.record_id
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// Returns the member the query was issued on behalf of.
    #[must_use]
    pub fn member(&self) -> &MemberEmail {
        &self.member
    }

    /// Returns the resolved company, absent when tenant resolution failed.
    #[must_use]
    pub fn company(&self) -> Option<&CompanyId> {
        self.company.as_ref()
    }

    /// Returns the query category.
    #[must_use]
    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    /// Returns the filter predicates present at dispatch time.
    #[must_use]
    pub fn dispatched_filters(&self) -> &[FilterPredicate] {
        &self.dispatched_filters
    }

    /// Returns the number of rows returned, absent on failure.
    #[must_use]
    pub fn row_count(&self) -> Option<u64> {
        self.row_count
    }

    /// Returns true when the attempt completed successfully.
    #[must_use]
    pub fn success(&self) -> bool {
        self.success
    }

    /// Returns the operator-facing failure detail, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the end-to-end mediation latency in milliseconds.
    #[must_use]
    pub fn latency_ms(&self) -> u64 {
        self.latency_ms
    }

    /// Returns true when the fallback credential authorized the query.
    #[must_use]
    pub fn used_fallback_credential(&self) -> bool {
        self.used_fallback_credential
    }

    /// Returns true when the dispatched filter set failed the scope checks.
    #[must_use]
    pub fn violation(&self) -> bool {
        self.violation
    }
}

fn duration_millis(latency: Duration) -> u64 {
    u64::try_from(latency.as_millis()).unwrap_or(u64::MAX)
}
