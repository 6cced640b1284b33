use std::collections::BTreeMap;
use std::str::FromStr;

use claimlens_application::{AuditStats, MediatedQueryOutcome};
use claimlens_core::{AppError, AppResult};
use claimlens_domain::{
    AuditRecord, Company, Dimension, FilterOperator, FilterPredicate, Metric, OrderBy,
    OrderTarget, QuerySpec, TimeGrain,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One requested grouping dimension.
#[derive(Debug, Deserialize)]
pub struct GroupByRequest {
    pub name: String,
    #[serde(default)]
    pub grain: Option<String>,
}

/// One caller-supplied filter predicate.
#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    pub dimension: String,
    pub operator: String,
    pub value: String,
}

/// One ordering clause; exactly one of `metric` or `dimension` is allowed.
#[derive(Debug, Deserialize)]
pub struct OrderByRequest {
    #[serde(default)]
    pub metric: Option<String>,
    #[serde(default)]
    pub dimension: Option<String>,
    #[serde(default)]
    pub descending: bool,
}

/// Caller-supplied logical query.
#[derive(Debug, Deserialize)]
pub struct QuerySpecRequest {
    pub metrics: Vec<String>,
    #[serde(default)]
    pub group_by: Vec<GroupByRequest>,
    #[serde(default)]
    pub filters: Vec<FilterRequest>,
    #[serde(default)]
    pub order_by: Vec<OrderByRequest>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl QuerySpecRequest {
    /// Converts the transport payload into a validated query specification.
    pub fn into_spec(self) -> AppResult<QuerySpec> {
        let metrics = self
            .metrics
            .into_iter()
            .map(Metric::new)
            .collect::<AppResult<Vec<_>>>()?;

        let group_by = self
            .group_by
            .into_iter()
            .map(|dimension| {
                let grain = dimension
                    .grain
                    .as_deref()
                    .map(TimeGrain::from_str)
                    .transpose()?;
                Dimension::new(dimension.name, grain)
            })
            .collect::<AppResult<Vec<_>>>()?;

        let filters = self
            .filters
            .into_iter()
            .map(|filter| {
                let operator = FilterOperator::from_str(&filter.operator)?;
                FilterPredicate::new(filter.dimension, operator, filter.value)
            })
            .collect::<AppResult<Vec<_>>>()?;

        let order_by = self
            .order_by
            .into_iter()
            .map(|order| {
                let target = match (order.metric, order.dimension) {
                    (Some(metric), None) => OrderTarget::Metric(metric),
                    (None, Some(dimension)) => OrderTarget::Dimension(dimension),
                    _ => {
                        return Err(AppError::Validation(
                            "ordering requires exactly one of 'metric' or 'dimension'".to_owned(),
                        ));
                    }
                };
                Ok(OrderBy::new(target, order.descending))
            })
            .collect::<AppResult<Vec<_>>>()?;

        QuerySpec::new(metrics, group_by, filters, order_by, self.limit)
    }
}

/// Body of the mediated query entry point.
#[derive(Debug, Deserialize)]
pub struct MediateQueryRequest {
    pub query_type: String,
    pub query: QuerySpecRequest,
}

/// Result rows of a mediated query.
#[derive(Debug, Serialize)]
pub struct MediatedQueryResponse {
    pub rows: Vec<Value>,
    pub row_count: u64,
    pub latency_ms: u64,
}

impl From<MediatedQueryOutcome> for MediatedQueryResponse {
    fn from(value: MediatedQueryOutcome) -> Self {
        Self {
            rows: value.rows,
            row_count: value.row_count,
            latency_ms: u64::try_from(value.latency.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// One filter predicate as dispatched.
#[derive(Debug, Serialize)]
pub struct FilterResponse {
    pub dimension: String,
    pub operator: &'static str,
    pub value: String,
}

impl From<&FilterPredicate> for FilterResponse {
    fn from(value: &FilterPredicate) -> Self {
        Self {
            dimension: value.dimension().to_owned(),
            operator: value.operator().as_str(),
            value: value.value().to_owned(),
        }
    }
}

/// One audit trail entry.
#[derive(Debug, Serialize)]
pub struct AuditRecordResponse {
    pub record_id: String,
    pub recorded_at: String,
    pub member: String,
    pub company: Option<String>,
    pub query_type: &'static str,
    pub dispatched_filters: Vec<FilterResponse>,
    pub row_count: Option<u64>,
    pub success: bool,
    pub error: Option<String>,
    pub latency_ms: u64,
    pub used_fallback_credential: bool,
    pub violation: bool,
}

impl From<AuditRecord> for AuditRecordResponse {
    fn from(value: AuditRecord) -> Self {
        Self {
            record_id: value.record_id().to_string(),
            recorded_at: value.recorded_at().to_rfc3339(),
            member: value.member().as_str().to_owned(),
            company: value.company().map(|company| company.as_str().to_owned()),
            query_type: value.query_type().as_str(),
            dispatched_filters: value.dispatched_filters().iter().map(Into::into).collect(),
            row_count: value.row_count(),
            success: value.success(),
            error: value.error().map(ToOwned::to_owned),
            latency_ms: value.latency_ms(),
            used_fallback_credential: value.used_fallback_credential(),
            violation: value.violation(),
        }
    }
}

/// Compliance summary over the audit trail.
#[derive(Debug, Serialize)]
pub struct AuditStatsResponse {
    pub total_queries: usize,
    pub unique_members: usize,
    pub success_rate_pct: f64,
    pub violation_count: usize,
    pub fallback_credential_count: usize,
    pub queries_by_type: BTreeMap<String, usize>,
}

impl From<AuditStats> for AuditStatsResponse {
    fn from(value: AuditStats) -> Self {
        Self {
            total_queries: value.total_queries,
            unique_members: value.unique_members,
            success_rate_pct: value.success_rate_pct,
            violation_count: value.violation_count,
            fallback_credential_count: value.fallback_credential_count,
            queries_by_type: value.queries_by_type,
        }
    }
}

/// One configured tenant company; never carries the credential itself.
#[derive(Debug, Serialize)]
pub struct CompanyResponse {
    pub id: String,
    pub display_name: String,
    pub domains: Vec<String>,
    pub theme: Option<String>,
    pub has_scoped_credential: bool,
}

impl CompanyResponse {
    /// Builds the response for one company.
    #[must_use]
    pub fn new(company: &Company, has_scoped_credential: bool) -> Self {
        Self {
            id: company.id().as_str().to_owned(),
            display_name: company.display_name().to_owned(),
            domains: company.domains().to_vec(),
            theme: company.theme().map(ToOwned::to_owned),
            has_scoped_credential,
        }
    }
}

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
