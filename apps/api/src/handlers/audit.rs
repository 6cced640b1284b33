use std::str::FromStr;

use axum::Json;
use axum::extract::{Query, State};
use claimlens_application::AuditQuery;
use claimlens_core::{CompanyId, MemberEmail};
use claimlens_domain::QueryType;

use crate::dto::{AuditRecordResponse, AuditStatsResponse};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, serde::Deserialize)]
pub struct AuditLogParams {
    pub member: Option<String>,
    pub company: Option<String>,
    pub query_type: Option<String>,
    pub success: Option<bool>,
    pub violation: Option<bool>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl AuditLogParams {
    fn into_query(self) -> Result<AuditQuery, claimlens_core::AppError> {
        Ok(AuditQuery {
            member: self.member.map(MemberEmail::new).transpose()?,
            company: self.company.map(CompanyId::new).transpose()?,
            query_type: self
                .query_type
                .as_deref()
                .map(QueryType::from_str)
                .transpose()?,
            success: self.success,
            violation: self.violation,
            limit: Some(self.limit.unwrap_or(50)),
            offset: self.offset.unwrap_or(0),
        })
    }
}

/// Lists audit trail entries matching the given criteria.
pub async fn list_audit_log_handler(
    State(state): State<AppState>,
    Query(params): Query<AuditLogParams>,
) -> ApiResult<Json<Vec<AuditRecordResponse>>> {
    let entries = state
        .audit_reporter
        .list(params.into_query()?)
        .await?
        .into_iter()
        .map(AuditRecordResponse::from)
        .collect();

    Ok(Json(entries))
}

#[derive(Debug, serde::Deserialize)]
pub struct ViolationParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Lists entries whose dispatched filter set failed the scope checks.
pub async fn list_violations_handler(
    State(state): State<AppState>,
    Query(params): Query<ViolationParams>,
) -> ApiResult<Json<Vec<AuditRecordResponse>>> {
    let entries = state
        .audit_reporter
        .violations(Some(params.limit.unwrap_or(50)), params.offset.unwrap_or(0))
        .await?
        .into_iter()
        .map(AuditRecordResponse::from)
        .collect();

    Ok(Json(entries))
}

/// Returns the compliance summary over the whole trail.
pub async fn audit_stats_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<AuditStatsResponse>> {
    let stats = state.audit_reporter.stats().await?;
    Ok(Json(AuditStatsResponse::from(stats)))
}
