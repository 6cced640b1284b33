use std::sync::Arc;
use std::time::{Duration, Instant};

use claimlens_core::{AppError, AppResult, MemberEmail};
use claimlens_domain::{AuditRecord, Enforcement, QuerySpec, QueryType, enforce};
use serde_json::Value;
use tracing::error;

use crate::mediation_ports::{AuditStore, EngineRequest, QueryEngine};
use crate::tenant_directory::TenantDirectory;


/// Result of one successfully mediated query.
#[derive(Debug, Clone)]
pub struct MediatedQueryOutcome {
    /// Result rows returned by the analytics engine.
    pub rows: Vec<Value>,
    /// Number of rows returned.
    pub row_count: u64,
    /// End-to-end mediation latency.
    pub latency: Duration,
}

/// Orchestration point for every analytic query issued on a member's behalf.
///
/// The presentation layer must route every query through [`mediate`]; nothing
/// else may construct and dispatch a request against the backend. Each
/// attempt resolves the member's company and credential, binds the query to
/// the member with the filter enforcer, dispatches, and writes exactly one
/// audit record regardless of outcome.
///
/// [`mediate`]: MediationService::mediate
#[derive(Clone)]
pub struct MediationService {
    directory: Arc<TenantDirectory>,
    engine: Arc<dyn QueryEngine>,
    audit: Arc<dyn AuditStore>,
}

impl MediationService {
    /// Creates a new mediation service.
    #[must_use]
    pub fn new(
        directory: Arc<TenantDirectory>,
        engine: Arc<dyn QueryEngine>,
        audit: Arc<dyn AuditStore>,
    ) -> Self {
        Self {
            directory,
            engine,
            audit,
        }
    }

    /// Mediates one analytic query for the authenticated member.
    ///
    /// Any failure before dispatch short-circuits without touching the
    /// backend and is still audited. Engine failures are normalized to
    /// `Backend`, audited, and surfaced without retry; retrying inside a
    /// security boundary could mask tampering with the injected filter.
    pub async fn mediate(
        &self,
        spec: QuerySpec,
        member: MemberEmail,
        query_type: QueryType,
    ) -> AppResult<MediatedQueryOutcome> {
        let started = Instant::now();

        let company = match self.directory.resolve_company(&member) {
            Ok(company) => company.clone(),
            Err(cause) => {
                self.record(AuditRecord::rejected(
                    member,
                    None,
                    query_type,
                    &cause,
                    started.elapsed(),
                ))
                .await;
                return Err(cause);
            }
        };

        let resolved = match self.directory.resolve_credential(&company) {
            Ok(resolved) => resolved,
            Err(cause) => {
                self.record(AuditRecord::rejected(
                    member,
                    Some(company.id().clone()),
                    query_type,
                    &cause,
                    started.elapsed(),
                ))
                .await;
                return Err(cause);
            }
        };

        let constrained = match enforce(spec, &member) {
            Enforcement::Accepted(spec) => spec,
            Enforcement::Rejected(violation) => {
                let cause = AppError::from(violation);
                self.record(AuditRecord::rejected(
                    member,
                    Some(company.id().clone()),
                    query_type,
                    &cause,
                    started.elapsed(),
                ))
                .await;
                return Err(cause);
            }
        };

        // The audit record re-validates these, not the enforcer's claim.
        let dispatched_filters = constrained.filters().to_vec();

        let response = self
            .engine
            .execute(EngineRequest {
                spec: constrained,
                credential: resolved.credential,
            })
            .await;
        let latency = started.elapsed();

        match response {
            Ok(response) => {
                let row_count = response.row_count();
                self.record(AuditRecord::dispatched(
                    member,
                    company.id().clone(),
                    query_type,
                    dispatched_filters,
                    Some(row_count),
                    None,
                    latency,
                    resolved.source,
                ))
                .await;

                Ok(MediatedQueryOutcome {
                    rows: response.rows,
                    row_count,
                    latency,
                })
            }
            Err(cause) => {
                let cause = match cause {
                    AppError::Backend(message) => AppError::Backend(message),
                    other => AppError::Backend(other.to_string()),
                };
                self.record(AuditRecord::dispatched(
                    member,
                    company.id().clone(),
                    query_type,
                    dispatched_filters,
                    None,
                    Some(cause.to_string()),
                    latency,
                    resolved.source,
                ))
                .await;

                Err(cause)
            }
        }
    }

    /// Appends one audit record, isolating sink failures from the caller.
    ///
    /// A failed append must never abort the primary query outcome or mask a
    /// violation; it is escalated through the logging path instead.
    async fn record(&self, record: AuditRecord) {
        let record_id = record.record_id();
        if let Err(cause) = self.audit.append(record).await {
            let cause = AppError::AuditWriteFailed(cause.to_string());
            error!(%record_id, %cause, "audit append failed, query outcome preserved");
        }
    }
}
