use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use claimlens_core::AppResult;
use claimlens_domain::AuditRecord;

use crate::mediation_ports::{AuditQuery, AuditStore};

/// Summary statistics over the audit trail for compliance views.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditStats {
    /// Total mediated attempts recorded.
    pub total_queries: usize,
    /// Distinct member identities queried.
    pub unique_members: usize,
    /// Share of successful attempts, in percent.
    pub success_rate_pct: f64,
    /// Attempts whose dispatched filter set failed the scope checks.
    pub violation_count: usize,
    /// Attempts authorized with the fallback credential.
    pub fallback_credential_count: usize,
    /// Attempt counts per query category transport value.
    pub queries_by_type: BTreeMap<String, usize>,
}

/// Read side of the audit trail for display and compliance reporting.
#[derive(Clone)]
pub struct AuditReporter {
    audit: Arc<dyn AuditStore>,
}

impl AuditReporter {
    /// Creates a new audit reporter.
    #[must_use]
    pub fn new(audit: Arc<dyn AuditStore>) -> Self {
        Self { audit }
    }

    /// Lists audit records matching the criteria, in insertion order.
    pub async fn list(&self, query: AuditQuery) -> AppResult<Vec<AuditRecord>> {
        self.audit.list(query).await
    }

    /// Lists records flagged as scope violations.
    pub async fn violations(
        &self,
        limit: Option<usize>,
        offset: usize,
    ) -> AppResult<Vec<AuditRecord>> {
        self.audit
            .list(AuditQuery {
                violation: Some(true),
                limit,
                offset,
                ..AuditQuery::default()
            })
            .await
    }

    /// Computes summary statistics over the whole trail.
    pub async fn stats(&self) -> AppResult<AuditStats> {
        let records = self.audit.list(AuditQuery::default()).await?;

        let total_queries = records.len();
        let unique_members = records
            .iter()
            .map(|record| record.member().as_str())
            .collect::<HashSet<_>>()
            .len();
        let success_count = records.iter().filter(|record| record.success()).count();
        let success_rate_pct = if total_queries == 0 {
            0.0
        } else {
            success_count as f64 / total_queries as f64 * 100.0
        };
        let violation_count = records.iter().filter(|record| record.violation()).count();
        let fallback_credential_count = records
            .iter()
            .filter(|record| record.used_fallback_credential())
            .count();

        let mut queries_by_type = BTreeMap::new();
        for record in &records {
            *queries_by_type
                .entry(record.query_type().as_str().to_owned())
                .or_insert(0) += 1;
        }

        Ok(AuditStats {
            total_queries,
            unique_members,
            success_rate_pct,
            violation_count,
            fallback_credential_count,
            queries_by_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use claimlens_core::{AppError, AppResult, CompanyId, MemberEmail};
    use claimlens_domain::{
        AuditRecord, CredentialSource, FilterOperator, FilterPredicate, MEMBER_EMAIL_DIMENSION,
        QueryType,
    };
    use tokio::sync::Mutex;

    use crate::mediation_ports::{AuditQuery, AuditStore};

    use super::AuditReporter;

    #[derive(Default)]
    struct FakeAuditStore {
        records: Mutex<Vec<AuditRecord>>,
    }

    #[async_trait]
    impl AuditStore for FakeAuditStore {
        async fn append(&self, record: AuditRecord) -> AppResult<()> {
            self.records.lock().await.push(record);
            Ok(())
        }

        async fn list(&self, query: AuditQuery) -> AppResult<Vec<AuditRecord>> {
            Ok(self
                .records
                .lock()
                .await
                .iter()
                .filter(|record| query.matches(record))
                .cloned()
                .collect())
        }
    }

    fn member(value: &str) -> MemberEmail {
        MemberEmail::new(value).unwrap_or_else(|_| unreachable!())
    }

    fn company(slug: &str) -> CompanyId {
        CompanyId::new(slug).unwrap_or_else(|_| unreachable!())
    }

    fn scope_filter(value: &str) -> FilterPredicate {
        FilterPredicate::new(MEMBER_EMAIL_DIMENSION, FilterOperator::Equals, value)
            .unwrap_or_else(|_| unreachable!())
    }

    async fn seeded_store() -> Arc<FakeAuditStore> {
        let store = Arc::new(FakeAuditStore::default());

        let appended = store
            .append(AuditRecord::dispatched(
                member("a@techcorp.com"),
                company("techcorp"),
                QueryType::Dashboard,
                vec![scope_filter("a@techcorp.com")],
                Some(10),
                None,
                Duration::from_millis(20),
                CredentialSource::CompanyScoped,
            ))
            .await;
        assert!(appended.is_ok());

        let appended = store
            .append(AuditRecord::dispatched(
                member("b@retailplus.com"),
                company("retailplus"),
                QueryType::QueryBuilder,
                Vec::new(),
                Some(4),
                None,
                Duration::from_millis(9),
                CredentialSource::Fallback,
            ))
            .await;
        assert!(appended.is_ok());

        let appended = store
            .append(AuditRecord::rejected(
                member("x@unknown.org"),
                None,
                QueryType::Dashboard,
                &AppError::UnknownTenant("unknown.org".to_owned()),
                Duration::from_millis(1),
            ))
            .await;
        assert!(appended.is_ok());

        store
    }

    #[tokio::test]
    async fn stats_summarize_the_trail() {
        let reporter = AuditReporter::new(seeded_store().await);
        let stats = reporter.stats().await;
        assert!(stats.is_ok());
        let stats = stats.unwrap_or_else(|_| unreachable!());

        assert_eq!(stats.total_queries, 3);
        assert_eq!(stats.unique_members, 3);
        assert_eq!(stats.violation_count, 1);
        assert_eq!(stats.fallback_credential_count, 1);
        assert!((stats.success_rate_pct - 66.666).abs() < 0.01);
        assert_eq!(stats.queries_by_type.get("dashboard"), Some(&2));
        assert_eq!(stats.queries_by_type.get("query_builder"), Some(&1));
    }

    #[tokio::test]
    async fn violations_lists_only_flagged_records() {
        let reporter = AuditReporter::new(seeded_store().await);
        let violations = reporter.violations(None, 0).await;
        assert!(violations.is_ok());
        let violations = violations.unwrap_or_else(|_| unreachable!());

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].member().as_str(), "b@retailplus.com");
    }

    #[tokio::test]
    async fn empty_trail_yields_zeroed_stats() {
        let reporter = AuditReporter::new(Arc::new(FakeAuditStore::default()));
        let stats = reporter.stats().await;
        assert!(stats.is_ok());
        let stats = stats.unwrap_or_else(|_| unreachable!());
        assert_eq!(stats.total_queries, 0);
        assert!((stats.success_rate_pct - 0.0).abs() < f64::EPSILON);
    }
}
