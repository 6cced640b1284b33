use async_trait::async_trait;
use claimlens_application::{AuditQuery, AuditStore};
use claimlens_core::AppResult;
use claimlens_domain::AuditRecord;
use tokio::sync::RwLock;


/// In-memory append-only audit trail.
///
/// One write lock section per append serializes concurrent writers, so
/// insertion order is the retrieval order. Durable persistence of the trail
/// is an external concern layered behind the same port.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    records: RwLock<Vec<AuditRecord>>,
}

impl InMemoryAuditLog {
    /// Creates an empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditLog {
    async fn append(&self, record: AuditRecord) -> AppResult<()> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn list(&self, query: AuditQuery) -> AppResult<Vec<AuditRecord>> {
        let records = self.records.read().await;

        let matching = records
            .iter()
            .filter(|record| query.matches(record))
            .skip(query.offset);

        let listed = match query.limit {
            Some(limit) => matching.take(limit).cloned().collect(),
            None => matching.cloned().collect(),
        };

        Ok(listed)
    }
}
