use std::sync::Arc;

use claimlens_application::{AuditReporter, MediationService, TenantDirectory};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub mediation_service: MediationService,
    pub audit_reporter: AuditReporter,
    pub directory: Arc<TenantDirectory>,
}
