//! Application services and ports for query mediation.

#![forbid(unsafe_code)]

mod audit_reporter;
mod mediation_ports;
mod mediation_service;
mod tenant_directory;

pub use audit_reporter::{AuditReporter, AuditStats};
pub use mediation_ports::{AuditQuery, AuditStore, EngineRequest, EngineResponse, QueryEngine};
pub use mediation_service::{MediatedQueryOutcome, MediationService};
pub use tenant_directory::{
    CompanyConfig, ResolvedCredential, TenantDirectory, TenantDirectoryConfig,
};
