//! Infrastructure adapters for the mediation ports.

#![forbid(unsafe_code)]

mod http_query_engine;
mod in_memory_audit_log;

pub use http_query_engine::HttpQueryEngine;
pub use in_memory_audit_log::InMemoryAuditLog;
