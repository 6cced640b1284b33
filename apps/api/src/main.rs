//! Claimlens API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::sync::Arc;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware::from_fn;
use axum::routing::{get, post};
use claimlens_application::{
    AuditReporter, AuditStore, MediationService, QueryEngine, TenantDirectory,
};
use claimlens_core::AppError;
use claimlens_infrastructure::{HttpQueryEngine, InMemoryAuditLog};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api_config::{ApiConfig, init_tracing};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    // Fails fast when a referenced company has no usable credential.
    let directory = Arc::new(TenantDirectory::new(config.directory_config.clone())?);

    let engine: Arc<dyn QueryEngine> = Arc::new(HttpQueryEngine::new(
        reqwest::Client::new(),
        &config.query_engine_url,
        config.query_engine_timeout,
    ));
    let audit_log: Arc<dyn AuditStore> = Arc::new(InMemoryAuditLog::new());

    let app_state = AppState {
        mediation_service: MediationService::new(
            directory.clone(),
            engine,
            audit_log.clone(),
        ),
        audit_reporter: AuditReporter::new(audit_log),
        directory,
    };

    let mediated_routes = Router::new()
        .route(
            "/api/queries",
            post(handlers::queries::mediate_query_handler),
        )
        .route("/api/audit", get(handlers::audit::list_audit_log_handler))
        .route(
            "/api/audit/violations",
            get(handlers::audit::list_violations_handler),
        )
        .route("/api/audit/stats", get(handlers::audit::audit_stats_handler))
        .route(
            "/api/companies",
            get(handlers::companies::list_companies_handler),
        )
        .route_layer(from_fn(middleware::require_member_context));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&config.frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            HeaderName::from_static(middleware::MEMBER_CONTEXT_HEADER),
        ]);

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(mediated_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state);

    let address = config.socket_address()?;

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "claimlens-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
