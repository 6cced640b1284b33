use std::time::Duration;

use async_trait::async_trait;
use claimlens_application::{EngineRequest, EngineResponse, QueryEngine};
use claimlens_core::{AppError, AppResult};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

/// HTTP client for the external analytics query engine.
///
/// Dispatches one POST per mediated query with the company-scoped bearer
/// credential. Failures are normalized to `AppError::Backend` and never
/// retried here: the mediation path is a security boundary, and a silent
/// retry could mask tampering with the injected scope filter.
pub struct HttpQueryEngine {
    http_client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct EngineRows {
    rows: Vec<Value>,
}

impl HttpQueryEngine {
    /// Creates a new engine client against the given base URL.
    #[must_use]
    pub fn new(http_client: reqwest::Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            http_client,
            endpoint: format!("{}/api/v1/query", base_url.trim_end_matches('/')),
            timeout,
        }
    }

    fn timeout_error(&self) -> AppError {
        AppError::Backend(format!(
            "query engine timed out after {}s",
            self.timeout.as_secs()
        ))
    }
}

#[async_trait]
impl QueryEngine for HttpQueryEngine {
    async fn execute(&self, request: EngineRequest) -> AppResult<EngineResponse> {
        let request_id = Uuid::new_v4();
        debug!(
            %request_id,
            metrics = ?request.spec.metric_names(),
            filter_count = request.spec.filters().len(),
            "dispatching query to analytics engine"
        );

        let send = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(request.credential.reveal())
            .header("X-Claimlens-Request", request_id.to_string())
            .json(&request.spec)
            .send();

        let response = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| self.timeout_error())?
            .map_err(|error| {
                if error.is_timeout() {
                    self.timeout_error()
                } else {
                    AppError::Backend(format!("query engine transport error: {error}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<response body unavailable>".to_owned());
            let body: String = body.chars().take(500).collect();
            return Err(AppError::Backend(format!(
                "query engine returned status {status}: {body}"
            )));
        }

        let rows: EngineRows = response.json().await.map_err(|error| {
            AppError::Backend(format!(
                "query engine returned a malformed response: {error}"
            ))
        })?;

        debug!(%request_id, row_count = rows.rows.len(), "analytics engine responded");
        Ok(EngineResponse { rows: rows.rows })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::HttpQueryEngine;

    #[test]
    fn endpoint_strips_trailing_slash() {
        let engine = HttpQueryEngine::new(
            reqwest::Client::new(),
            "http://localhost:4000/",
            Duration::from_secs(30),
        );
        assert_eq!(engine.endpoint, "http://localhost:4000/api/v1/query");
    }
}
