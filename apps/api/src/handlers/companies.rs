use axum::Json;
use axum::extract::State;

use crate::dto::CompanyResponse;
use crate::error::ApiResult;
use crate::state::AppState;

/// Lists the configured tenant companies.
///
/// Exposes identifiers, domains, and presentation attributes only; the
/// scoped credentials themselves never leave the directory.
pub async fn list_companies_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<CompanyResponse>>> {
    let companies = state
        .directory
        .companies()
        .into_iter()
        .map(|company| {
            CompanyResponse::new(company, state.directory.has_scoped_credential(company))
        })
        .collect();

    Ok(Json(companies))
}
