use std::str::FromStr;

use axum::extract::State;
use axum::{Extension, Json};
use claimlens_core::MemberEmail;
use claimlens_domain::QueryType;

use crate::dto::{MediateQueryRequest, MediatedQueryResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Sole entry point for analytic queries issued on a member's behalf.
///
/// The identity comes from the authenticated request extension; anything the
/// body claims about member scope is stripped by the filter enforcer.
pub async fn mediate_query_handler(
    State(state): State<AppState>,
    Extension(member): Extension<MemberEmail>,
    Json(request): Json<MediateQueryRequest>,
) -> ApiResult<Json<MediatedQueryResponse>> {
    let query_type = QueryType::from_str(&request.query_type)?;
    let spec = request.query.into_spec()?;

    let outcome = state
        .mediation_service
        .mediate(spec, member, query_type)
        .await?;

    Ok(Json(MediatedQueryResponse::from(outcome)))
}
