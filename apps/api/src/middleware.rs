use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use claimlens_core::{AppError, MemberEmail};

use crate::error::ApiResult;

/// Header carrying the authenticated member identity.
///
/// Installed by the fronting portal session layer; the query body is never
/// consulted for identity.
pub const MEMBER_CONTEXT_HEADER: &str = "x-portal-member";

/// Binds the authenticated member identity to the request.
///
/// Requests without a valid member context are rejected before any handler
/// runs; handlers read the identity from the request extension only.
pub async fn require_member_context(mut request: Request, next: Next) -> ApiResult<Response> {
    let header = request
        .headers()
        .get(MEMBER_CONTEXT_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("member context required".to_owned()))?;

    let member = MemberEmail::new(header).map_err(|_| {
        AppError::Unauthorized("member context is not a valid identity".to_owned())
    })?;

    request.extensions_mut().insert(member);
    Ok(next.run(request).await)
}
