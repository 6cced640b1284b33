//! Shared primitives for all Rust crates in Claimlens.

#![forbid(unsafe_code)]

/// Identity and credential primitives shared across services.
pub mod identity;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use identity::{MemberEmail, ScopedCredential};

/// Result type used across Claimlens crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Company identifier naming one tenant boundary.
///
/// Companies are declared in static configuration, so the identifier is a
/// validated lowercase slug rather than a generated value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompanyId(String);

impl CompanyId {
    /// Creates a company identifier from a configured slug.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let slug = value.trim();
        if slug.is_empty() {
            return Err(AppError::Validation(
                "company id must not be empty".to_owned(),
            ));
        }
        if !slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
        {
            return Err(AppError::Validation(format!(
                "company id '{slug}' must contain only lowercase letters, digits, '-' or '_'"
            )));
        }

        Ok(Self(slug.to_owned()))
    }

    /// Returns the underlying slug.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for CompanyId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Member identity domain matches no configured company.
    ///
    /// This is an authentication-layer failure and is rejected before any
    /// credential resolution takes place.
    #[error("unknown tenant: {0}")]
    UnknownTenant(String),

    /// Company resolved but no usable credential is configured for it.
    #[error("no credential configured: {0}")]
    NoCredentialConfigured(String),

    /// Row-level filter enforcement invariant violated.
    ///
    /// Always audited with the violation flag set; the request is aborted
    /// before dispatch and never silently corrected.
    #[error("filter validation failed: {0}")]
    FilterValidationFailed(String),

    /// The external query engine failed or timed out.
    #[error("backend error: {0}")]
    Backend(String),

    /// The audit sink rejected an append.
    ///
    /// Must never abort the caller's primary operation; escalated through a
    /// separate alerting path only.
    #[error("audit write failed: {0}")]
    AuditWriteFailed(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated or not allowed to access a resource.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::{CompanyId, NonEmptyString};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn company_id_accepts_slug() {
        let company = CompanyId::new("techcorp");
        assert!(company.is_ok());
        assert_eq!(
            company.unwrap_or_else(|_| unreachable!()).as_str(),
            "techcorp"
        );
    }

    #[test]
    fn company_id_rejects_uppercase_and_spaces() {
        assert!(CompanyId::new("TechCorp").is_err());
        assert!(CompanyId::new("tech corp").is_err());
        assert!(CompanyId::new("").is_err());
    }
}
