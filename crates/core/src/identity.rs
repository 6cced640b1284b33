use std::fmt::{Debug, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult};

/// Member identity, structurally an email-like `local@domain` value.
///
/// The domain portion deterministically maps the member to exactly one
/// company. The identity is immutable for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemberEmail {
    value: String,
    at: usize,
}

impl MemberEmail {
    /// Parses and validates a member identity.
    ///
    /// The domain portion is lowercased on construction so tenant resolution
    /// and scope comparison are case-insensitive on the domain.
    pub fn new(value: impl AsRef<str>) -> AppResult<Self> {
        let value = value.as_ref().trim();
        let Some((local, domain)) = value.split_once('@') else {
            return Err(AppError::Validation(format!(
                "member identity '{value}' is not a valid email address"
            )));
        };

        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(AppError::Validation(format!(
                "member identity '{value}' is not a valid email address"
            )));
        }

        Ok(Self {
            value: format!("{local}@{}", domain.to_ascii_lowercase()),
            at: local.len(),
        })
    }

    /// Returns the full identity in `local@domain` form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.value.as_str()
    }

    /// Returns the local (mailbox) portion.
    #[must_use]
    pub fn local(&self) -> &str {
        &self.value[..self.at]
    }

    /// Returns the lowercased domain portion used for tenant resolution.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.value[self.at + 1..]
    }
}

impl Display for MemberEmail {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.value)
    }
}

impl TryFrom<String> for MemberEmail {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MemberEmail> for String {
    fn from(value: MemberEmail) -> Self {
        value.value
    }
}

/// Secret service token authorizing queries against the analytics backend.
///
/// Scoped to exactly one company, or configured once as the designated
/// fallback. `Debug` and `Display` render a masked form only; the clear
/// value is reachable solely through [`ScopedCredential::reveal`] at the
/// outbound dispatch site.
#[derive(Clone, PartialEq, Eq)]
pub struct ScopedCredential(String);

impl ScopedCredential {
    /// Creates a credential from a configured secret value.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "credential must not be empty".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the clear secret for outbound authorization headers.
    #[must_use]
    pub fn reveal(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the masked rendering safe for logs and operator views.
    #[must_use]
    pub fn masked(&self) -> String {
        if self.0.len() <= 8 {
            return "*".repeat(self.0.len());
        }

        format!("{}***{}", &self.0[..4], &self.0[self.0.len() - 4..])
    }
}

impl Debug for ScopedCredential {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "ScopedCredential({})", self.masked())
    }
}

impl Display for ScopedCredential {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.masked())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemberEmail, ScopedCredential};

    #[test]
    fn member_email_parses_and_lowercases_domain() {
        let member = MemberEmail::new("Alice.Smith@TechCorp.com");
        assert!(member.is_ok());
        let member = member.unwrap_or_else(|_| unreachable!());
        assert_eq!(member.local(), "Alice.Smith");
        assert_eq!(member.domain(), "techcorp.com");
        assert_eq!(member.as_str(), "Alice.Smith@techcorp.com");
    }

    #[test]
    fn member_email_rejects_malformed_values() {
        assert!(MemberEmail::new("no-at-sign").is_err());
        assert!(MemberEmail::new("@techcorp.com").is_err());
        assert!(MemberEmail::new("alice@").is_err());
        assert!(MemberEmail::new("a@b@c").is_err());
    }

    #[test]
    fn credential_debug_is_masked() {
        let credential = ScopedCredential::new("svc_abcdef123456");
        assert!(credential.is_ok());
        let credential = credential.unwrap_or_else(|_| unreachable!());
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("abcdef123456"));
        assert!(rendered.contains("svc_***3456"));
        assert_eq!(credential.reveal(), "svc_abcdef123456");
    }

    #[test]
    fn short_credential_is_fully_masked() {
        let credential = ScopedCredential::new("secret");
        assert!(credential.is_ok());
        assert_eq!(
            credential.unwrap_or_else(|_| unreachable!()).masked(),
            "******"
        );
    }

    #[test]
    fn blank_credential_is_rejected() {
        assert!(ScopedCredential::new("   ").is_err());
    }
}
