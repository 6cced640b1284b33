use claimlens_core::{AppError, AppResult, CompanyId, NonEmptyString};
use serde::{Deserialize, Serialize};

/// One tenant company of the portal.
///
/// Companies are statically configured at process start and never mutated at
/// runtime. Their domain suffixes are disjoint across the whole directory,
/// which the tenant directory validates on construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    id: CompanyId,
    display_name: NonEmptyString,
    domains: Vec<String>,
    theme: Option<String>,
}

impl Company {
    /// Creates a validated company with at least one email domain suffix.
    pub fn new(
        id: CompanyId,
        display_name: impl Into<String>,
        domains: Vec<String>,
        theme: Option<String>,
    ) -> AppResult<Self> {
        if domains.is_empty() {
            return Err(AppError::Validation(format!(
                "company '{id}' must map at least one email domain"
            )));
        }

        let mut normalized = Vec::with_capacity(domains.len());
        for domain in domains {
            let domain = domain.trim().to_ascii_lowercase();
            if domain.is_empty() || domain.contains('@') {
                return Err(AppError::Validation(format!(
                    "company '{id}' has an invalid email domain '{domain}'"
                )));
            }
            normalized.push(domain);
        }

        Ok(Self {
            id,
            display_name: NonEmptyString::new(display_name)?,
            domains: normalized,
            theme,
        })
    }

    /// Returns the company identifier.
    #[must_use]
    pub fn id(&self) -> &CompanyId {
        &self.id
    }

    /// Returns the display name shown by the presentation layer.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the email domain suffixes mapping members to this company.
    #[must_use]
    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// Returns the presentation theme label, if one is configured.
    #[must_use]
    pub fn theme(&self) -> Option<&str> {
        self.theme.as_deref()
    }

    /// Returns true when the given (lowercased) email domain maps to this company.
    #[must_use]
    pub fn matches_domain(&self, domain: &str) -> bool {
        self.domains.iter().any(|candidate| candidate == domain)
    }
}

/// Which credential a mediated query was authorized with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    /// The company's own scoped credential.
    CompanyScoped,
    /// The globally configured fallback credential.
    Fallback,
}

impl CredentialSource {
    /// Returns the stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CompanyScoped => "company_scoped",
            Self::Fallback => "fallback",
        }
    }

    /// Returns true when the fallback credential was used.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback)
    }
}
