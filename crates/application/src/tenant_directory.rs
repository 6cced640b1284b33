use std::collections::HashSet;

use claimlens_core::{AppError, AppResult, MemberEmail, ScopedCredential};
use claimlens_domain::{Company, CredentialSource};
use tracing::warn;

/// One configured company with its optional scoped credential.
#[derive(Debug, Clone)]
pub struct CompanyConfig {
    /// Tenant company definition.
    pub company: Company,
    /// Company-scoped credential, absent when the fallback should be used.
    pub credential: Option<ScopedCredential>,
}

/// Static configuration the tenant directory is built from at startup.
#[derive(Debug, Clone)]
pub struct TenantDirectoryConfig {
    /// Configured tenant companies.
    pub companies: Vec<CompanyConfig>,
    /// Globally configured fallback credential, if any.
    pub fallback_credential: Option<ScopedCredential>,
}

/// Credential resolved for a company, with its provenance.
#[derive(Debug, Clone)]
pub struct ResolvedCredential {
    /// The secret authorizing backend queries.
    pub credential: ScopedCredential,
    /// Whether the company's own credential or the fallback was selected.
    pub source: CredentialSource,
}

/// Process-wide immutable mapping of member identities to companies and
/// companies to scoped credentials.
///
/// Built once at startup and read-only thereafter. Construction validates the
/// whole configuration and fails fast: a referenced company with neither its
/// own credential nor a configured fallback never reaches request handling.
#[derive(Debug)]
pub struct TenantDirectory {
    entries: Vec<CompanyConfig>,
    fallback: Option<ScopedCredential>,
}

impl TenantDirectory {
    /// Builds and validates the directory from static configuration.
    ///
    /// Fails with `Validation` when no company is configured or two companies
    /// claim the same email domain, and with `NoCredentialConfigured` when a
    /// company lacks a credential and no fallback exists.
    pub fn new(config: TenantDirectoryConfig) -> AppResult<Self> {
        if config.companies.is_empty() {
            return Err(AppError::Validation(
                "at least one company must be configured".to_owned(),
            ));
        }

        let mut seen_ids = HashSet::new();
        let mut seen_domains = HashSet::new();
        for entry in &config.companies {
            let company = &entry.company;
            if !seen_ids.insert(company.id().clone()) {
                return Err(AppError::Validation(format!(
                    "company '{}' is configured twice",
                    company.id()
                )));
            }
            for domain in company.domains() {
                if !seen_domains.insert(domain.clone()) {
                    return Err(AppError::Validation(format!(
                        "email domain '{domain}' maps to more than one company"
                    )));
                }
            }
            if entry.credential.is_none() && config.fallback_credential.is_none() {
                return Err(AppError::NoCredentialConfigured(format!(
                    "company '{}' has no scoped credential and no fallback is configured",
                    company.id()
                )));
            }
        }

        Ok(Self {
            entries: config.companies,
            fallback: config.fallback_credential,
        })
    }

    /// Resolves the member's company from the identity's domain suffix.
    ///
    /// An unmatched domain is an authentication failure (`UnknownTenant`),
    /// never silently defaulted to a fallback company.
    pub fn resolve_company(&self, member: &MemberEmail) -> AppResult<&Company> {
        self.entries
            .iter()
            .map(|entry| &entry.company)
            .find(|company| company.matches_domain(member.domain()))
            .ok_or_else(|| {
                AppError::UnknownTenant(format!(
                    "email domain '{}' matches no configured company",
                    member.domain()
                ))
            })
    }

    /// Resolves the credential for a previously resolved company.
    ///
    /// Selects the company's own credential when configured, otherwise the
    /// fallback (flagged as such and logged). Secrets are never logged in
    /// clear form.
    pub fn resolve_credential(&self, company: &Company) -> AppResult<ResolvedCredential> {
        let entry = self
            .entries
            .iter()
            .find(|entry| entry.company.id() == company.id())
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "company '{}' is not registered in the tenant directory",
                    company.id()
                ))
            })?;

        if let Some(credential) = &entry.credential {
            return Ok(ResolvedCredential {
                credential: credential.clone(),
                source: CredentialSource::CompanyScoped,
            });
        }

        if let Some(fallback) = &self.fallback {
            warn!(
                company = %company.id(),
                "no company-scoped credential configured, using fallback credential"
            );
            return Ok(ResolvedCredential {
                credential: fallback.clone(),
                source: CredentialSource::Fallback,
            });
        }

        Err(AppError::NoCredentialConfigured(format!(
            "company '{}' has no scoped credential and no fallback is configured",
            company.id()
        )))
    }

    /// Returns the configured companies in configuration order.
    #[must_use]
    pub fn companies(&self) -> Vec<&Company> {
        self.entries.iter().map(|entry| &entry.company).collect()
    }

    /// Returns true when the company has its own scoped credential.
    #[must_use]
    pub fn has_scoped_credential(&self, company: &Company) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.company.id() == company.id() && entry.credential.is_some())
    }

    /// Builds a directory without credential-coverage validation.
    ///
    /// Test-only escape hatch for exercising request-time failure paths that
    /// startup validation otherwise makes unreachable.
    #[cfg(test)]
    pub(crate) fn unvalidated(
        entries: Vec<CompanyConfig>,
        fallback: Option<ScopedCredential>,
    ) -> Self {
        Self { entries, fallback }
    }
}

#[cfg(test)]
mod tests {
    use claimlens_core::{AppError, CompanyId, MemberEmail, ScopedCredential};
    use claimlens_domain::{Company, CredentialSource};

    use super::{CompanyConfig, TenantDirectory, TenantDirectoryConfig};

    fn company(slug: &str, domains: &[&str]) -> Company {
        Company::new(
            CompanyId::new(slug).unwrap_or_else(|_| unreachable!()),
            slug.to_owned(),
            domains.iter().map(|d| (*d).to_owned()).collect(),
            None,
        )
        .unwrap_or_else(|_| unreachable!())
    }

    fn credential(value: &str) -> ScopedCredential {
        ScopedCredential::new(value).unwrap_or_else(|_| unreachable!())
    }

    fn member(value: &str) -> MemberEmail {
        MemberEmail::new(value).unwrap_or_else(|_| unreachable!())
    }

    fn directory() -> TenantDirectory {
        TenantDirectory::new(TenantDirectoryConfig {
            companies: vec![
                CompanyConfig {
                    company: company("techcorp", &["techcorp.com"]),
                    credential: Some(credential("svc_techcorp_token")),
                },
                CompanyConfig {
                    company: company("retailplus", &["retailplus.com"]),
                    credential: None,
                },
            ],
            fallback_credential: Some(credential("svc_fallback_token")),
        })
        .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn resolves_company_from_email_domain() {
        let directory = directory();
        let resolved = directory.resolve_company(&member("a@techcorp.com"));
        assert!(resolved.is_ok());
        assert_eq!(
            resolved.unwrap_or_else(|_| unreachable!()).id().as_str(),
            "techcorp"
        );
    }

    #[test]
    fn unmatched_domain_is_unknown_tenant() {
        let directory = directory();
        let resolved = directory.resolve_company(&member("x@unknown.org"));
        assert!(matches!(resolved, Err(AppError::UnknownTenant(_))));
    }

    #[test]
    fn resolves_company_scoped_credential() {
        let directory = directory();
        let techcorp = company("techcorp", &["techcorp.com"]);
        let resolved = directory.resolve_credential(&techcorp);
        assert!(resolved.is_ok());
        let resolved = resolved.unwrap_or_else(|_| unreachable!());
        assert_eq!(resolved.source, CredentialSource::CompanyScoped);
        assert_eq!(resolved.credential.reveal(), "svc_techcorp_token");
    }

    #[test]
    fn falls_back_to_shared_credential_and_flags_it() {
        let directory = directory();
        let retailplus = company("retailplus", &["retailplus.com"]);
        let resolved = directory.resolve_credential(&retailplus);
        assert!(resolved.is_ok());
        let resolved = resolved.unwrap_or_else(|_| unreachable!());
        assert_eq!(resolved.source, CredentialSource::Fallback);
        assert_eq!(resolved.credential.reveal(), "svc_fallback_token");
    }

    #[test]
    fn construction_fails_without_credential_or_fallback() {
        let result = TenantDirectory::new(TenantDirectoryConfig {
            companies: vec![CompanyConfig {
                company: company("techcorp", &["techcorp.com"]),
                credential: None,
            }],
            fallback_credential: None,
        });
        assert!(matches!(result, Err(AppError::NoCredentialConfigured(_))));
    }

    #[test]
    fn construction_fails_on_overlapping_domains() {
        let result = TenantDirectory::new(TenantDirectoryConfig {
            companies: vec![
                CompanyConfig {
                    company: company("techcorp", &["shared.com"]),
                    credential: Some(credential("svc_a")),
                },
                CompanyConfig {
                    company: company("retailplus", &["shared.com"]),
                    credential: Some(credential("svc_b")),
                },
            ],
            fallback_credential: None,
        });
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn construction_fails_without_companies() {
        let result = TenantDirectory::new(TenantDirectoryConfig {
            companies: Vec::new(),
            fallback_credential: None,
        });
        assert!(result.is_err());
    }

    #[test]
    fn unregistered_company_resolves_no_credential() {
        let directory = directory();
        let other = company("manufacturingco", &["manufacturingco.com"]);
        let resolved = directory.resolve_credential(&other);
        assert!(matches!(resolved, Err(AppError::NotFound(_))));
    }
}
