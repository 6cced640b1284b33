use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use claimlens_application::{CompanyConfig, TenantDirectoryConfig};
use claimlens_core::{AppError, CompanyId, ScopedCredential};
use claimlens_domain::Company;
use tracing_subscriber::EnvFilter;

/// Runtime configuration loaded once from the environment at startup.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub frontend_url: String,
    pub query_engine_url: String,
    pub query_engine_timeout: Duration,
    pub directory_config: TenantDirectoryConfig,
}

impl ApiConfig {
    /// Loads and validates the configuration.
    ///
    /// Companies are declared in `PORTAL_COMPANIES` (comma-separated slugs),
    /// each with `PORTAL_<SLUG>_DOMAINS` and an optional
    /// `PORTAL_<SLUG>_TOKEN`; `PORTAL_FALLBACK_TOKEN` is the shared fallback
    /// credential. A company without any usable credential fails here, at
    /// startup, not at first query.
    pub fn load() -> Result<Self, AppError> {
        let companies_raw = required_non_empty_env("PORTAL_COMPANIES")?;
        let mut companies = Vec::new();
        for slug in companies_raw
            .split(',')
            .map(str::trim)
            .filter(|slug| !slug.is_empty())
        {
            companies.push(load_company(slug)?);
        }

        let fallback_credential = optional_env("PORTAL_FALLBACK_TOKEN")
            .map(ScopedCredential::new)
            .transpose()?;

        let query_engine_url = required_non_empty_env("QUERY_ENGINE_URL")?;
        url::Url::parse(&query_engine_url)
            .map_err(|error| AppError::Validation(format!("invalid QUERY_ENGINE_URL: {error}")))?;

        let query_engine_timeout = Duration::from_secs(
            env::var("QUERY_ENGINE_TIMEOUT_SECONDS")
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .unwrap_or(30),
        );

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

        Ok(Self {
            api_host,
            api_port,
            frontend_url,
            query_engine_url,
            query_engine_timeout,
            directory_config: TenantDirectoryConfig {
                companies,
                fallback_credential,
            },
        })
    }

    /// Returns the socket address the API binds to.
    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

fn load_company(slug: &str) -> Result<CompanyConfig, AppError> {
    let id = CompanyId::new(slug)?;
    let env_slug = slug.to_ascii_uppercase().replace('-', "_");

    let domains: Vec<String> = required_non_empty_env(&format!("PORTAL_{env_slug}_DOMAINS"))?
        .split(',')
        .map(str::trim)
        .filter(|domain| !domain.is_empty())
        .map(ToOwned::to_owned)
        .collect();

    let display_name = env::var(format!("PORTAL_{env_slug}_DISPLAY_NAME"))
        .unwrap_or_else(|_| slug.to_owned());
    let theme = optional_env(&format!("PORTAL_{env_slug}_THEME"));

    let credential = optional_env(&format!("PORTAL_{env_slug}_TOKEN"))
        .map(ScopedCredential::new)
        .transpose()?;

    Ok(CompanyConfig {
        company: Company::new(id, display_name, domains, theme)?,
        credential,
    })
}

/// Initializes the process-wide tracing subscriber.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
