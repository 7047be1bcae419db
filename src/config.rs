use anyhow::Context;
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Authorization credentials in strict priority order. Every outgoing request
/// uses the first credential that is set; if none is, the request goes out
/// unauthenticated because some deployments rely on cookie auth instead and
/// the backend owns the rejection.
#[derive(Debug, Clone, Default)]
pub struct AuthTokens {
    /// Explicit per-client override, highest priority.
    pub override_token: Option<String>,
    pub access_token: Option<String>,
    pub profile_token: Option<String>,
    pub session_token: Option<String>,
}

impl AuthTokens {
    pub fn bearer(&self) -> Option<&str> {
        self.override_token
            .as_deref()
            .or(self.access_token.as_deref())
            .or(self.profile_token.as_deref())
            .or(self.session_token.as_deref())
    }
}

/// Explicit client configuration. All context the client needs (credentials,
/// active profile, currency) lives here rather than in ambient storage, so
/// the auth chain and profile scoping are testable without a simulated
/// browser environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the points-economy REST API.
    pub api_base_url: String,
    /// Full endpoint URL of the live exchange-rate proxy; `None` disables the
    /// live rate source.
    pub exchange_rate_url: Option<String>,
    pub request_timeout_secs: u64,
    pub auth: AuthTokens,
    /// Profile every request is scoped to, when one is selected.
    pub active_profile_id: Option<String>,
    pub default_currency: String,
}

impl Config {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Config {
            api_base_url: api_base_url.into(),
            exchange_rate_url: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            auth: AuthTokens::default(),
            active_profile_id: None,
            default_currency: "USD".to_string(),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Ok(Config {
            api_base_url: env::var("MYPTS_API_URL").context("MYPTS_API_URL must be set")?,
            exchange_rate_url: env::var("MYPTS_EXCHANGE_RATE_URL").ok(),
            request_timeout_secs: env::var("MYPTS_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_REQUEST_TIMEOUT_SECS.to_string())
                .parse()?,
            auth: AuthTokens {
                override_token: None,
                access_token: env::var("MYPTS_ACCESS_TOKEN").ok(),
                profile_token: env::var("MYPTS_PROFILE_TOKEN").ok(),
                session_token: env::var("MYPTS_SESSION_TOKEN").ok(),
            },
            active_profile_id: env::var("MYPTS_ACTIVE_PROFILE").ok(),
            default_currency: env::var("MYPTS_CURRENCY").unwrap_or_else(|_| "USD".to_string()),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_base_url.is_empty() {
            anyhow::bail!("api_base_url is empty");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        url::Url::parse(&self.api_base_url).context("api_base_url is not a valid URL")?;
        if let Some(rate_url) = &self.exchange_rate_url {
            url::Url::parse(rate_url).context("exchange_rate_url is not a valid URL")?;
        }

        Ok(())
    }
}
