//! Client configuration.

use crate::error::EzidError;
use std::path::PathBuf;
use std::time::Duration;

/// Production EZID endpoint.
pub const DEFAULT_BASE_URL: &str = "https://ezid.cdlib.org";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the EZID service (e.g., <https://ezid.cdlib.org>)
    pub base_url: String,

    /// Timeout applied to every request
    pub timeout: Duration,

    /// `User-Agent` header sent with every request
    pub user_agent: String,

    /// Custom CA certificate path for self-signed server certs (PEM format)
    pub ca_cert_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: concat!("ezid-rs/", env!("CARGO_PKG_VERSION")).to_string(),
            ca_cert_path: None,
        }
    }
}

impl ClientConfig {
    /// Configuration pointing at the given base URL, other fields default.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `EZID_BASE_URL`: service base URL
    /// - `EZID_TIMEOUT_SECS`: per-request timeout in seconds
    /// - `EZID_CA_CERT`: PEM CA bundle for self-signed deployments
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, EzidError> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("EZID_BASE_URL") {
            config.base_url = url;
        }

        if let Ok(secs) = std::env::var("EZID_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|e| EzidError::Config(format!("invalid EZID_TIMEOUT_SECS: {e}")))?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Ok(path) = std::env::var("EZID_CA_CERT") {
            config.ca_cert_path = Some(PathBuf::from(path));
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the base URL is an absolute http(s) URL.
    ///
    /// # Errors
    ///
    /// Returns [`EzidError::Config`] describing the problem.
    pub fn validate(&self) -> Result<(), EzidError> {
        let url = url::Url::parse(&self.base_url)
            .map_err(|e| EzidError::Config(format!("invalid base URL {}: {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(EzidError::Config(format!(
                "base URL must be http or https: {}",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(EzidError::Config("timeout must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Join a service path onto the base URL.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Account credentials used for login.
#[derive(Clone)]
pub struct Credentials {
    /// Account name
    pub username: String,
    /// Account password
    pub password: String,
}

impl Credentials {
    /// Create credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Load credentials from `EZID_USERNAME` and `EZID_PASSWORD`.
    ///
    /// # Errors
    ///
    /// Returns error if either variable is missing.
    pub fn from_env() -> Result<Self, EzidError> {
        let username = std::env::var("EZID_USERNAME")
            .map_err(|_| EzidError::Config("EZID_USERNAME is not set".to_string()))?;
        let password = std::env::var("EZID_PASSWORD")
            .map_err(|_| EzidError::Config("EZID_PASSWORD is not set".to_string()))?;
        Ok(Self { username, password })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
