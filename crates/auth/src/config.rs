//! Client configuration for the Frappe OAuth flow
//!
//! Values come from the embedding application (environment, build config,
//! or settings screen). Validation happens once here so the rest of the
//! crate can treat the configuration as well-formed.

use thiserror::Error;
use url::Url;

/// Path component of the app-scheme redirect URI.
const REDIRECT_PATH: &str = "auth/callback";

/// Configuration error raised at construction time.
///
/// Session state is never touched by configuration failures; callers fail
/// fast before any flow or manager is built.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Base URL is missing, relative, or not http(s)
    #[error("invalid base URL {0:?}: must be an absolute http(s) URL")]
    InvalidBaseUrl(String),

    /// OAuth client id is empty
    #[error("missing OAuth client id")]
    MissingClientId,

    /// App URL scheme for the redirect URI is empty
    #[error("missing app URL scheme for the redirect URI")]
    MissingScheme,
}

/// OAuth client configuration for a Frappe server.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Base server URL, normalized without a trailing slash
    /// (e.g., "https://erp.example.com")
    pub base_url: String,

    /// OAuth client id registered on the Frappe server
    pub client_id: String,

    /// Requested scopes, in order (e.g., ["openid", "all"])
    pub scopes: Vec<String>,

    /// App URL scheme used to build the redirect URI
    /// (e.g., "frappeexpo" yields "frappeexpo://auth/callback")
    pub scheme: String,
}

impl AuthConfig {
    /// Create a validated configuration.
    ///
    /// A trailing slash on the base URL is trimmed so endpoint derivation
    /// by concatenation stays well-formed.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the base URL is not an absolute http(s)
    /// URL, or if the client id or app scheme is empty.
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        scopes: Vec<String>,
        scheme: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let base_url = base_url.into();
        let client_id = client_id.into();
        let scheme = scheme.into();

        let parsed =
            Url::parse(&base_url).map_err(|_| ConfigError::InvalidBaseUrl(base_url.clone()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl(base_url));
        }

        if client_id.trim().is_empty() {
            return Err(ConfigError::MissingClientId);
        }
        if scheme.trim().is_empty() {
            return Err(ConfigError::MissingScheme);
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id,
            scopes,
            scheme,
        })
    }

    /// Redirect URI derived from the app scheme.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!("{}://{}", self.scheme, REDIRECT_PATH)
    }

    /// Scopes as the space-separated string OAuth requests expect.
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}
