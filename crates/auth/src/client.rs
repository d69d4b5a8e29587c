//! OAuth 2.0 HTTP client for Frappe servers
//!
//! Builds the browser authorization URL, exchanges authorization codes,
//! refreshes access tokens, and talks to the revoke/userinfo endpoints.
//! All endpoint URLs come from the [`Discovery`] document derived from the
//! configured base URL.

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::config::AuthConfig;
use crate::discovery::Discovery;
use crate::pkce::PkceChallenge;

/// Network timeout for token and userinfo requests.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Token response from the Frappe token endpoint (RFC 6749).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for API authentication
    pub access_token: String,

    /// Refresh token; some grants do not issue one
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// OpenID Connect ID token
    #[serde(default)]
    pub id_token: Option<String>,

    /// Token type (normally "Bearer")
    #[serde(default)]
    pub token_type: Option<String>,

    /// Access token lifetime in seconds; absent means no known expiry
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// OAuth error body from the authorization server (RFC 6749 §5.2).
#[derive(Debug, Deserialize)]
pub struct OAuthErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

/// Error type for OAuth client operations
#[derive(Debug)]
pub enum OAuthClientError {
    /// HTTP request failed (transport-level)
    RequestFailed(reqwest::Error),

    /// OAuth server returned an error body
    Server(OAuthErrorResponse),

    /// Failed to parse a server response
    Parse(String),

    /// Refresh attempted with an empty refresh token
    NoRefreshToken,
}

impl fmt::Display for OAuthClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestFailed(e) => write!(f, "HTTP request failed: {e}"),
            Self::Server(e) => write!(f, "OAuth error: {e}"),
            Self::Parse(msg) => write!(f, "Parse error: {msg}"),
            Self::NoRefreshToken => write!(f, "No refresh token available"),
        }
    }
}

impl std::error::Error for OAuthClientError {}

impl From<reqwest::Error> for OAuthClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::RequestFailed(err)
    }
}

/// A prepared authorization request: the URL to present in a browser plus
/// the PKCE material needed later for the code exchange.
///
/// The verifier stays inside this value until the exchange; a new request
/// means new PKCE material.
#[derive(Debug, Clone)]
pub struct AuthorizeRequest {
    /// Fully built authorization URL
    pub url: String,

    /// CSRF state token; the callback must echo it back
    pub state: String,

    /// Redirect URI the code will be delivered to
    pub redirect_uri: String,

    pkce: PkceChallenge,
}

impl AuthorizeRequest {
    /// The PKCE code verifier for the pending exchange.
    #[must_use]
    pub fn code_verifier(&self) -> &str {
        &self.pkce.code_verifier
    }

    /// Assemble a request from already-generated PKCE material. Used by
    /// the in-memory test client.
    pub(crate) fn from_parts(url: String, redirect_uri: String, pkce: PkceChallenge) -> Self {
        let state = pkce.state.clone();
        Self { url, state, redirect_uri, pkce }
    }
}

/// OAuth 2.0 client with PKCE support for a Frappe server.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: AuthConfig,
    discovery: Discovery,
    http: Client,
}

impl OAuthClient {
    /// Create a new client; the discovery document is derived from the
    /// configured base URL.
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        let discovery = Discovery::resolve(&config.base_url);
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { config, discovery, http }
    }

    /// Prepare an authorization request with fresh PKCE material.
    ///
    /// The returned value carries the browser URL and the verifier for the
    /// follow-up [`exchange_code`](Self::exchange_code) call. Each call
    /// generates a new verifier; requests are single-use.
    #[must_use]
    pub fn authorization_request(&self) -> AuthorizeRequest {
        let pkce = PkceChallenge::generate();
        let redirect_uri = self.config.redirect_uri();

        let params = [
            ("response_type", "code"),
            ("client_id", &self.config.client_id),
            ("redirect_uri", &redirect_uri),
            ("scope", &self.config.scope_string()),
            ("state", &pkce.state),
            ("code_challenge", &pkce.code_challenge),
            ("code_challenge_method", pkce.challenge_method()),
        ];

        let query = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let url = format!("{}?{}", self.discovery.authorization_endpoint, query);
        let state = pkce.state.clone();

        AuthorizeRequest { url, state, redirect_uri, pkce }
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    /// Returns an error if the exchange fails or the response cannot be
    /// parsed. The response may legitimately omit a refresh token; no
    /// refresh token is fabricated in that case.
    pub async fn exchange_code(
        &self,
        code: &str,
        request: &AuthorizeRequest,
    ) -> Result<TokenResponse, OAuthClientError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", &self.config.client_id),
            ("code", code),
            ("redirect_uri", &request.redirect_uri),
            ("code_verifier", request.code_verifier()),
        ];

        let response = self
            .http
            .post(&self.discovery.token_endpoint)
            .form(&form)
            .send()
            .await?;

        Self::parse_token_response(response).await
    }

    /// Obtain a new access token using a refresh token.
    ///
    /// # Errors
    /// Returns [`OAuthClientError::NoRefreshToken`] without any network
    /// call when the refresh token is empty; otherwise surfaces exchange
    /// failures.
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        if refresh_token.is_empty() {
            return Err(OAuthClientError::NoRefreshToken);
        }

        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", &self.config.client_id),
            ("refresh_token", refresh_token),
        ];

        let response = self
            .http
            .post(&self.discovery.token_endpoint)
            .form(&form)
            .send()
            .await?;

        Self::parse_token_response(response).await
    }

    /// Revoke a token on the server (best-effort companion to sign-out).
    ///
    /// # Errors
    /// Returns an error if the request fails; callers treat revocation as
    /// advisory and clear local state regardless.
    pub async fn revoke_token(&self, token: &str) -> Result<(), OAuthClientError> {
        let form = [("token", token)];

        let response = self
            .http
            .post(&self.discovery.revocation_endpoint)
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let error = Self::parse_error_body(response).await?;
            return Err(OAuthClientError::Server(error));
        }

        Ok(())
    }

    /// Fetch the OpenID profile claims for the current user.
    ///
    /// # Errors
    /// Returns an error if the request fails or the body is not JSON.
    pub async fn fetch_userinfo(
        &self,
        access_token: &str,
    ) -> Result<serde_json::Value, OAuthClientError> {
        let response = self
            .http
            .get(&self.discovery.userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let error = Self::parse_error_body(response).await?;
            return Err(OAuthClientError::Server(error));
        }

        response
            .json()
            .await
            .map_err(|e| OAuthClientError::Parse(e.to_string()))
    }

    /// The discovery document in use.
    #[must_use]
    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    async fn parse_token_response(
        response: reqwest::Response,
    ) -> Result<TokenResponse, OAuthClientError> {
        if !response.status().is_success() {
            let error = Self::parse_error_body(response).await?;
            return Err(OAuthClientError::Server(error));
        }

        response
            .json()
            .await
            .map_err(|e| OAuthClientError::Parse(e.to_string()))
    }

    async fn parse_error_body(
        response: reqwest::Response,
    ) -> Result<OAuthErrorResponse, OAuthClientError> {
        response
            .json()
            .await
            .map_err(|e| OAuthClientError::Parse(e.to_string()))
    }
}
