//! Traits at the crate's two external seams
//!
//! These abstract the OAuth server and the interactive browser context so
//! the flow and session manager can be tested with mock implementations.

use async_trait::async_trait;

use crate::client::{AuthorizeRequest, OAuthClientError, TokenResponse};

/// Trait for OAuth client operations.
///
/// Implemented by [`crate::client::OAuthClient`] and by test mocks.
#[async_trait]
pub trait OAuthClientTrait: Send + Sync {
    /// Prepare an authorization request with fresh PKCE material.
    fn authorization_request(&self) -> AuthorizeRequest;

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    /// Returns an error if the exchange fails or the response is
    /// unparseable.
    async fn exchange_code(
        &self,
        code: &str,
        request: &AuthorizeRequest,
    ) -> Result<TokenResponse, OAuthClientError>;

    /// Obtain a new access token using a refresh token.
    ///
    /// # Errors
    /// Returns an error if the refresh token is empty, invalid, or the
    /// exchange fails.
    async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError>;
}

#[async_trait]
impl OAuthClientTrait for crate::client::OAuthClient {
    fn authorization_request(&self) -> AuthorizeRequest {
        self.authorization_request()
    }

    async fn exchange_code(
        &self,
        code: &str,
        request: &AuthorizeRequest,
    ) -> Result<TokenResponse, OAuthClientError> {
        self.exchange_code(code, request).await
    }

    async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        self.refresh_token(refresh_token).await
    }
}

/// Outcome of presenting an authorization URL to the user.
#[derive(Debug, Clone)]
pub enum Interaction {
    /// User completed authorization; the callback carried a code and the
    /// echoed state parameter.
    Success {
        /// Authorization code from the callback
        code: String,
        /// State parameter from the callback
        state: String,
    },

    /// User dismissed the browser/webview. Not an error.
    Cancelled,

    /// The interaction failed (transport or presentation error).
    Failed(String),
}

/// Trait for the interactive browser-presentation collaborator.
///
/// Given a prepared authorization request (which carries the URL to open),
/// the driver suspends until the user completes, cancels, or the
/// interaction fails. Cancellation must resolve rather than hang.
#[async_trait]
pub trait InteractionDriver: Send + Sync {
    /// Present the authorization URL and wait for the callback.
    async fn present(&self, request: &AuthorizeRequest) -> Interaction;
}
