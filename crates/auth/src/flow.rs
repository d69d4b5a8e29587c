//! Interactive PKCE authorization flow
//!
//! Drives one authorization attempt end to end: prepare a request with
//! fresh PKCE material, hand the URL to the interaction driver, and
//! exchange the returned code for tokens. Each attempt is independent; a
//! non-success outcome leaves the flow ready for a fresh attempt.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::client::{OAuthClientError, TokenResponse};
use crate::traits::{Interaction, InteractionDriver, OAuthClientTrait};

/// Error detail for a failed authorization attempt.
#[derive(Debug)]
pub enum FlowError {
    /// Callback state did not match the request state (possible CSRF)
    StateMismatch {
        expected: String,
        received: String,
    },

    /// The interactive step failed before a code was obtained
    Interaction(String),

    /// The code exchange at the token endpoint failed
    Exchange(OAuthClientError),
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StateMismatch { expected, received } => {
                write!(f, "State mismatch (CSRF): expected {expected}, received {received}")
            }
            Self::Interaction(msg) => write!(f, "Authorization interaction failed: {msg}"),
            Self::Exchange(e) => write!(f, "Code exchange failed: {e}"),
        }
    }
}

impl std::error::Error for FlowError {}

/// Terminal outcome of one authorization attempt.
#[derive(Debug)]
pub enum FlowOutcome {
    /// Tokens obtained; the attempt succeeded. The response may
    /// legitimately omit a refresh token, in which case future expiry
    /// requires full re-authentication.
    Tokens(TokenResponse),

    /// User dismissed the authorization UI. Not an error; callers should
    /// re-offer login.
    Cancelled,

    /// The attempt failed (interaction, CSRF, or exchange fault).
    Failed(FlowError),
}

/// One-shot driver for the authorization-code-with-PKCE handshake.
pub struct AuthorizationFlow<C, D> {
    client: Arc<C>,
    driver: Arc<D>,
}

impl<C, D> AuthorizationFlow<C, D>
where
    C: OAuthClientTrait,
    D: InteractionDriver,
{
    /// Create a flow over an OAuth client and an interaction driver.
    #[must_use]
    pub fn new(client: Arc<C>, driver: Arc<D>) -> Self {
        Self { client, driver }
    }

    /// Run one authorization attempt to a terminal outcome.
    ///
    /// Generates fresh PKCE material, presents the authorization URL via
    /// the driver, and exchanges the returned code. The attempt never
    /// hangs: cancellation and interaction failures resolve to their
    /// respective outcomes.
    pub async fn run(&self) -> FlowOutcome {
        let request = self.client.authorization_request();
        debug!(state = %request.state, "Prepared authorization request");

        match self.driver.present(&request).await {
            Interaction::Success { code, state } => {
                if state != request.state {
                    warn!("Authorization callback state mismatch");
                    return FlowOutcome::Failed(FlowError::StateMismatch {
                        expected: request.state,
                        received: state,
                    });
                }

                match self.client.exchange_code(&code, &request).await {
                    Ok(tokens) => {
                        info!("Authorization code exchanged for tokens");
                        FlowOutcome::Tokens(tokens)
                    }
                    Err(e) => {
                        warn!("Code exchange failed: {e}");
                        FlowOutcome::Failed(FlowError::Exchange(e))
                    }
                }
            }
            Interaction::Cancelled => {
                debug!("Authorization cancelled by user");
                FlowOutcome::Cancelled
            }
            Interaction::Failed(msg) => {
                warn!("Authorization interaction failed: {msg}");
                FlowOutcome::Failed(FlowError::Interaction(msg))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for flow.
    use super::*;
    use crate::testing::{MockDriverOutcome, MockInteractionDriver, MockOAuthClient};

    fn flow_with(
        driver_outcome: MockDriverOutcome,
    ) -> AuthorizationFlow<MockOAuthClient, MockInteractionDriver> {
        let client = Arc::new(MockOAuthClient::new());
        let driver = Arc::new(MockInteractionDriver::new(driver_outcome));
        AuthorizationFlow::new(client, driver)
    }

    /// Validates `AuthorizationFlow::run` behavior for the happy-path
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures the flow reaches `FlowOutcome::Tokens`.
    /// - Confirms the exchanged code was passed through to the client.
    #[tokio::test]
    async fn test_flow_success() {
        let client = Arc::new(MockOAuthClient::new());
        let driver = Arc::new(MockInteractionDriver::new(MockDriverOutcome::Approve {
            code: "code_123".to_string(),
        }));
        let flow = AuthorizationFlow::new(client.clone(), driver);

        match flow.run().await {
            FlowOutcome::Tokens(tokens) => {
                assert_eq!(tokens.access_token, "mock_access_token");
            }
            other => panic!("expected tokens, got {other:?}"),
        }
        assert_eq!(client.last_exchanged_code(), Some("code_123".to_string()));
    }

    /// Validates `AuthorizationFlow::run` behavior for the user-cancel
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures the outcome is `Cancelled` and no exchange was attempted.
    #[tokio::test]
    async fn test_flow_cancelled() {
        let client = Arc::new(MockOAuthClient::new());
        let driver = Arc::new(MockInteractionDriver::new(MockDriverOutcome::Cancel));
        let flow = AuthorizationFlow::new(client.clone(), driver);

        assert!(matches!(flow.run().await, FlowOutcome::Cancelled));
        assert_eq!(client.exchange_calls(), 0);
    }

    /// Validates `AuthorizationFlow::run` behavior for the state-mismatch
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures the outcome is `Failed(FlowError::StateMismatch { .. })`.
    /// - Ensures no exchange was attempted with the forged callback.
    #[tokio::test]
    async fn test_flow_state_mismatch() {
        let client = Arc::new(MockOAuthClient::new());
        let driver = Arc::new(MockInteractionDriver::new(MockDriverOutcome::ApproveWithState {
            code: "code_123".to_string(),
            state: "forged_state".to_string(),
        }));
        let flow = AuthorizationFlow::new(client.clone(), driver);

        assert!(matches!(
            flow.run().await,
            FlowOutcome::Failed(FlowError::StateMismatch { .. })
        ));
        assert_eq!(client.exchange_calls(), 0);
    }

    /// Validates `AuthorizationFlow::run` behavior for the interaction
    /// failure scenario.
    #[tokio::test]
    async fn test_flow_interaction_failure() {
        let flow = flow_with(MockDriverOutcome::Fail("browser crashed".to_string()));

        assert!(matches!(
            flow.run().await,
            FlowOutcome::Failed(FlowError::Interaction(_))
        ));
    }

    /// Validates `AuthorizationFlow::run` behavior for the exchange failure
    /// scenario: a server fault during exchange is terminal-non-success.
    #[tokio::test]
    async fn test_flow_exchange_failure() {
        let client = Arc::new(MockOAuthClient::new());
        client.fail_exchange();
        let driver = Arc::new(MockInteractionDriver::new(MockDriverOutcome::Approve {
            code: "code_123".to_string(),
        }));
        let flow = AuthorizationFlow::new(client, driver);

        assert!(matches!(
            flow.run().await,
            FlowOutcome::Failed(FlowError::Exchange(_))
        ));
    }
}
