//! Integration tests for the interactive authorization flow.
//!
//! Runs the full PKCE handshake against a wiremock Frappe token endpoint
//! with scripted interaction drivers standing in for the browser.

use std::sync::Arc;

use async_trait::async_trait;
use frappe_auth::{
    AuthConfig, AuthorizationFlow, AuthorizeRequest, FlowError, FlowOutcome, Interaction,
    InteractionDriver, OAuthClient,
};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_PATH: &str = "/api/method/frappe.integrations.oauth2.get_token";
const AUTHORIZE_PATH: &str = "/api/method/frappe.integrations.oauth2.authorize";

fn client_for(server: &MockServer) -> Arc<OAuthClient> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let config = AuthConfig::new(
        server.uri(),
        "test_client_id",
        vec!["openid".to_string(), "all".to_string()],
        "frappeexpo",
    )
    .expect("test config should validate");
    Arc::new(OAuthClient::new(config))
}

/// Driver that approves immediately, echoing the request's state the way
/// a well-behaved authorization server would.
struct ApprovingDriver {
    code: String,
}

#[async_trait]
impl InteractionDriver for ApprovingDriver {
    async fn present(&self, request: &AuthorizeRequest) -> Interaction {
        assert!(request.url.contains(AUTHORIZE_PATH));
        Interaction::Success { code: self.code.clone(), state: request.state.clone() }
    }
}

/// Driver that simulates the user dismissing the browser.
struct CancellingDriver;

#[async_trait]
impl InteractionDriver for CancellingDriver {
    async fn present(&self, _request: &AuthorizeRequest) -> Interaction {
        Interaction::Cancelled
    }
}

/// Driver that returns a state value the request never issued.
struct ForgedStateDriver;

#[async_trait]
impl InteractionDriver for ForgedStateDriver {
    async fn present(&self, _request: &AuthorizeRequest) -> Interaction {
        Interaction::Success {
            code: "code_123".to_string(),
            state: "forged_state".to_string(),
        }
    }
}

/// Validates the full happy path: authorize URL presented, code returned,
/// exchanged at the token endpoint.
///
/// Assertions:
/// - Ensures the exchange is a `grant_type=authorization_code` form post
///   carrying the code, the app-scheme redirect URI, and a PKCE verifier.
/// - Ensures the flow resolves to `FlowOutcome::Tokens`.
#[tokio::test]
async fn test_flow_exchanges_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=code_123"))
        .and(body_string_contains("code_verifier="))
        .and(body_string_contains("client_id=test_client_id"))
        .and(body_string_contains("redirect_uri=frappeexpo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "flow_access",
            "refresh_token": "flow_refresh",
            "id_token": "flow_id",
            "token_type": "Bearer",
            "expires_in": 3600,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let flow = AuthorizationFlow::new(
        client_for(&server),
        Arc::new(ApprovingDriver { code: "code_123".to_string() }),
    );

    match flow.run().await {
        FlowOutcome::Tokens(tokens) => {
            assert_eq!(tokens.access_token, "flow_access");
            assert_eq!(tokens.refresh_token.as_deref(), Some("flow_refresh"));
            assert_eq!(tokens.id_token.as_deref(), Some("flow_id"));
            assert_eq!(tokens.expires_in, Some(3600));
        }
        other => panic!("expected tokens, got {other:?}"),
    }
}

/// Validates the user-cancel scenario: the flow resolves to `Cancelled`
/// and the token endpoint sees no traffic.
#[tokio::test]
async fn test_flow_cancel_skips_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let flow = AuthorizationFlow::new(client_for(&server), Arc::new(CancellingDriver));

    assert!(matches!(flow.run().await, FlowOutcome::Cancelled));
}

/// Validates the CSRF guard: a callback with a state the request never
/// issued fails before any code exchange.
#[tokio::test]
async fn test_flow_state_mismatch_skips_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let flow = AuthorizationFlow::new(client_for(&server), Arc::new(ForgedStateDriver));

    assert!(matches!(
        flow.run().await,
        FlowOutcome::Failed(FlowError::StateMismatch { .. })
    ));
}

/// Validates the rejected-exchange scenario: a 400 from the token
/// endpoint resolves to a terminal exchange failure.
#[tokio::test]
async fn test_flow_exchange_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Code expired",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let flow = AuthorizationFlow::new(
        client_for(&server),
        Arc::new(ApprovingDriver { code: "stale_code".to_string() }),
    );

    assert!(matches!(
        flow.run().await,
        FlowOutcome::Failed(FlowError::Exchange(_))
    ));
}
