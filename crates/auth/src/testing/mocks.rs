//! Mock implementations of the crate's seam traits
//!
//! These avoid platform keychain prompts and network calls, making session
//! and flow behavior deterministic under test.

// Mocks are deliberately simple; errors are evident from return types,
// and a poisoned lock in test support should panic.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::client::{AuthorizeRequest, OAuthClientError, OAuthErrorResponse, TokenResponse};
use crate::pkce::PkceChallenge;
use crate::store::{CredentialStore, StoreError, StoredCredentials};
use crate::traits::{Interaction, InteractionDriver, OAuthClientTrait};

fn server_error(error: &str) -> OAuthClientError {
    OAuthClientError::Server(OAuthErrorResponse {
        error: error.to_string(),
        error_description: None,
    })
}

/// Mock OAuth client that simulates exchanges without network calls.
#[derive(Clone)]
pub struct MockOAuthClient {
    exchange_response: Arc<Mutex<Option<TokenResponse>>>,
    refresh_response: Arc<Mutex<Option<TokenResponse>>>,
    exchange_fails: Arc<AtomicBool>,
    refresh_fails: Arc<AtomicBool>,
    exchange_calls: Arc<AtomicUsize>,
    refresh_calls: Arc<AtomicUsize>,
    last_exchanged_code: Arc<Mutex<Option<String>>>,
    last_refresh_token: Arc<Mutex<Option<String>>>,
}

impl MockOAuthClient {
    /// Create a mock with default token responses.
    #[must_use]
    pub fn new() -> Self {
        Self {
            exchange_response: Arc::new(Mutex::new(None)),
            refresh_response: Arc::new(Mutex::new(None)),
            exchange_fails: Arc::new(AtomicBool::new(false)),
            refresh_fails: Arc::new(AtomicBool::new(false)),
            exchange_calls: Arc::new(AtomicUsize::new(0)),
            refresh_calls: Arc::new(AtomicUsize::new(0)),
            last_exchanged_code: Arc::new(Mutex::new(None)),
            last_refresh_token: Arc::new(Mutex::new(None)),
        }
    }

    /// Configure the response returned by `exchange_code`.
    pub fn set_exchange_response(&self, tokens: TokenResponse) {
        *self.exchange_response.lock().unwrap() = Some(tokens);
    }

    /// Configure the response returned by `refresh_token`.
    pub fn set_refresh_response(&self, tokens: TokenResponse) {
        *self.refresh_response.lock().unwrap() = Some(tokens);
    }

    /// Make `exchange_code` fail with a server error.
    pub fn fail_exchange(&self) {
        self.exchange_fails.store(true, Ordering::SeqCst);
    }

    /// Make `refresh_token` fail with a server error.
    pub fn fail_refresh(&self) {
        self.refresh_fails.store(true, Ordering::SeqCst);
    }

    /// Number of `exchange_code` calls observed.
    #[must_use]
    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    /// Number of `refresh_token` calls observed.
    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// The last authorization code passed to `exchange_code`.
    #[must_use]
    pub fn last_exchanged_code(&self) -> Option<String> {
        self.last_exchanged_code.lock().unwrap().clone()
    }

    /// The last refresh token passed to `refresh_token`.
    #[must_use]
    pub fn last_refresh_token(&self) -> Option<String> {
        self.last_refresh_token.lock().unwrap().clone()
    }

    fn default_exchange_response() -> TokenResponse {
        TokenResponse {
            access_token: "mock_access_token".to_string(),
            refresh_token: Some("mock_refresh_token".to_string()),
            id_token: Some("mock_id_token".to_string()),
            token_type: Some("Bearer".to_string()),
            expires_in: Some(3600),
        }
    }

    fn default_refresh_response() -> TokenResponse {
        TokenResponse {
            access_token: "refreshed_access_token".to_string(),
            refresh_token: None,
            id_token: None,
            token_type: Some("Bearer".to_string()),
            expires_in: Some(3600),
        }
    }
}

impl Default for MockOAuthClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OAuthClientTrait for MockOAuthClient {
    fn authorization_request(&self) -> AuthorizeRequest {
        let pkce = PkceChallenge::generate();
        let url = format!("https://mock.example.com/authorize?state={}", pkce.state);
        AuthorizeRequest::from_parts(url, "mockapp://auth/callback".to_string(), pkce)
    }

    async fn exchange_code(
        &self,
        code: &str,
        _request: &AuthorizeRequest,
    ) -> Result<TokenResponse, OAuthClientError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_exchanged_code.lock().unwrap() = Some(code.to_string());

        if self.exchange_fails.load(Ordering::SeqCst) {
            return Err(server_error("invalid_grant"));
        }

        Ok(self
            .exchange_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(Self::default_exchange_response))
    }

    async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthClientError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_refresh_token.lock().unwrap() = Some(refresh_token.to_string());

        if self.refresh_fails.load(Ordering::SeqCst) {
            return Err(server_error("invalid_grant"));
        }

        Ok(self
            .refresh_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(Self::default_refresh_response))
    }
}

/// Mock credential store holding at most one record in memory.
#[derive(Clone)]
pub struct MockCredentialStore {
    record: Arc<Mutex<Option<StoredCredentials>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    store_calls: Arc<AtomicUsize>,
    clear_calls: Arc<AtomicUsize>,
}

impl MockCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            record: Arc::new(Mutex::new(None)),
            fail_reads: Arc::new(AtomicBool::new(false)),
            fail_writes: Arc::new(AtomicBool::new(false)),
            store_calls: Arc::new(AtomicUsize::new(0)),
            clear_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a store pre-seeded with a record.
    #[must_use]
    pub fn with_record(record: StoredCredentials) -> Self {
        let store = Self::new();
        *store.record.lock().unwrap() = Some(record);
        store
    }

    /// The currently persisted record, if any.
    #[must_use]
    pub fn stored(&self) -> Option<StoredCredentials> {
        self.record.lock().unwrap().clone()
    }

    /// Make reads fail with an access error.
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    /// Make writes fail with an access error.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Number of `store` calls observed.
    #[must_use]
    pub fn store_calls(&self) -> usize {
        self.store_calls.load(Ordering::SeqCst)
    }

    /// Number of `clear` calls observed.
    #[must_use]
    pub fn clear_calls(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for MockCredentialStore {
    async fn store(&self, record: &StoredCredentials) -> Result<(), StoreError> {
        self.store_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::AccessFailed("mock write failure".to_string()));
        }

        *self.record.lock().unwrap() = Some(record.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<StoredCredentials>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::AccessFailed("mock read failure".to_string()));
        }

        Ok(self.record.lock().unwrap().clone())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        *self.record.lock().unwrap() = None;
        Ok(())
    }
}

/// Scripted outcome for [`MockInteractionDriver`].
#[derive(Debug, Clone)]
pub enum MockDriverOutcome {
    /// Complete authorization with a code, echoing the request's state
    Approve { code: String },

    /// Complete authorization with a code and an explicit (possibly
    /// forged) state
    ApproveWithState { code: String, state: String },

    /// Dismiss the authorization UI
    Cancel,

    /// Fail the interaction
    Fail(String),
}

/// Mock interaction driver that resolves immediately with a scripted
/// outcome.
pub struct MockInteractionDriver {
    outcome: Mutex<MockDriverOutcome>,
    presented_urls: Mutex<Vec<String>>,
}

impl MockInteractionDriver {
    /// Create a driver with the given scripted outcome.
    #[must_use]
    pub fn new(outcome: MockDriverOutcome) -> Self {
        Self { outcome: Mutex::new(outcome), presented_urls: Mutex::new(Vec::new()) }
    }

    /// Authorization URLs this driver was asked to present.
    #[must_use]
    pub fn presented_urls(&self) -> Vec<String> {
        self.presented_urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl InteractionDriver for MockInteractionDriver {
    async fn present(&self, request: &AuthorizeRequest) -> Interaction {
        self.presented_urls.lock().unwrap().push(request.url.clone());

        match self.outcome.lock().unwrap().clone() {
            MockDriverOutcome::Approve { code } => Interaction::Success {
                code,
                state: request.state.clone(),
            },
            MockDriverOutcome::ApproveWithState { code, state } => {
                Interaction::Success { code, state }
            }
            MockDriverOutcome::Cancel => Interaction::Cancelled,
            MockDriverOutcome::Fail(msg) => Interaction::Failed(msg),
        }
    }
}
