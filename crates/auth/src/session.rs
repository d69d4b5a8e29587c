//! Session lifecycle management
//!
//! Holds the in-memory authentication state, persists it through a
//! [`CredentialStore`], and keeps it fresh through an
//! [`OAuthClientTrait`]. All lifecycle operations are infallible from the
//! caller's view: network and storage faults degrade the session to
//! signed-out (or leave the prior state intact for persistence faults)
//! rather than surfacing errors. Observers registered via
//! [`SessionManager::subscribe`] are notified synchronously after every
//! completed state change.

use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::client::TokenResponse;
use crate::store::{CredentialStore, StoredCredentials};
use crate::traits::OAuthClientTrait;

/// Observer invoked with each new session state.
pub type SessionListener = Box<dyn Fn(&Session) + Send + Sync>;

/// A point-in-time view of the authentication state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Bearer access token; presence defines "authenticated"
    pub access_token: Option<String>,

    /// Refresh token for silent renewal
    pub refresh_token: Option<String>,

    /// OpenID Connect ID token; held in memory only, never persisted
    pub id_token: Option<String>,

    /// Absolute expiry of the access token; absent means no known expiry
    pub expires_at: Option<DateTime<Utc>>,

    /// True while a restore is in progress
    pub is_loading: bool,
}

impl Session {
    /// The signed-out state.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The initial state: signed out, restore pending.
    #[must_use]
    pub fn loading() -> Self {
        Self { is_loading: true, ..Self::default() }
    }

    /// Whether the session holds an access token. Expiry does not factor
    /// in; an expired-but-present token still reads as authenticated until
    /// a refresh or sign-out replaces it.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Whether the access token's known expiry has passed. A session with
    /// no known expiry never reads as expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() > at)
    }
}

/// Tokens handed to [`SessionManager::sign_in`] after a completed
/// authorization flow.
#[derive(Debug, Clone)]
pub struct SignInTokens {
    /// Bearer access token
    pub access_token: String,

    /// Refresh token, when the grant issued one
    pub refresh_token: Option<String>,

    /// OpenID Connect ID token
    pub id_token: Option<String>,

    /// Access token lifetime in seconds; absent means no known expiry
    pub expires_in: Option<i64>,
}

impl From<TokenResponse> for SignInTokens {
    fn from(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            id_token: response.id_token,
            expires_in: response.expires_in,
        }
    }
}

/// Manages the session lifecycle: restore on launch, sign-in after an
/// authorization flow, silent refresh, and sign-out.
pub struct SessionManager<C, S> {
    client: Arc<C>,
    store: Arc<S>,
    state: RwLock<Session>,
    listeners: StdMutex<Vec<SessionListener>>,
    // Serializes refresh attempts so concurrent callers do not each spend
    // a (single-use) refresh token.
    refresh_guard: Mutex<()>,
}

impl<C, S> SessionManager<C, S>
where
    C: OAuthClientTrait,
    S: CredentialStore,
{
    /// Create a manager in the loading state. Call
    /// [`restore`](Self::restore) next to resolve it.
    #[must_use]
    pub fn new(client: Arc<C>, store: Arc<S>) -> Self {
        Self {
            client,
            store,
            state: RwLock::new(Session::loading()),
            listeners: StdMutex::new(Vec::new()),
            refresh_guard: Mutex::new(()),
        }
    }

    /// Register an observer called synchronously after every completed
    /// state change, with the new state.
    pub fn subscribe(&self, listener: impl Fn(&Session) + Send + Sync + 'static) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push(Box::new(listener));
        }
    }

    /// The current session state.
    pub async fn snapshot(&self) -> Session {
        self.state.read().await.clone()
    }

    /// The current access token, if authenticated.
    pub async fn access_token(&self) -> Option<String> {
        self.state.read().await.access_token.clone()
    }

    /// Whether the session currently holds an access token.
    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    /// Whether a restore is still in progress.
    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }

    /// Restore the session from persistent storage, typically on app
    /// launch.
    ///
    /// An unexpired stored record becomes the authenticated session
    /// directly. An expired record with a refresh token triggers one
    /// silent refresh; on failure the session ends up signed out with
    /// storage cleared, never in an error state. Always ends with
    /// `is_loading` false.
    pub async fn restore(&self) {
        let record = match self.store.load().await {
            Ok(record) => record,
            Err(e) => {
                warn!("Failed to read stored session: {e}");
                None
            }
        };

        let Some(record) = record else {
            debug!("No stored session");
            self.set_state(Session::empty()).await;
            return;
        };

        let expired = record.expires_at.is_some_and(|at| Utc::now() > at);
        if !expired {
            info!("Restored session from storage");
            self.set_state(Session {
                access_token: Some(record.access_token),
                refresh_token: record.refresh_token,
                id_token: None,
                expires_at: record.expires_at,
                is_loading: false,
            })
            .await;
            return;
        }

        let Some(refresh_token) = record.refresh_token else {
            debug!("Stored session expired with no refresh token");
            self.clear_storage().await;
            self.set_state(Session::empty()).await;
            return;
        };

        debug!("Stored session expired, attempting silent refresh");
        let prior = Session {
            access_token: None,
            refresh_token: Some(refresh_token.clone()),
            id_token: None,
            expires_at: record.expires_at,
            is_loading: true,
        };

        match self.client.refresh_token(&refresh_token).await {
            Ok(response) => {
                let next = merge_refresh(response, &prior);
                self.persist(&next).await;
                info!("Silent refresh succeeded");
                self.set_state(next).await;
            }
            Err(e) => {
                warn!("Silent refresh failed: {e}");
                self.clear_storage().await;
                self.set_state(Session::empty()).await;
            }
        }
    }

    /// Install tokens from a completed authorization flow as the
    /// authenticated session and persist them.
    ///
    /// The expiry is computed as now plus the server-reported lifetime; a
    /// response without a lifetime yields a session with no known expiry.
    /// Persistence is best-effort: a storage fault leaves the in-memory
    /// session authenticated for the current run.
    pub async fn sign_in(&self, tokens: impl Into<SignInTokens>) {
        let tokens = tokens.into();
        let expires_at = tokens.expires_in.map(|secs| Utc::now() + Duration::seconds(secs));

        let next = Session {
            access_token: Some(tokens.access_token),
            refresh_token: tokens.refresh_token,
            id_token: tokens.id_token,
            expires_at,
            is_loading: false,
        };

        self.persist(&next).await;
        info!("Signed in");
        self.set_state(next).await;
    }

    /// Clear the session and all persisted credential material.
    /// Idempotent; signing out while signed out is a no-op that still
    /// notifies observers.
    pub async fn sign_out(&self) {
        self.clear_storage().await;
        debug!("Signed out");
        self.set_state(Session::empty()).await;
    }

    /// Obtain a fresh access token using the stored refresh token.
    ///
    /// With no refresh token in the session, clears everything without a
    /// network call, leaving the session signed out. On a successful
    /// refresh the new tokens replace the old, keeping the prior refresh
    /// and ID tokens when the response omits them; the expiry is
    /// recomputed from the response alone. Any refresh failure degrades
    /// to signed-out with storage cleared.
    ///
    /// Concurrent calls are single-flight: callers that were waiting
    /// behind a completed refresh observe the new token instead of
    /// spending the refresh token again.
    pub async fn refresh_access_token(&self) {
        let entry_access = self.state.read().await.access_token.clone();

        let _flight = self.refresh_guard.lock().await;

        let current = self.state.read().await.clone();
        if current.access_token.is_some() && current.access_token != entry_access {
            debug!("Skipping refresh, session was refreshed while waiting");
            return;
        }

        let Some(refresh_token) = current.refresh_token.clone() else {
            warn!("No refresh token available, sign-in required");
            self.clear_storage().await;
            self.set_state(Session::empty()).await;
            return;
        };

        match self.client.refresh_token(&refresh_token).await {
            Ok(response) => {
                let next = merge_refresh(response, &current);
                self.persist(&next).await;
                info!("Access token refreshed");
                self.set_state(next).await;
            }
            Err(e) => {
                warn!("Token refresh failed, signing out: {e}");
                self.clear_storage().await;
                self.set_state(Session::empty()).await;
            }
        }
    }

    async fn persist(&self, session: &Session) {
        let Some(access_token) = &session.access_token else {
            return;
        };

        let record = StoredCredentials {
            access_token: access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            expires_at: session.expires_at,
        };

        if let Err(e) = self.store.store(&record).await {
            warn!("Failed to persist session: {e}");
        }
    }

    async fn clear_storage(&self) {
        if let Err(e) = self.store.clear().await {
            warn!("Failed to clear stored session: {e}");
        }
    }

    async fn set_state(&self, next: Session) {
        {
            let mut state = self.state.write().await;
            *state = next.clone();
        }

        if let Ok(listeners) = self.listeners.lock() {
            for listener in listeners.iter() {
                listener(&next);
            }
        }
    }
}

/// Merge a refresh response into the session it renews. The response wins
/// for every field it carries; the prior refresh and ID tokens survive
/// when the response omits them. The expiry comes from the response
/// alone.
fn merge_refresh(response: TokenResponse, prior: &Session) -> Session {
    Session {
        access_token: Some(response.access_token),
        refresh_token: response.refresh_token.or_else(|| prior.refresh_token.clone()),
        id_token: response.id_token.or_else(|| prior.id_token.clone()),
        expires_at: response.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        is_loading: false,
    }
}
