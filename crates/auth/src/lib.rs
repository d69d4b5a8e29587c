//! OAuth 2.0 session and token lifecycle management for Frappe servers.
//!
//! Implements the authorization-code-with-PKCE flow against a Frappe
//! server's OAuth endpoints and manages the resulting session: restore on
//! launch, silent refresh, secure persistence, and sign-out.
//!
//! # Architecture
//!
//! - [`config`]: validated client configuration (base URL, client ID,
//!   scopes, redirect scheme)
//! - [`discovery`]: endpoint resolution from the server base URL
//! - [`pkce`]: PKCE verifier/challenge/state generation (RFC 7636, S256)
//! - [`client`]: HTTP client for the authorize, token, revoke, and
//!   userinfo endpoints
//! - [`flow`]: one-shot interactive authorization driver
//! - [`session`]: the session state machine and its observers
//! - [`store`]: credential persistence (platform keychain or file
//!   fallback)
//!
//! The platform keychain backend is behind the default `keychain`
//! feature; disable it for environments where only the file store
//! applies.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod client;
pub mod config;
pub mod discovery;
pub mod flow;
pub mod pkce;
pub mod session;
pub mod store;
pub mod traits;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export the types an embedding application wires together
// ------------------------
pub use client::{AuthorizeRequest, OAuthClient, OAuthClientError, OAuthErrorResponse, TokenResponse};
pub use config::{AuthConfig, ConfigError};
pub use discovery::Discovery;
pub use flow::{AuthorizationFlow, FlowError, FlowOutcome};
pub use pkce::PkceChallenge;
pub use session::{Session, SessionListener, SessionManager, SignInTokens};
pub use store::{CredentialStore, FileCredentialStore, StoreError, StoredCredentials};
#[cfg(feature = "keychain")]
pub use store::KeychainCredentialStore;
pub use traits::{Interaction, InteractionDriver, OAuthClientTrait};
