//! OAuth endpoint discovery for Frappe servers
//!
//! Frappe exposes its OAuth 2.0 endpoints under a fixed path convention,
//! so the discovery document is derived from the base server URL by
//! concatenation rather than fetched over the network.

const AUTHORIZE_SUFFIX: &str = "/api/method/frappe.integrations.oauth2.authorize";
const TOKEN_SUFFIX: &str = "/api/method/frappe.integrations.oauth2.get_token";
const REVOKE_SUFFIX: &str = "/api/method/frappe.integrations.oauth2.revoke_token";
const USERINFO_SUFFIX: &str = "/api/method/frappe.integrations.oauth2.openid_profile";

/// The four endpoint URLs an OAuth client needs against a Frappe server.
///
/// Resolution is a pure string operation with no failure mode: a malformed
/// base URL simply yields malformed endpoints. The base URL is validated
/// once at configuration time (see [`crate::config::AuthConfig`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    /// Interactive authorization endpoint (browser-facing)
    pub authorization_endpoint: String,

    /// Token endpoint for code exchange and refresh grants
    pub token_endpoint: String,

    /// Token revocation endpoint
    pub revocation_endpoint: String,

    /// OpenID Connect userinfo (profile) endpoint
    pub userinfo_endpoint: String,
}

impl Discovery {
    /// Derive the discovery document from a base server URL.
    ///
    /// # Examples
    /// ```
    /// use frappe_auth::discovery::Discovery;
    ///
    /// let discovery = Discovery::resolve("https://erp.example.com");
    /// assert_eq!(
    ///     discovery.authorization_endpoint,
    ///     "https://erp.example.com/api/method/frappe.integrations.oauth2.authorize"
    /// );
    /// ```
    #[must_use]
    pub fn resolve(base_url: &str) -> Self {
        Self {
            authorization_endpoint: format!("{base_url}{AUTHORIZE_SUFFIX}"),
            token_endpoint: format!("{base_url}{TOKEN_SUFFIX}"),
            revocation_endpoint: format!("{base_url}{REVOKE_SUFFIX}"),
            userinfo_endpoint: format!("{base_url}{USERINFO_SUFFIX}"),
        }
    }
}
