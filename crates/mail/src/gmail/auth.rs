//! Gmail OAuth2 authentication
//!
//! Implements the authorization code flow for a web client whose redirect
//! URI points back at this process. The resulting credential lives only in
//! memory: every restart needs a fresh consent.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Deserialize;
use std::fmt;
use url::Url;

use crate::config::GmailCredentials;
use crate::error::{Error, Result};

/// Read-only access to the mailbox
pub const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";

/// Access/refresh token pair for one mailbox
#[derive(Clone)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub scope: Option<String>,
}

impl Credential {
    /// Create a credential from a bare access token
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            scope: None,
        }
    }

    /// Whether the provider-reported expiry has passed
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Token response from Google
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    scope: Option<String>,
    #[allow(dead_code)]
    token_type: Option<String>,
}

/// OAuth2 client configuration for Gmail
pub struct GmailAuth {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_uri: String,
    token_uri: String,
}

impl GmailAuth {
    /// Create a new GmailAuth instance
    ///
    /// The credentials must carry a redirect URI; see
    /// [`GmailCredentials::with_default_redirect`].
    pub fn new(credentials: GmailCredentials) -> Result<Self> {
        let redirect_uri = credentials
            .redirect_uri
            .ok_or_else(|| Error::Config("no OAuth redirect URI configured".to_string()))?;

        Ok(Self {
            client_id: credentials.client_id,
            client_secret: credentials.client_secret,
            redirect_uri,
            auth_uri: credentials.auth_uri,
            token_uri: credentials.token_uri,
        })
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Build the consent page URL requesting the given scopes
    pub fn authorization_url(&self, scopes: &[&str]) -> Result<String> {
        let scope = scopes.join(" ");
        let url = Url::parse_with_params(
            &self.auth_uri,
            [
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
            ],
        )
        .map_err(|e| Error::Config(format!("invalid auth URI {}: {e}", self.auth_uri)))?;

        Ok(url.into())
    }

    /// Exchange an authorization code for a credential
    pub fn exchange_code(&self, code: &str) -> Result<Credential> {
        if code.is_empty() {
            return Err(Error::Auth("empty authorization code".to_string()));
        }

        debug!("Exchanging authorization code at {}", self.token_uri);
        let mut response = ureq::post(&self.token_uri)
            .send_form([
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .map_err(|e| match e {
                ureq::Error::StatusCode(status) => Error::Auth(format!(
                    "token endpoint rejected the authorization code (HTTP {status})"
                )),
                other => Error::Auth(format!("token request failed: {other}")),
            })?;

        let token: TokenResponse = response
            .body_mut()
            .read_json()
            .map_err(|e| Error::Auth(format!("Failed to parse token response: {e}")))?;

        let credential = Credential {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: token
                .expires_in
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
            scope: token.scope,
        };

        info!(
            "Authorization successful (refresh token: {})",
            if credential.refresh_token.is_some() { "yes" } else { "no" }
        );
        Ok(credential)
    }
}
