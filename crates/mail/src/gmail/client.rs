//! Gmail API HTTP client
//!
//! Provides methods for searching and fetching messages from the Gmail API.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use log::debug;

use super::MailProvider;
use super::api::{GmailMessage, ListMessagesResponse};
use crate::error::{Error, Result};

/// Gmail API client bound to one access token
pub struct GmailClient {
    base_url: String,
    access_token: String,
}

impl GmailClient {
    /// Gmail API base URL
    pub const BASE_URL: &'static str = "https://gmail.googleapis.com/gmail/v1";

    /// Create a new Gmail client against the public API
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(Self::BASE_URL, access_token)
    }

    /// Create a client against another API root (e.g. a local fake)
    pub fn with_base_url(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        let mut response = ureq::get(url)
            .header("Authorization", &format!("Bearer {}", self.access_token))
            .call()
            .map_err(|e| Error::provider(format!("Failed to send {what} request"), e))?;

        response
            .body_mut()
            .read_json()
            .map_err(|e| Error::provider(format!("Failed to parse {what} response"), e))
    }
}

impl MailProvider for GmailClient {
    /// List message IDs matching a search query
    ///
    /// # Arguments
    /// * `query` - Gmail search query
    /// * `page_token` - Optional page token for pagination
    fn list_messages(&self, query: &str, page_token: Option<&str>) -> Result<ListMessagesResponse> {
        let mut url = format!(
            "{}/users/me/messages?q={}",
            self.base_url,
            urlencoding::encode(query)
        );

        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
        }

        debug!("Listing messages (page token: {:?})", page_token);
        self.get_json(&url, "list messages")
    }

    /// Get full message details by ID
    fn get_message(&self, id: &str) -> Result<GmailMessage> {
        let url = format!(
            "{}/users/me/messages/{}?format=full",
            self.base_url,
            urlencoding::encode(id)
        );

        self.get_json(&url, "get message")
    }
}
