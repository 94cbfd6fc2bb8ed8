//! Gmail API integration
//!
//! This module provides:
//! - OAuth2 authorization code flow
//! - Gmail API client for searching and fetching messages
//! - Body extraction from fetched messages
//! - The [`MailProvider`] seam the export pipeline is written against

mod auth;
mod client;
mod extract;
#[cfg(any(test, feature = "test-util"))]
mod memory;

pub use auth::{Credential, GMAIL_READONLY_SCOPE, GmailAuth};
pub use client::GmailClient;
pub use extract::{DecodedBody, MULTIPART_ALTERNATIVE, extract_body};
#[cfg(any(test, feature = "test-util"))]
pub use memory::{InMemoryProvider, alternative_message, plain_message};

use crate::error::Result;

/// Source of search results and full messages
///
/// Implemented by [`GmailClient`] for the real API and by
/// `InMemoryProvider` for tests.
pub trait MailProvider: Send + Sync {
    /// Fetch one page of search results
    fn list_messages(&self, query: &str, page_token: Option<&str>)
    -> Result<api::ListMessagesResponse>;

    /// Fetch a full message by ID
    fn get_message(&self, id: &str) -> Result<api::GmailMessage>;
}

/// Gmail API response types
pub mod api {
    use serde::{Deserialize, Serialize};

    /// Response from listing messages
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ListMessagesResponse {
        pub messages: Option<Vec<MessageRef>>,
        pub next_page_token: Option<String>,
        pub result_size_estimate: Option<u32>,
    }

    impl ListMessagesResponse {
        /// Whether the provider explicitly reported that nothing matched
        pub fn is_empty_result(&self) -> bool {
            self.result_size_estimate == Some(0)
                && self.messages.as_ref().is_none_or(|m| m.is_empty())
        }
    }

    /// Reference to a message (just ID and thread ID)
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessageRef {
        pub id: String,
        #[serde(default)]
        pub thread_id: Option<String>,
    }

    impl MessageRef {
        pub fn new(id: impl Into<String>) -> Self {
            Self {
                id: id.into(),
                thread_id: None,
            }
        }
    }

    /// Full message from Gmail API
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GmailMessage {
        pub id: String,
        #[serde(default)]
        pub thread_id: Option<String>,
        #[serde(default)]
        pub label_ids: Option<Vec<String>>,
        #[serde(default)]
        pub snippet: Option<String>,
        /// Milliseconds since the epoch, as a decimal string
        pub internal_date: String,
        pub payload: Option<MessagePayload>,
    }

    /// Message payload containing headers and body
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessagePayload {
        pub mime_type: Option<String>,
        pub headers: Option<Vec<Header>>,
        pub body: Option<MessageBody>,
        pub parts: Option<Vec<MessagePart>>,
    }

    /// Email header (name-value pair)
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Header {
        pub name: String,
        pub value: String,
    }

    /// Message body (base64 encoded)
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct MessageBody {
        pub size: Option<u32>,
        pub data: Option<String>,
    }

    /// Message part (for multipart messages)
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessagePart {
        pub part_id: Option<String>,
        pub mime_type: Option<String>,
        pub filename: Option<String>,
        pub headers: Option<Vec<Header>>,
        pub body: Option<MessageBody>,
        pub parts: Option<Vec<MessagePart>>,
    }
}
