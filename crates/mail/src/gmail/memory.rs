//! In-memory mail provider for testing
//!
//! Serves scripted search pages and messages, and counts requests so tests
//! can assert how many round trips a pipeline made.

use base64::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::MailProvider;
use super::api::{
    GmailMessage, ListMessagesResponse, MessageBody, MessagePart, MessagePayload, MessageRef,
};
use super::extract::MULTIPART_ALTERNATIVE;
use crate::error::{Error, Result};

/// One scripted page of search results
#[derive(Debug, Clone)]
struct Page {
    ids: Vec<String>,
    next_page_token: Option<String>,
    result_size_estimate: Option<u32>,
}

/// Scripted [`MailProvider`]
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    pages: Vec<Page>,
    messages: HashMap<String, GmailMessage>,
    failing: HashSet<String>,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve all given messages as a single page of results
    pub fn with_messages(messages: Vec<GmailMessage>) -> Self {
        let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
        let mut provider = Self::new().page(ids, None);
        for message in messages {
            provider = provider.message(message);
        }
        provider
    }

    /// Append a page of results; `next_page_token` links it to the following page
    pub fn page(mut self, ids: Vec<&str>, next_page_token: Option<&str>) -> Self {
        let count = ids.len() as u32;
        self.pages.push(Page {
            ids: ids.into_iter().map(str::to_string).collect(),
            next_page_token: next_page_token.map(str::to_string),
            result_size_estimate: Some(count),
        });
        self
    }

    /// Append a page that reports zero results but still carries a token
    pub fn empty_page(mut self, next_page_token: Option<&str>) -> Self {
        self.pages.push(Page {
            ids: Vec::new(),
            next_page_token: next_page_token.map(str::to_string),
            result_size_estimate: Some(0),
        });
        self
    }

    pub fn message(mut self, message: GmailMessage) -> Self {
        self.messages.insert(message.id.clone(), message);
        self
    }

    /// Make fetching the given message fail
    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    /// Number of search page requests served so far
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of message fetches served so far
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    fn page_index(&self, page_token: Option<&str>) -> Result<usize> {
        let Some(token) = page_token else {
            return Ok(0);
        };

        self.pages
            .iter()
            .position(|p| p.next_page_token.as_deref() == Some(token))
            .map(|i| i + 1)
            .filter(|&i| i < self.pages.len())
            .ok_or_else(|| Error::provider("Failed to list messages", format!("unknown page token {token}")))
    }
}

impl MailProvider for InMemoryProvider {
    fn list_messages(&self, _query: &str, page_token: Option<&str>) -> Result<ListMessagesResponse> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        if self.pages.is_empty() {
            return Ok(ListMessagesResponse {
                messages: None,
                next_page_token: None,
                result_size_estimate: Some(0),
            });
        }

        let page = &self.pages[self.page_index(page_token)?];
        let messages = (!page.ids.is_empty())
            .then(|| page.ids.iter().map(MessageRef::new).collect());

        Ok(ListMessagesResponse {
            messages,
            next_page_token: page.next_page_token.clone(),
            result_size_estimate: page.result_size_estimate,
        })
    }

    fn get_message(&self, id: &str) -> Result<GmailMessage> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(id) {
            return Err(Error::provider(
                "Failed to send get message request",
                format!("message {id}: http status: 500"),
            ));
        }

        self.messages.get(id).cloned().ok_or_else(|| {
            Error::provider(
                "Failed to send get message request",
                format!("message {id}: http status: 404"),
            )
        })
    }
}

fn encoded_body(text: &str) -> MessageBody {
    MessageBody {
        size: Some(text.len() as u32),
        data: Some(BASE64_URL_SAFE_NO_PAD.encode(text)),
    }
}

/// Build a single-part `text/plain` message
pub fn plain_message(id: &str, internal_date_ms: i64, body: &str) -> GmailMessage {
    GmailMessage {
        id: id.to_string(),
        thread_id: Some(id.to_string()),
        label_ids: None,
        snippet: None,
        internal_date: internal_date_ms.to_string(),
        payload: Some(MessagePayload {
            mime_type: Some("text/plain".to_string()),
            headers: None,
            body: Some(encoded_body(body)),
            parts: None,
        }),
    }
}

/// Build a `multipart/alternative` message with one part per entry
pub fn alternative_message(id: &str, internal_date_ms: i64, parts: &[&str]) -> GmailMessage {
    let parts = parts
        .iter()
        .enumerate()
        .map(|(i, text)| MessagePart {
            part_id: Some(i.to_string()),
            mime_type: Some(if i == 0 { "text/plain" } else { "text/html" }.to_string()),
            filename: Some(String::new()),
            headers: None,
            body: Some(encoded_body(text)),
            parts: None,
        })
        .collect();

    GmailMessage {
        id: id.to_string(),
        thread_id: Some(id.to_string()),
        label_ids: None,
        snippet: None,
        internal_date: internal_date_ms.to_string(),
        payload: Some(MessagePayload {
            mime_type: Some(MULTIPART_ALTERNATIVE.to_string()),
            headers: None,
            body: Some(MessageBody {
                size: Some(0),
                data: None,
            }),
            parts: Some(parts),
        }),
    }
}
