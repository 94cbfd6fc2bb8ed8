//! Paginated message listing

use log::debug;

use crate::error::Result;
use crate::gmail::MailProvider;
use crate::gmail::api::MessageRef;

/// Where the next page request starts from
#[derive(Debug)]
enum Cursor {
    Start,
    Next(String),
    Exhausted,
}

/// Lazy sequence of message references matching a query
///
/// Page requests are issued only when the buffered references run out, so
/// pagination is strictly sequential. A failed request is yielded once and
/// ends the sequence.
pub struct MatchingMessages<'a> {
    provider: &'a dyn MailProvider,
    query: &'a str,
    cursor: Cursor,
    buffered: std::vec::IntoIter<MessageRef>,
    pages_requested: usize,
}

impl<'a> MatchingMessages<'a> {
    pub fn new(provider: &'a dyn MailProvider, query: &'a str) -> Self {
        Self {
            provider,
            query,
            cursor: Cursor::Start,
            buffered: Vec::new().into_iter(),
            pages_requested: 0,
        }
    }

    /// Number of page requests issued so far
    pub fn pages_requested(&self) -> usize {
        self.pages_requested
    }
}

impl Iterator for MatchingMessages<'_> {
    type Item = Result<MessageRef>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(message_ref) = self.buffered.next() {
                return Some(Ok(message_ref));
            }

            let page_token = match std::mem::replace(&mut self.cursor, Cursor::Exhausted) {
                Cursor::Exhausted => return None,
                Cursor::Start => None,
                Cursor::Next(token) => Some(token),
            };

            let page = match self.provider.list_messages(self.query, page_token.as_deref()) {
                Ok(page) => page,
                Err(e) => return Some(Err(e)),
            };
            self.pages_requested += 1;

            if self.pages_requested == 1 && page.is_empty_result() {
                debug!("Search reported no matching messages");
                return None;
            }

            let messages = page.messages.unwrap_or_default();
            debug!(
                "Page {} returned {} message(s)",
                self.pages_requested,
                messages.len()
            );

            if let Some(token) = page.next_page_token {
                self.cursor = Cursor::Next(token);
            }
            self.buffered = messages.into_iter();
        }
    }
}

/// Collect every message reference matching `query`
///
/// Any failed page request aborts the listing; no partial result is returned.
pub fn list_matching(provider: &dyn MailProvider, query: &str) -> Result<Vec<MessageRef>> {
    MatchingMessages::new(provider, query).collect()
}
