//! Body extraction from fetched Gmail messages
//!
//! Only one level of structure is understood: a `multipart/alternative`
//! message contributes its first part, anything else its top-level body.

use base64::prelude::*;
use std::borrow::Cow;

use super::api::{GmailMessage, MessageBody};
use crate::error::{Error, Result};

pub const MULTIPART_ALTERNATIVE: &str = "multipart/alternative";

/// Raw bytes of a decoded message body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBody(Vec<u8>);

impl DecodedBody {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Interpret the bytes as UTF-8, replacing invalid sequences
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

/// Select and decode the body of a message
pub fn extract_body(message: &GmailMessage) -> Result<DecodedBody> {
    let payload = message
        .payload
        .as_ref()
        .ok_or_else(|| Error::malformed(&message.id, "message has no payload"))?;

    let body = if payload
        .mime_type
        .as_deref()
        .is_some_and(|m| m.eq_ignore_ascii_case(MULTIPART_ALTERNATIVE))
    {
        let first = payload
            .parts
            .as_deref()
            .and_then(|parts| parts.first())
            .ok_or_else(|| Error::malformed(&message.id, "alternative message has no parts"))?;
        first.body.as_ref()
    } else {
        payload.body.as_ref()
    };

    decode_body(&message.id, body)
}

/// Gmail leaves `data` out for zero-length bodies
fn decode_body(id: &str, body: Option<&MessageBody>) -> Result<DecodedBody> {
    match body.and_then(|b| b.data.as_deref()) {
        Some(data) => decode_base64_body(data)
            .map(DecodedBody)
            .ok_or_else(|| Error::malformed(id, "body is not valid base64")),
        None => Ok(DecodedBody(Vec::new())),
    }
}

/// Decode base64-encoded body data
///
/// Gmail uses URL-safe base64 but padding can vary, so we try multiple decoders.
fn decode_base64_body(data: &str) -> Option<Vec<u8>> {
    use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE};

    let decoders: &[&base64::engine::GeneralPurpose] =
        &[&BASE64_URL_SAFE_NO_PAD, &URL_SAFE, &STANDARD, &STANDARD_NO_PAD];

    decoders.iter().find_map(|decoder| decoder.decode(data).ok())
}
