//! Mail crate - Gmail search-and-save export
//!
//! This crate provides everything behind the `mailsave` binary:
//! - OAuth credentials and run settings
//! - Gmail API client and the OAuth authorization code flow
//! - Body extraction, run-scoped deduplication, and file output
//! - The HTTP front end that ties the consent flow to an export run
//!
//! Credentials only ever live in memory; the only thing written to disk is
//! one `<message id>.txt` file per unique message body.

pub mod config;
pub mod error;
pub mod export;
pub mod gmail;
pub mod server;

pub use config::{ExportOptions, GmailCredentials, Settings, TimestampZone};
pub use error::{Error, Result};
pub use export::{ExportStats, run_export};
pub use gmail::{Credential, GMAIL_READONLY_SCOPE, GmailAuth, GmailClient, MailProvider};
#[cfg(any(test, feature = "test-util"))]
pub use gmail::InMemoryProvider;
pub use server::{AppState, Phase};
