//! Error types for the export tool
//!
//! Nothing in the crate retries: every error aborts the operation that
//! raised it and is surfaced to the caller.

use std::path::PathBuf;

/// Boxed error used as the source of provider failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the mail crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or invalid credentials file or settings
    #[error("configuration error: {0}")]
    Config(String),

    /// Authorization code exchange failed, or no credential is available
    #[error("authorization failed: {0}")]
    Auth(String),

    /// A list or fetch request to the provider failed
    #[error("{context}")]
    Provider {
        context: String,
        #[source]
        source: BoxError,
    },

    /// The provider returned a message that cannot be turned into a file
    #[error("malformed message {id}: {reason}")]
    MalformedMessage { id: String, reason: String },

    /// Opening or writing an output file failed
    #[error("failed to write {}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn provider(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Provider {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedMessage {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_keeps_source() {
        let err = Error::provider("Failed to list messages", "connection reset");
        assert_eq!(err.to_string(), "Failed to list messages");

        let chain = format!("{:#}", anyhow::Error::new(err));
        assert!(chain.contains("connection reset"));
    }

    #[test]
    fn test_filesystem_error_names_path() {
        let err = Error::Filesystem {
            path: PathBuf::from("/out/abc.txt"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.to_string(), "failed to write /out/abc.txt");
    }
}
