//! Configuration loading for the export tool
//!
//! OAuth credentials are loaded from (in order of priority):
//! 1. An explicit JSON file (Google Cloud Console format)
//! 2. `client_id.json` in the mailsave config directory
//! 3. Runtime environment variables (fallback)
//!
//! Run parameters ([`Settings`]) come from `settings.json` and are
//! overridden by the command line. Both are read once at startup.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Credentials filename in the mailsave config directory
const CREDENTIALS_FILE: &str = "client_id.json";

/// Settings filename in the mailsave config directory
const SETTINGS_FILE: &str = "settings.json";

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_API_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

/// OAuth client credentials for Gmail API access
#[derive(Debug, Clone)]
pub struct GmailCredentials {
    pub client_id: String,
    pub client_secret: String,
    /// Where the provider sends the browser back to; must hit `/callback`
    pub redirect_uri: Option<String>,
    pub auth_uri: String,
    pub token_uri: String,
}

/// Google Cloud Console credential file format
#[derive(Deserialize)]
struct GoogleCredentialFile {
    installed: Option<ClientSection>,
    web: Option<ClientSection>,
}

#[derive(Deserialize)]
struct ClientSection {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
    auth_uri: Option<String>,
    token_uri: Option<String>,
}

impl GmailCredentials {
    /// Load credentials from the config directory, falling back to the environment
    pub fn load() -> Result<Self> {
        if config::config_exists(CREDENTIALS_FILE) {
            let creds: GoogleCredentialFile =
                config::load_json(CREDENTIALS_FILE).map_err(|e| Error::Config(format!("{e:#}")))?;
            return Self::from_credential_file(creds);
        }

        Self::from_env()
    }

    /// Load credentials from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let creds: GoogleCredentialFile =
            config::load_json_file(path).map_err(|e| Error::Config(format!("{e:#}")))?;
        Self::from_credential_file(creds)
    }

    /// Parse credentials from JSON string (Google Cloud Console format)
    pub fn from_json(json: &str) -> Result<Self> {
        let creds: GoogleCredentialFile = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Failed to parse credentials JSON: {e}")))?;
        Self::from_credential_file(creds)
    }

    fn from_credential_file(creds: GoogleCredentialFile) -> Result<Self> {
        // Desktop ("installed") clients work the same way for a loopback redirect
        let section = creds.web.or(creds.installed).ok_or_else(|| {
            Error::Config("Credentials file missing 'web' or 'installed' section".to_string())
        })?;

        Ok(Self {
            client_id: section.client_id,
            client_secret: section.client_secret,
            redirect_uri: section.redirect_uris.into_iter().next(),
            auth_uri: section
                .auth_uri
                .unwrap_or_else(|| DEFAULT_AUTH_URI.to_string()),
            token_uri: section
                .token_uri
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
        })
    }

    /// Load credentials from environment variables
    pub fn from_env() -> Result<Self> {
        let client_id = std::env::var("GMAIL_CLIENT_ID").map_err(|_| {
            Error::Config(format!(
                "no {CREDENTIALS_FILE} found and GMAIL_CLIENT_ID is not set"
            ))
        })?;
        let client_secret = std::env::var("GMAIL_CLIENT_SECRET")
            .map_err(|_| Error::Config("GMAIL_CLIENT_SECRET is not set".to_string()))?;

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri: std::env::var("GMAIL_REDIRECT_URI").ok(),
            auth_uri: DEFAULT_AUTH_URI.to_string(),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
        })
    }

    /// Fill in the loopback callback URI if the credentials did not name one
    pub fn with_default_redirect(mut self, port: u16) -> Self {
        if self.redirect_uri.is_none() {
            self.redirect_uri = Some(format!("http://localhost:{port}/callback"));
        }
        self
    }

    /// Get the default credentials file path (~/.config/mailsave/client_id.json)
    pub fn default_credentials_path() -> Option<PathBuf> {
        config::config_path(CREDENTIALS_FILE)
    }
}

/// Which clock the timestamp line of each output file is rendered in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampZone {
    #[default]
    Local,
    Utc,
}

/// Static run parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Existing directory the `<id>.txt` files are written to
    pub output_dir: Option<PathBuf>,
    /// Gmail search query, same syntax as the web UI search box
    pub query: String,
    pub port: u16,
    /// Maximum number of message fetches in flight
    pub concurrency: usize,
    pub timestamp_zone: TimestampZone,
    pub api_base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: None,
            query: String::new(),
            port: 3000,
            concurrency: 8,
            timestamp_zone: TimestampZone::Local,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

/// The part of [`Settings`] the export pipeline needs
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub output_dir: PathBuf,
    pub query: String,
    pub concurrency: usize,
    pub timestamp_zone: TimestampZone,
}

impl Settings {
    /// Load settings from an explicit file, else the config directory, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let loaded: anyhow::Result<Self> = match path {
            Some(path) => config::load_json_file(path),
            None if config::config_exists(SETTINGS_FILE) => config::load_json(SETTINGS_FILE),
            None => return Ok(Self::default()),
        };
        loaded.map_err(|e| Error::Config(format!("{e:#}")))
    }

    /// Check that the settings describe a runnable export
    pub fn validate(&self) -> Result<()> {
        let dir = self
            .output_dir
            .as_ref()
            .ok_or_else(|| Error::Config("no output directory configured".to_string()))?;
        if !dir.is_dir() {
            return Err(Error::Config(format!(
                "output directory {} does not exist",
                dir.display()
            )));
        }
        if self.query.trim().is_empty() {
            return Err(Error::Config("no search query configured".to_string()));
        }
        if self.concurrency == 0 {
            return Err(Error::Config("concurrency must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn export_options(&self) -> Result<ExportOptions> {
        let output_dir = self
            .output_dir
            .clone()
            .ok_or_else(|| Error::Config("no output directory configured".to_string()))?;

        Ok(ExportOptions {
            output_dir,
            query: self.query.clone(),
            concurrency: self.concurrency.max(1),
            timestamp_zone: self.timestamp_zone,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_web_credentials() {
        let json = r#"{
            "web": {
                "client_id": "web-client-id.apps.googleusercontent.com",
                "client_secret": "web-secret",
                "redirect_uris": ["http://localhost:3000/callback"],
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token"
            }
        }"#;

        let creds = GmailCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "web-client-id.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "web-secret");
        assert_eq!(
            creds.redirect_uri.as_deref(),
            Some("http://localhost:3000/callback")
        );
        assert_eq!(creds.auth_uri, "https://accounts.google.com/o/oauth2/auth");
    }

    #[test]
    fn test_parse_installed_credentials_uses_defaults() {
        let json = r#"{
            "installed": {
                "client_id": "desktop-client-id",
                "client_secret": "desktop-secret"
            }
        }"#;

        let creds = GmailCredentials::from_json(json).unwrap();
        assert_eq!(creds.client_id, "desktop-client-id");
        assert!(creds.redirect_uri.is_none());
        assert_eq!(creds.auth_uri, DEFAULT_AUTH_URI);
        assert_eq!(creds.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn test_default_redirect_only_fills_gaps() {
        let json = r#"{ "web": { "client_id": "id", "client_secret": "secret" } }"#;
        let creds = GmailCredentials::from_json(json)
            .unwrap()
            .with_default_redirect(4000);
        assert_eq!(
            creds.redirect_uri.as_deref(),
            Some("http://localhost:4000/callback")
        );

        let kept = creds.clone().with_default_redirect(5000);
        assert_eq!(kept.redirect_uri, creds.redirect_uri);
    }

    #[test]
    fn test_invalid_credentials_json() {
        let json = r#"{ "other": {} }"#;
        assert!(matches!(
            GmailCredentials::from_json(json),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.concurrency, 8);
        assert_eq!(settings.timestamp_zone, TimestampZone::Local);
        assert!(settings.output_dir.is_none());
    }

    #[test]
    fn test_settings_from_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{ "query": "from:me@example.com", "timestamp_zone": "utc" }"#,
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.query, "from:me@example.com");
        assert_eq!(settings.timestamp_zone, TimestampZone::Utc);
        assert_eq!(settings.port, 3000);
    }

    #[test]
    fn test_validate_requires_existing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings {
            query: "label:receipts".to_string(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        settings.output_dir = Some(dir.path().join("missing"));
        assert!(settings.validate().is_err());

        settings.output_dir = Some(dir.path().to_path_buf());
        assert!(settings.validate().is_ok());

        settings.concurrency = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_requires_query() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            output_dir: Some(dir.path().to_path_buf()),
            query: "   ".to_string(),
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }
}
