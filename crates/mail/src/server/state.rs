//! Shared state behind the HTTP routes

use log::{info, warn};
use std::fmt;
use std::sync::{Mutex, PoisonError, RwLock};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::export::{ExportStats, run_export};
use crate::gmail::{Credential, GMAIL_READONLY_SCOPE, GmailAuth, GmailClient};

/// Where the login/export flow currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingCallback,
    Authorized,
    Running,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::AwaitingCallback => "awaiting-callback",
            Phase::Authorized => "authorized",
            Phase::Running => "running",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Context handed to every request handler
///
/// The credential is the only state that outlives a request, and it is
/// never written to disk.
pub struct AppState {
    auth: GmailAuth,
    settings: Settings,
    credential: RwLock<Option<Credential>>,
    phase: Mutex<Phase>,
}

impl AppState {
    pub fn new(auth: GmailAuth, settings: Settings) -> Self {
        Self {
            auth,
            settings,
            credential: RwLock::new(None),
            phase: Mutex::new(Phase::Idle),
        }
    }

    /// Start already authorized, skipping the consent round trip
    pub fn with_credential(self, credential: Credential) -> Self {
        self.set_credential(credential);
        self.set_phase(Phase::Authorized);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, next: Phase) {
        let mut guard = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        if *guard != next {
            info!("State: {} -> {}", *guard, next);
            *guard = next;
        }
    }

    pub fn credential(&self) -> Option<Credential> {
        self.credential
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_credential(&self, credential: Credential) {
        *self
            .credential
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(credential);
    }

    /// Consent page URL for `/login`
    pub fn begin_login(&self) -> Result<String> {
        let url = self.auth.authorization_url(&[GMAIL_READONLY_SCOPE])?;
        self.set_phase(Phase::AwaitingCallback);
        Ok(url)
    }

    /// Exchange the code delivered to `/callback` and keep the credential
    pub fn complete_login(&self, code: &str) -> Result<()> {
        let credential = self.auth.exchange_code(code)?;
        self.set_credential(credential);
        self.set_phase(Phase::Authorized);
        Ok(())
    }

    /// Run the export for `/emails` with the stored credential
    pub fn export(&self) -> Result<ExportStats> {
        let credential = self
            .credential()
            .ok_or_else(|| Error::Auth("not signed in; visit /login first".to_string()))?;
        if credential.is_expired() {
            warn!("Access token has expired; provider requests will likely be rejected");
        }

        let options = self.settings.export_options()?;
        let client =
            GmailClient::with_base_url(&self.settings.api_base_url, credential.access_token);

        self.set_phase(Phase::Running);
        let result = run_export(&client, &options);
        self.set_phase(if result.is_ok() {
            Phase::Done
        } else {
            Phase::Failed
        });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::test_state;

    #[test]
    fn test_starts_idle_without_credential() {
        let state = test_state();
        assert_eq!(state.phase(), Phase::Idle);
        assert!(state.credential().is_none());
    }

    #[test]
    fn test_login_moves_to_awaiting_callback() {
        let state = test_state();
        let url = state.begin_login().unwrap();
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert_eq!(state.phase(), Phase::AwaitingCallback);
    }

    #[test]
    fn test_export_without_credential_is_auth_error() {
        let state = test_state();
        assert!(matches!(state.export(), Err(Error::Auth(_))));
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn test_with_credential_is_authorized() {
        let state = test_state().with_credential(Credential::bearer("token"));
        assert_eq!(state.phase(), Phase::Authorized);
        assert_eq!(state.credential().unwrap().access_token, "token");
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::AwaitingCallback.to_string(), "awaiting-callback");
        assert_eq!(Phase::Failed.to_string(), "failed");
    }
}
