//! Request routing
//!
//! Routing is kept separate from `tiny_http` so handlers can be exercised
//! with plain strings.

use log::{error, info};
use url::Url;

use super::state::AppState;
use crate::error::{Error, Result};

/// What to send back for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// 302 to the given location
    Redirect(String),
    /// 200 with a `text/plain` body
    Text(String),
    NotFound,
    MethodNotAllowed,
    BadRequest,
    /// 500 with an empty body; the cause is only logged
    Failure,
}

impl Reply {
    pub fn status(&self) -> u16 {
        match self {
            Reply::Redirect(_) => 302,
            Reply::Text(_) => 200,
            Reply::NotFound => 404,
            Reply::MethodNotAllowed => 405,
            Reply::BadRequest => 400,
            Reply::Failure => 500,
        }
    }
}

/// Dispatch a GET request by its path and query
///
/// `target` is the raw request target, e.g. `/callback?code=4/0Ab...`.
pub fn route(state: &AppState, target: &str) -> Reply {
    let Ok(url) = Url::parse("http://localhost/").and_then(|base| base.join(target)) else {
        return Reply::BadRequest;
    };

    let result = match url.path() {
        "/login" => login(state),
        "/callback" => callback(state, &url),
        "/emails" => emails(state),
        _ => return Reply::NotFound,
    };

    result.unwrap_or_else(|err| {
        error!("GET {} failed: {:#}", url.path(), anyhow::Error::new(err));
        Reply::Failure
    })
}

fn login(state: &AppState) -> Result<Reply> {
    Ok(Reply::Redirect(state.begin_login()?))
}

fn callback(state: &AppState, url: &Url) -> Result<Reply> {
    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    };

    if let Some(err) = param("error") {
        return Err(Error::Auth(format!("consent was not granted: {err}")));
    }
    let code = param("code")
        .ok_or_else(|| Error::Auth("callback did not include an authorization code".to_string()))?;

    state.complete_login(&code)?;
    Ok(Reply::Redirect("/emails".to_string()))
}

fn emails(state: &AppState) -> Result<Reply> {
    let stats = state.export()?;
    info!(
        "Exported {} of {} message(s) to {}",
        stats.written,
        stats.listed,
        state
            .settings()
            .output_dir
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    );
    Ok(Reply::Text("OK".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gmail::Credential;
    use crate::server::{Phase, test_state};

    #[test]
    fn test_login_redirects_to_consent_page() {
        let state = test_state();
        let reply = route(&state, "/login");

        let Reply::Redirect(location) = reply else {
            panic!("expected redirect, got {reply:?}");
        };
        assert!(location.contains("scope=https%3A%2F%2Fwww.googleapis.com%2Fauth%2Fgmail.readonly"));
        assert_eq!(state.phase(), Phase::AwaitingCallback);
    }

    #[test]
    fn test_unknown_path_is_not_found() {
        let state = test_state();
        assert_eq!(route(&state, "/favicon.ico"), Reply::NotFound);
        assert_eq!(route(&state, "/"), Reply::NotFound);
    }

    #[test]
    fn test_callback_without_code_fails() {
        let state = test_state();
        assert_eq!(route(&state, "/callback"), Reply::Failure);
        assert!(state.credential().is_none());
    }

    #[test]
    fn test_callback_with_consent_error_fails() {
        let state = test_state();
        assert_eq!(
            route(&state, "/callback?error=access_denied"),
            Reply::Failure
        );
    }

    #[test]
    fn test_callback_with_rejected_code_fails() {
        // The token endpoint in the test state is unreachable
        let state = test_state();
        assert_eq!(route(&state, "/callback?code=abc"), Reply::Failure);
        assert!(state.credential().is_none());
    }

    #[test]
    fn test_emails_without_login_fails() {
        let state = test_state();
        assert_eq!(route(&state, "/emails"), Reply::Failure);
    }

    #[test]
    fn test_emails_without_output_dir_fails() {
        let state = test_state().with_credential(Credential::bearer("token"));
        assert_eq!(route(&state, "/emails"), Reply::Failure);
    }

    #[test]
    fn test_reply_status_codes() {
        assert_eq!(Reply::Redirect("/emails".to_string()).status(), 302);
        assert_eq!(Reply::Text("OK".to_string()).status(), 200);
        assert_eq!(Reply::Failure.status(), 500);
    }
}
