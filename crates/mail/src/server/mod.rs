//! HTTP front end
//!
//! Three GET routes drive the whole tool:
//! - `/login` redirects to the consent page
//! - `/callback` exchanges the authorization code and redirects to `/emails`
//! - `/emails` runs the export and answers `OK`
//!
//! Each request is handled on its own thread. Failures are logged here and
//! the client only sees an empty 500.

mod routes;
mod state;

pub use routes::{Reply, route};
pub use state::{AppState, Phase};

use log::{debug, info, warn};
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use tiny_http::{Header, Method, Request, Response, Server};
use url::Url;

use crate::error::{Error, Result};

/// Bind the HTTP listener
pub fn bind(addr: impl ToSocketAddrs) -> Result<Server> {
    Server::http(addr).map_err(|e| Error::Config(format!("Failed to bind HTTP server: {e}")))
}

/// Address the server actually listens on (useful after binding port 0)
pub fn local_addr(server: &Server) -> Option<SocketAddr> {
    server.server_addr().to_ip()
}

/// Serve requests until the listener shuts down
pub fn serve(server: Server, state: Arc<AppState>) {
    if let Some(addr) = local_addr(&server) {
        info!("Listening on http://{}", addr);
    }

    for request in server.incoming_requests() {
        let state = Arc::clone(&state);
        std::thread::spawn(move || handle_request(&state, request));
    }
}

/// Describe why a redirect URI would not bring the browser back to `/callback` on `port`
pub fn check_redirect_uri(redirect_uri: &str, port: u16) -> Vec<String> {
    let Ok(url) = Url::parse(redirect_uri) else {
        return vec![format!("Redirect URI {redirect_uri} is not a valid URL")];
    };

    let mut problems = Vec::new();
    if url.port_or_known_default() != Some(port) {
        problems.push(format!(
            "Redirect URI {redirect_uri} does not point at port {port}; the callback will not reach this server"
        ));
    }
    if url.path() != "/callback" {
        problems.push(format!(
            "Redirect URI {redirect_uri} should use the /callback path"
        ));
    }
    problems
}

fn handle_request(state: &AppState, request: Request) {
    debug!("{} {}", request.method(), request.url());

    let reply = if *request.method() == Method::Get {
        route(state, request.url())
    } else {
        Reply::MethodNotAllowed
    };

    if let Err(e) = respond(request, reply) {
        warn!("Failed to send response: {}", e);
    }
}

fn respond(request: Request, reply: Reply) -> std::io::Result<()> {
    let status = reply.status();
    match reply {
        Reply::Redirect(location) => match Header::from_bytes(&b"Location"[..], location) {
            Ok(header) => request.respond(Response::empty(status).with_header(header)),
            Err(()) => {
                warn!("Redirect target is not a valid header value");
                request.respond(Response::empty(500))
            }
        },
        Reply::Text(body) => {
            let mut response = Response::from_string(body).with_status_code(status);
            if let Ok(header) =
                Header::from_bytes(&b"Content-Type"[..], &b"text/plain; charset=utf-8"[..])
            {
                response = response.with_header(header);
            }
            request.respond(response)
        }
        _ => request.respond(Response::empty(status)),
    }
}

#[cfg(test)]
fn test_state() -> AppState {
    use crate::config::{GmailCredentials, Settings};
    use crate::gmail::GmailAuth;

    let auth = GmailAuth::new(GmailCredentials {
        client_id: "client-123".to_string(),
        client_secret: "secret".to_string(),
        redirect_uri: Some("http://localhost:3000/callback".to_string()),
        auth_uri: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
        token_uri: "http://127.0.0.1:9/token".to_string(),
    })
    .unwrap();
    AppState::new(auth, Settings::default())
}
