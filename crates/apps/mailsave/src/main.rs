//! mailsave - search Gmail and save messages as text files
//!
//! Starts a local server; visiting /login walks through Google's consent
//! page, after which matching messages are written to the output directory
//! and "OK" is returned to the browser. Errors are logged to the console.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::sync::Arc;

use mail::{AppState, GmailAuth, GmailCredentials, Settings, server};

mod cli;

use cli::Cli;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    cli.apply(&mut settings);
    settings.validate()?;

    let credentials = match &cli.credentials {
        Some(path) => GmailCredentials::from_file(path)?,
        None => GmailCredentials::load().inspect_err(|_| {
            if let Some(path) = GmailCredentials::default_credentials_path() {
                warn!(
                    "To configure Gmail access, either:\n\
                     1. Place your Google OAuth client file at: {}\n\
                     2. Or set environment variables: GMAIL_CLIENT_ID and GMAIL_CLIENT_SECRET",
                    path.display()
                );
            }
        })?,
    }
    .with_default_redirect(settings.port);

    let auth = GmailAuth::new(credentials)?;
    for problem in server::check_redirect_uri(auth.redirect_uri(), settings.port) {
        warn!("{}", problem);
    }

    let port = settings.port;
    let server = server::bind(("127.0.0.1", port))
        .with_context(|| format!("Could not listen on port {port}"))?;

    let login_url = format!("http://localhost:{port}/login");
    info!("Running; visit {} to start", login_url);
    if cli.open
        && let Err(e) = open::that(&login_url)
    {
        warn!("Failed to open browser: {}. Please open the URL manually.", e);
    }

    server::serve(server, Arc::new(AppState::new(auth, settings)));
    Ok(())
}
