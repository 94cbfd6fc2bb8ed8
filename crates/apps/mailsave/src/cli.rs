//! Command line interface

use clap::Parser;
use mail::{Settings, TimestampZone};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mailsave")]
#[command(about = "Search Gmail and save each distinct message body as a .txt file", long_about = None)]
pub struct Cli {
    /// Settings file (defaults to ~/.config/mailsave/settings.json)
    #[arg(long, env = "MAILSAVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Google OAuth client file (defaults to ~/.config/mailsave/client_id.json)
    #[arg(long, env = "MAILSAVE_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// Directory the .txt files are written to
    #[arg(long, env = "MAILSAVE_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Gmail search query, as typed into the web UI search box
    #[arg(long, env = "MAILSAVE_QUERY")]
    pub query: Option<String>,

    #[arg(long, env = "MAILSAVE_PORT")]
    pub port: Option<u16>,

    /// Maximum number of messages fetched at once
    #[arg(long, env = "MAILSAVE_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Write timestamps in UTC instead of the local zone
    #[arg(long, env = "MAILSAVE_UTC")]
    pub utc: bool,

    /// Open the login page in the default browser once listening
    #[arg(long)]
    pub open: bool,
}

impl Cli {
    /// Override file settings with anything given on the command line
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(dir) = &self.output_dir {
            settings.output_dir = Some(dir.clone());
        }
        if let Some(query) = &self.query {
            settings.query = query.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(concurrency) = self.concurrency {
            settings.concurrency = concurrency;
        }
        if self.utc {
            settings.timestamp_zone = TimestampZone::Utc;
        }
    }
}
