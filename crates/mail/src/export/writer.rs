//! Output file writing
//!
//! Each unique body lands in `<output_dir>/<message id>.txt` as:
//! ```text
//! 2019-03-04T10:20:30+00:00
//!
//! <decoded body text>
//! ```

use chrono::{DateTime, Local, TimeZone, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::TimestampZone;
use crate::error::{Error, Result};

/// Same shape as ISO 8601 with a numeric offset, e.g. `2019-03-04T10:20:30+00:00`
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Render a Gmail internal date (epoch milliseconds) for the file header
pub fn format_timestamp(id: &str, internal_date: &str, zone: TimestampZone) -> Result<String> {
    let millis: i64 = internal_date
        .trim()
        .parse()
        .map_err(|_| Error::malformed(id, format!("invalid internal date {internal_date:?}")))?;

    let at: DateTime<Utc> = Utc
        .timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| Error::malformed(id, format!("internal date {millis} out of range")))?;

    Ok(match zone {
        TimestampZone::Utc => at.format(TIMESTAMP_FORMAT).to_string(),
        TimestampZone::Local => at.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string(),
    })
}

/// Writes one text file per message into a fixed directory
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Get the output path for a message ID
    pub fn path_for(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
            return Err(Error::malformed(id, "message id is not a valid file name"));
        }
        Ok(self.dir.join(format!("{id}.txt")))
    }

    /// Write (or overwrite) the file for a message and return its path
    pub fn write(&self, id: &str, timestamp: &str, body: &str) -> Result<PathBuf> {
        let path = self.path_for(id)?;
        fs::write(&path, format!("{timestamp}\n\n{body}")).map_err(|source| {
            Error::Filesystem {
                path: path.clone(),
                source,
            }
        })?;
        Ok(path)
    }
}
