//! Export engine: search, fetch, deduplicate, and write messages
//!
//! A run is self-contained: it holds its own fingerprint set and writes
//! every file before returning, so re-running simply overwrites.

mod dedupe;
mod fetch;
mod list;
mod pipeline;
mod writer;

pub use dedupe::{Fingerprint, SeenFingerprints};
pub use fetch::fetch_all;
pub use list::{MatchingMessages, list_matching};
pub use pipeline::{ExportStats, ProcessOutcome, process_message, run_export};
pub use writer::{OutputWriter, format_timestamp};
