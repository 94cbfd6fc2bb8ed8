//! The list → fetch → extract → dedupe → write pipeline

use log::{debug, info};
use std::path::PathBuf;
use std::time::Instant;

use super::dedupe::{Fingerprint, SeenFingerprints};
use super::fetch::fetch_all;
use super::list::list_matching;
use super::writer::{OutputWriter, format_timestamp};
use crate::config::{ExportOptions, TimestampZone};
use crate::error::Result;
use crate::gmail::api::GmailMessage;
use crate::gmail::{MailProvider, extract_body};

/// Statistics from an export run
#[derive(Debug, Default, Clone)]
pub struct ExportStats {
    /// Number of message references returned by the search
    pub listed: usize,
    /// Number of full messages fetched
    pub fetched: usize,
    /// Number of files written
    pub written: usize,
    /// Number of messages skipped because their body was already written
    pub duplicates: usize,
    /// Duration of the run
    pub duration_ms: u64,
}

/// What happened to one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Written(PathBuf),
    Duplicate,
}

/// Extract, fingerprint, and write one message unless its body was already seen
pub fn process_message(
    message: &GmailMessage,
    seen: &mut SeenFingerprints,
    writer: &OutputWriter,
    zone: TimestampZone,
) -> Result<ProcessOutcome> {
    let body = extract_body(message)?;
    let text = body.text();

    // Fingerprint the text as written, so bodies differing only in invalid UTF-8 collapse
    let fingerprint = Fingerprint::of(text.as_bytes());
    if seen.contains(&fingerprint) {
        debug!("Skipping {}: duplicate body {}", message.id, fingerprint);
        return Ok(ProcessOutcome::Duplicate);
    }

    let timestamp = format_timestamp(&message.id, &message.internal_date, zone)?;
    seen.insert(fingerprint);
    let path = writer.write(&message.id, &timestamp, &text)?;

    debug!("Wrote {}", path.display());
    Ok(ProcessOutcome::Written(path))
}

/// Run a full export against `provider`
///
/// Every file is written before this returns. On error, files written
/// earlier in the run stay on disk.
pub fn run_export(provider: &dyn MailProvider, options: &ExportOptions) -> Result<ExportStats> {
    let start = Instant::now();
    let mut stats = ExportStats::default();

    // 1. Search
    let refs = list_matching(provider, &options.query)?;
    stats.listed = refs.len();
    info!("Search matched {} message(s)", stats.listed);

    if refs.is_empty() {
        stats.duration_ms = start.elapsed().as_millis() as u64;
        return Ok(stats);
    }

    // 2. Fetch full messages
    let messages = fetch_all(provider, &refs, options.concurrency)?;
    stats.fetched = messages.len();

    // 3. Dedupe and write
    let writer = OutputWriter::new(&options.output_dir);
    let mut seen = SeenFingerprints::new();

    for message in &messages {
        match process_message(message, &mut seen, &writer, options.timestamp_zone)? {
            ProcessOutcome::Written(_) => stats.written += 1,
            ProcessOutcome::Duplicate => stats.duplicates += 1,
        }
    }

    stats.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Export finished: {} written, {} duplicate(s) skipped in {}ms",
        stats.written, stats.duplicates, stats.duration_ms
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::gmail::{InMemoryProvider, alternative_message, plain_message};
    use std::fs;
    use tempfile::{TempDir, tempdir};

    const MARCH_4_2019: i64 = 1551694830000;

    fn options(dir: &TempDir) -> ExportOptions {
        ExportOptions {
            output_dir: dir.path().to_path_buf(),
            query: "from:me@example.com".to_string(),
            concurrency: 4,
            timestamp_zone: TimestampZone::Utc,
        }
    }

    fn files(dir: &TempDir) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_process_message_writes_then_skips_duplicate() {
        let dir = tempdir().unwrap();
        let writer = OutputWriter::new(dir.path());
        let mut seen = SeenFingerprints::new();

        let first = plain_message("a", MARCH_4_2019, "hello");
        let second = plain_message("b", MARCH_4_2019, "hello");

        let outcome = process_message(&first, &mut seen, &writer, TimestampZone::Utc).unwrap();
        assert_eq!(outcome, ProcessOutcome::Written(dir.path().join("a.txt")));

        let outcome = process_message(&second, &mut seen, &writer, TimestampZone::Utc).unwrap();
        assert_eq!(outcome, ProcessOutcome::Duplicate);
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_bodies_differing_only_in_invalid_utf8_are_duplicates() {
        use base64::prelude::*;

        let with_bytes = |id: &str, bytes: &[u8]| {
            let mut message = plain_message(id, MARCH_4_2019, "");
            if let Some(body) = message.payload.as_mut().and_then(|p| p.body.as_mut()) {
                body.data = Some(BASE64_URL_SAFE_NO_PAD.encode(bytes));
            }
            message
        };

        let dir = tempdir().unwrap();
        let writer = OutputWriter::new(dir.path());
        let mut seen = SeenFingerprints::new();

        let first = with_bytes("a", b"caf\xff");
        let second = with_bytes("b", b"caf\xfe");

        let outcome = process_message(&first, &mut seen, &writer, TimestampZone::Utc).unwrap();
        assert!(matches!(outcome, ProcessOutcome::Written(_)));
        let outcome = process_message(&second, &mut seen, &writer, TimestampZone::Utc).unwrap();
        assert_eq!(outcome, ProcessOutcome::Duplicate);
        assert_eq!(
            fs::read_to_string(dir.path().join("a.txt")).unwrap(),
            "2019-03-04T10:20:30+00:00\n\ncaf\u{fffd}"
        );
    }

    #[test]
    fn test_identical_bodies_produce_one_file() {
        let dir = tempdir().unwrap();
        let provider = InMemoryProvider::with_messages(vec![
            plain_message("a", MARCH_4_2019, "hello"),
            plain_message("b", MARCH_4_2019, "hello"),
            plain_message("c", MARCH_4_2019, "world"),
        ]);

        let stats = run_export(&provider, &options(&dir)).unwrap();

        assert_eq!(stats.listed, 3);
        assert_eq!(stats.written, 2);
        assert_eq!(stats.duplicates, 1);

        let names = files(&dir);
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"c.txt".to_string()));
        assert!(names.contains(&"a.txt".to_string()) ^ names.contains(&"b.txt".to_string()));
    }

    #[test]
    fn test_file_content_and_alternative_body() {
        let dir = tempdir().unwrap();
        let provider = InMemoryProvider::with_messages(vec![
            plain_message("plain", MARCH_4_2019, "direct body"),
            alternative_message("alt", MARCH_4_2019, &["first part", "<p>second part</p>"]),
        ]);

        run_export(&provider, &options(&dir)).unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("plain.txt")).unwrap(),
            "2019-03-04T10:20:30+00:00\n\ndirect body"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("alt.txt")).unwrap(),
            "2019-03-04T10:20:30+00:00\n\nfirst part"
        );
    }

    #[test]
    fn test_dedupe_compares_selected_body() {
        // Same first part, different second parts: still a duplicate
        let dir = tempdir().unwrap();
        let provider = InMemoryProvider::with_messages(vec![
            alternative_message("x", MARCH_4_2019, &["same", "<p>one</p>"]),
            alternative_message("y", MARCH_4_2019, &["same", "<p>two</p>"]),
        ]);

        let stats = run_export(&provider, &options(&dir)).unwrap();
        assert_eq!(stats.written, 1);
        assert_eq!(files(&dir), ["x.txt"]);
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let dir = tempdir().unwrap();
        let provider = InMemoryProvider::with_messages(vec![
            plain_message("a", MARCH_4_2019, "hello"),
            plain_message("b", MARCH_4_2019, "hello"),
            plain_message("c", MARCH_4_2019 + 1000, "world"),
        ]);

        run_export(&provider, &options(&dir)).unwrap();
        let first_names = files(&dir);
        let first_c = fs::read_to_string(dir.path().join("c.txt")).unwrap();

        // A fresh run starts with an empty fingerprint set
        let stats = run_export(&provider, &options(&dir)).unwrap();
        assert_eq!(stats.written, 2);

        assert_eq!(files(&dir), first_names);
        assert_eq!(fs::read_to_string(dir.path().join("c.txt")).unwrap(), first_c);
    }

    #[test]
    fn test_empty_result_writes_and_fetches_nothing() {
        let dir = tempdir().unwrap();
        let provider = InMemoryProvider::new()
            .empty_page(Some("T1"))
            .page(vec!["a"], None)
            .message(plain_message("a", MARCH_4_2019, "hello"));

        let stats = run_export(&provider, &options(&dir)).unwrap();

        assert_eq!(stats.listed, 0);
        assert_eq!(provider.list_calls(), 1);
        assert_eq!(provider.get_calls(), 0);
        assert!(files(&dir).is_empty());
    }

    #[test]
    fn test_fetch_failure_writes_nothing() {
        let dir = tempdir().unwrap();
        let provider = InMemoryProvider::with_messages(vec![
            plain_message("a", MARCH_4_2019, "one"),
            plain_message("b", MARCH_4_2019, "two"),
        ])
        .failing("b");

        let err = run_export(&provider, &options(&dir)).unwrap_err();

        assert!(matches!(err, Error::Provider { .. }));
        assert!(files(&dir).is_empty());
    }

    #[test]
    fn test_write_failure_keeps_earlier_files() {
        let dir = tempdir().unwrap();
        // A directory named like the second output file makes that write fail
        fs::create_dir(dir.path().join("b.txt")).unwrap();
        let provider = InMemoryProvider::with_messages(vec![
            plain_message("a", MARCH_4_2019, "one"),
            plain_message("b", MARCH_4_2019, "two"),
            plain_message("c", MARCH_4_2019, "three"),
        ]);

        let err = run_export(&provider, &options(&dir)).unwrap_err();

        assert!(matches!(err, Error::Filesystem { .. }));
        assert!(dir.path().join("a.txt").is_file());
        assert!(!dir.path().join("c.txt").exists());
    }
}
