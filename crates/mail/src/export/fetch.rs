//! Bounded parallel message fetching

use log::{debug, warn};
use rayon::prelude::*;

use crate::error::Result;
use crate::gmail::MailProvider;
use crate::gmail::api::{GmailMessage, MessageRef};

/// Fetch every referenced message with at most `concurrency` requests in flight
///
/// Messages come back in the order of `refs`. The call is all-or-nothing:
/// the first failed fetch fails the whole batch.
pub fn fetch_all(
    provider: &dyn MailProvider,
    refs: &[MessageRef],
    concurrency: usize,
) -> Result<Vec<GmailMessage>> {
    if refs.is_empty() {
        return Ok(Vec::new());
    }

    let fetch = || {
        refs.par_iter()
            .map(|r| {
                debug!("Fetching message {}", r.id);
                provider.get_message(&r.id)
            })
            .collect::<Result<Vec<_>>>()
    };

    match rayon::ThreadPoolBuilder::new()
        .num_threads(concurrency.max(1))
        .thread_name(|i| format!("fetch-{i}"))
        .build()
    {
        Ok(pool) => pool.install(fetch),
        Err(e) => {
            warn!("Failed to build fetch pool ({}), using the global pool", e);
            fetch()
        }
    }
}
