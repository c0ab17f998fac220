//! Phase two: resolve each credential record against the finished index.

use std::ops::Range;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::credentials::{CredentialRecord, CredentialStore};
use crate::error::{ChunkFailure, Phase};
use crate::index::HashIndex;
use crate::partition::chunk_ranges;
use crate::progress::ProgressCounters;

/// Result of phase two.
#[derive(Debug)]
pub struct MatchOutcome {
    pub passwords_found: u64,
    pub failures: Vec<ChunkFailure>,
}

/// Resolves one chunk of records. Returns the number of records this chunk
/// transitioned to found.
fn match_chunk(
    records: &[CredentialRecord],
    range: Range<usize>,
    index: &HashIndex,
    counters: &ProgressCounters,
) -> u64 {
    let mut found = 0;
    for record in &records[range] {
        #[cfg(test)]
        crate::fault::inject(record.username());
        if !record.is_found() {
            if let Some(plain) = index.get(record.hashed_password()) {
                if record.resolve(plain) {
                    counters.increment_found();
                    found += 1;
                }
            }
        }
        counters.increment_processed();
    }
    found
}

/// Looks up every record of `store` in `index`, resolving matches in place.
///
/// Each record belongs to exactly one chunk, so each record has exactly one
/// writer. `passwords_found` is read back from `counters`, which must be fresh
/// for this run. Failed chunks are logged and returned; their siblings still
/// run to completion.
pub async fn match_all(
    store: &CredentialStore,
    index: Arc<HashIndex>,
    workers: usize,
    counters: Arc<ProgressCounters>,
) -> MatchOutcome {
    let records = store.shared();
    let ranges = chunk_ranges(records.len(), workers);
    info!("Matching {} records in {} chunks", records.len(), ranges.len());

    let mut handles = Vec::with_capacity(ranges.len());
    for range in ranges {
        let records = Arc::clone(&records);
        let index = Arc::clone(&index);
        let counters = Arc::clone(&counters);
        handles.push(tokio::task::spawn_blocking(move || {
            match_chunk(&records, range, &index, &counters)
        }));
    }

    let mut failures = Vec::new();
    for (chunk, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(found) => debug!(chunk, found, "Match chunk complete"),
            Err(e) => {
                let failure = ChunkFailure::from_join_error(Phase::Match, chunk, e);
                error!("Error looking up users: {}", failure);
                failures.push(failure);
            }
        }
    }

    MatchOutcome {
        passwords_found: counters.passwords_found(),
        failures,
    }
}
