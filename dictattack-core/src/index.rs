//! Phase one: digest every wordlist entry in parallel and merge the results
//! into a single digest → plaintext index.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::ops::Range;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::digest::HashAlgorithm;
use crate::error::{ChunkFailure, Phase};
use crate::partition::chunk_ranges;
use crate::progress::ProgressCounters;

/// Candidate plaintexts in file order. Absent entries (lines that could not be
/// decoded) are kept positionally but never hashed or counted.
#[derive(Debug, Clone, Default)]
pub struct Wordlist {
    entries: Vec<Option<String>>,
}

impl Wordlist {
    pub fn new(entries: Vec<Option<String>>) -> Self {
        Self { entries }
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        words.into_iter().map(|w| Some(w.into())).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries that will actually be hashed.
    pub fn present(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn entries(&self) -> &[Option<String>] {
        &self.entries
    }
}

impl FromIterator<Option<String>> for Wordlist {
    fn from_iter<T: IntoIterator<Item = Option<String>>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Immutable-after-build reverse lookup from hex digest to plaintext.
#[derive(Debug, Default)]
pub struct HashIndex {
    map: HashMap<String, String>,
}

impl HashIndex {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { map: HashMap::with_capacity(capacity) }
    }

    pub fn get(&self, digest: &str) -> Option<&str> {
        self.map.get(digest).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Inserts `plaintext` under `digest` unless the digest is already present.
    /// Returns whether the value was inserted.
    pub fn insert_if_absent(&mut self, digest: String, plaintext: String) -> bool {
        match self.map.entry(digest) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(plaintext);
                true
            }
        }
    }

    /// Merges a chunk-local map, keeping existing entries. Returns the number
    /// of new digests.
    pub fn merge(&mut self, local: HashMap<String, String>) -> usize {
        let mut inserted = 0;
        for (digest, plaintext) in local {
            if self.insert_if_absent(digest, plaintext) {
                inserted += 1;
            }
        }
        inserted
    }
}

/// Result of phase one.
#[derive(Debug)]
pub struct IndexBuild {
    pub index: HashIndex,
    pub hashes_computed: u64,
    pub failures: Vec<ChunkFailure>,
}

/// Hashes one chunk into a local map, first plaintext wins per digest.
fn hash_chunk(
    words: &Wordlist,
    range: Range<usize>,
    algorithm: HashAlgorithm,
    counters: &ProgressCounters,
) -> HashMap<String, String> {
    let slice = &words.entries()[range];
    let mut digester = algorithm.digester();
    let mut local = HashMap::with_capacity(slice.len());

    for plain in slice.iter().flatten() {
        #[cfg(test)]
        crate::fault::inject(plain);
        let hex = digester.hex_digest(plain);
        local.entry(hex).or_insert_with(|| plain.clone());
        counters.increment_hashes();
    }

    local
}

/// Builds the hash index from `words` using up to `workers` blocking tasks.
///
/// Chunk maps are merged in chunk order once each task finishes, so the
/// collision winner is the same on every run with the same inputs. A chunk
/// that panics is reported in [`IndexBuild::failures`]; the remaining chunks
/// are still awaited and merged.
pub async fn build_index(
    words: Arc<Wordlist>,
    algorithm: HashAlgorithm,
    workers: usize,
    counters: Arc<ProgressCounters>,
) -> IndexBuild {
    let ranges = chunk_ranges(words.len(), workers);
    info!(
        "Hashing {} candidates with {} in {} chunks",
        words.len(),
        algorithm,
        ranges.len()
    );

    let mut handles = Vec::with_capacity(ranges.len());
    for range in ranges {
        let words = Arc::clone(&words);
        let counters = Arc::clone(&counters);
        handles.push(tokio::task::spawn_blocking(move || {
            hash_chunk(&words, range, algorithm, &counters)
        }));
    }

    let mut index = HashIndex::with_capacity(words.len());
    let mut failures = Vec::new();
    for (chunk, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(local) => {
                let local_len = local.len();
                let inserted = index.merge(local);
                debug!(chunk, local_len, inserted, "Merged index chunk");
            }
            Err(e) => {
                let failure = ChunkFailure::from_join_error(Phase::Index, chunk, e);
                error!("Error computing hashes: {}", failure);
                failures.push(failure);
            }
        }
    }

    let hashes_computed = counters.hashes_computed();
    info!("Index built: {} hashes computed, {} distinct digests", hashes_computed, index.len());

    IndexBuild { index, hashes_computed, failures }
}
