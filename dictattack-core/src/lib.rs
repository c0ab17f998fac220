//! Dictionary attack engine for auditing unsalted password hashes.
//!
//! A run has two phases. First every candidate in a wordlist is hashed in
//! parallel and merged into a [`HashIndex`] mapping hex digest to plaintext.
//! Once the index is complete it is frozen behind an `Arc`, and the records of
//! a [`CredentialStore`] are resolved against it in parallel. A
//! [`ProgressMonitor`] observes the shared counters during the second phase.
//!
//! ```no_run
//! use dictattack_core::{Coordinator, CredentialStore, LineReporter, RunConfig, Wordlist};
//!
//! let coordinator = Coordinator::new(RunConfig::default())?;
//! let store = CredentialStore::from_lines(["alice,5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"]);
//! let words = Wordlist::from_words(["password", "hello"]);
//!
//! let report = coordinator.run(&store, words, Box::new(LineReporter::stdout()))?;
//! assert_eq!(report.passwords_found, 1);
//! # Ok::<(), dictattack_core::Error>(())
//! ```
//!
//! # Concurrency
//!
//! - Both phases split their input into contiguous chunks, one per worker, and
//!   run them on a fixed-size blocking pool.
//! - Index chunks hash into private maps that are merged first-write-wins, so
//!   the shared index has a single writer.
//! - Each credential record belongs to exactly one match chunk and can only be
//!   resolved once.
//! - Counters are the only state written by several threads at once.

pub mod coordinator;
pub mod credentials;
pub mod digest;
pub mod error;
#[cfg(test)]
mod fault;
pub mod index;
pub mod matcher;
pub mod partition;
pub mod progress;

pub use coordinator::{Coordinator, RunConfig, RunReport};
pub use credentials::{CredentialRecord, CredentialStore, MatchStatus};
pub use digest::{Digester, HashAlgorithm};
pub use error::{ChunkFailure, Error, Phase};
pub use index::{HashIndex, IndexBuild, Wordlist, build_index};
pub use matcher::{MatchOutcome, match_all};
pub use progress::{
    BarReporter, CheckpointTracker, LineReporter, ProgressCounters, ProgressMonitor, ProgressReporter,
    ProgressSnapshot,
};
