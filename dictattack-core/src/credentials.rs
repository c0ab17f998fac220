//! Credential records and the store the match engine resolves in place.

use std::sync::{Arc, OnceLock};

use crate::digest::HashAlgorithm;

/// Read view of a record's resolution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus<'a> {
    Unresolved,
    Found(&'a str),
}

/// One `username,hashed_password` entry from a credential dump.
///
/// The recovered plaintext lives in a set-once cell, so the transition from
/// unresolved to found happens at most once and is never reverted.
#[derive(Debug)]
pub struct CredentialRecord {
    username: String,
    hashed_password: String,
    found: OnceLock<String>,
}

impl CredentialRecord {
    /// Creates an unresolved record. The hash is trimmed and stored lowercase.
    pub fn new(username: impl Into<String>, hashed_password: &str) -> Self {
        Self {
            username: username.into(),
            hashed_password: hashed_password.trim().to_ascii_lowercase(),
            found: OnceLock::new(),
        }
    }

    /// Parses a `username,hashed_password` line. Only the first comma splits;
    /// lines without a comma yield `None`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let (username, hash) = line.split_once(',')?;
        Some(Self::new(username, hash))
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn hashed_password(&self) -> &str {
        &self.hashed_password
    }

    pub fn status(&self) -> MatchStatus<'_> {
        match self.found.get() {
            Some(plain) => MatchStatus::Found(plain),
            None => MatchStatus::Unresolved,
        }
    }

    pub fn is_found(&self) -> bool {
        self.found.get().is_some()
    }

    pub fn plaintext(&self) -> Option<&str> {
        self.found.get().map(String::as_str)
    }

    /// Records the recovered plaintext. Returns `false` if the record was
    /// already resolved, in which case the stored value is left untouched.
    pub(crate) fn resolve(&self, plaintext: &str) -> bool {
        self.found.set(plaintext.to_string()).is_ok()
    }
}

/// The finalized set of records for one run.
///
/// Duplicate usernames are kept as independent records. Cloning is cheap and
/// shares the underlying records.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    records: Arc<[CredentialRecord]>,
}

impl CredentialStore {
    pub fn new(records: Vec<CredentialRecord>) -> Self {
        Self { records: records.into() }
    }

    /// Parses every line, skipping malformed ones.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines
            .into_iter()
            .filter_map(|line| CredentialRecord::parse_line(line.as_ref()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[CredentialRecord] {
        &self.records
    }

    pub(crate) fn shared(&self) -> Arc<[CredentialRecord]> {
        Arc::clone(&self.records)
    }

    pub fn found_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_found()).count()
    }

    /// Records whose hash cannot be a hex digest of `algorithm`. They are kept
    /// and will stay unresolved.
    pub fn unmatchable(&self, algorithm: HashAlgorithm) -> usize {
        self.records
            .iter()
            .filter(|r| {
                r.hashed_password.len() != algorithm.hex_len()
                    || !r.hashed_password.bytes().all(|b| b.is_ascii_hexdigit())
            })
            .count()
    }

    /// Resolved records paired with their plaintext, in input order.
    pub fn resolved(&self) -> impl Iterator<Item = (&CredentialRecord, &str)> {
        self.records
            .iter()
            .filter_map(|record| record.plaintext().map(|plain| (record, plain)))
    }
}

impl FromIterator<CredentialRecord> for CredentialStore {
    fn from_iter<T: IntoIterator<Item = CredentialRecord>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
