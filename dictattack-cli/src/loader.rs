//! Line-oriented loading of the wordlist and the credential dump.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use dictattack_core::{CredentialRecord, CredentialStore, Wordlist};
use tracing::{debug, info, warn};

use crate::error::Error;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Strips a trailing `\r` left behind by CRLF line endings.
#[inline]
fn trim_cr(mut line: Vec<u8>) -> Vec<u8> {
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    line
}

fn open(kind: &'static str, path: &Path) -> Result<BufReader<File>, Error> {
    let file = File::open(path).map_err(|source| Error::Input { kind, path: path.to_path_buf(), source })?;
    Ok(BufReader::with_capacity(READ_BUFFER_SIZE, file))
}

/// Loads one candidate per line. Lines that are not valid UTF-8 are kept as
/// absent entries so they are skipped without being counted.
pub fn load_wordlist(path: &Path) -> Result<Wordlist, Error> {
    let reader = open("wordlist", path)?;
    let mut entries = Vec::new();
    let mut undecodable = 0usize;

    for line in reader.split(b'\n') {
        let line = line.map_err(|source| Error::Input { kind: "wordlist", path: path.to_path_buf(), source })?;
        let entry = String::from_utf8(trim_cr(line)).ok();
        if entry.is_none() {
            undecodable += 1;
        }
        entries.push(entry);
    }

    if undecodable > 0 {
        warn!("Skipping {} wordlist lines that are not valid UTF-8", undecodable);
    }
    info!("Loaded {} wordlist entries from {}", entries.len(), path.display());
    Ok(Wordlist::new(entries))
}

/// Loads `username,hashed_password` records. Lines without a comma are
/// skipped. Duplicate usernames are kept as separate records.
pub fn load_credentials(path: &Path) -> Result<CredentialStore, Error> {
    let reader = open("credentials", path)?;
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for line in reader.split(b'\n') {
        let line = line.map_err(|source| Error::Input { kind: "credentials", path: path.to_path_buf(), source })?;
        let line = trim_cr(line);
        let text: Cow<'_, str> = String::from_utf8_lossy(&line);
        match CredentialRecord::parse_line(&text) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!("Skipped {} malformed credential lines", skipped);
    }
    info!("Loaded {} credential records from {}", records.len(), path.display());
    Ok(CredentialStore::new(records))
}
