//! Pluggable one-way digest used to key the hash index.
//!
//! Digests are rendered as lowercase hex so they compare directly against the
//! normalized `hashed_password` column of a credential record.

use std::fmt;

use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Lowercase hex lookup table for digest encoding.
pub const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";

/// Supported unsalted, single-round digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha1,
}

impl HashAlgorithm {
    /// Length of the hex-encoded digest in characters.
    pub const fn hex_len(self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 64,
            HashAlgorithm::Sha1 => 40,
        }
    }

    /// Creates an independent digest context. Each worker owns one.
    pub fn digester(self) -> Digester {
        match self {
            HashAlgorithm::Sha256 => Digester::Sha256(Sha256::new()),
            HashAlgorithm::Sha1 => Digester::Sha1(Sha1::new()),
        }
    }

    /// One-shot convenience around [`Digester::hex_digest`].
    pub fn hex_digest(self, plaintext: &str) -> String {
        self.digester().hex_digest(plaintext)
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Sha256 => f.write_str("sha256"),
            HashAlgorithm::Sha1 => f.write_str("sha1"),
        }
    }
}

/// A reusable hasher. The internal state is reset after every digest, so one
/// `Digester` can hash an entire chunk without reallocating.
pub enum Digester {
    Sha256(Sha256),
    Sha1(Sha1),
}

impl Digester {
    /// Hashes `plaintext` as UTF-8 bytes and returns the lowercase hex digest.
    pub fn hex_digest(&mut self, plaintext: &str) -> String {
        match self {
            Digester::Sha256(hasher) => {
                hasher.update(plaintext.as_bytes());
                let hash: [u8; 32] = hasher.finalize_reset().into();
                encode_hex(&hash)
            }
            Digester::Sha1(hasher) => {
                hasher.update(plaintext.as_bytes());
                let hash: [u8; 20] = hasher.finalize_reset().into();
                encode_hex(&hash)
            }
        }
    }
}

/// Encodes raw digest bytes as lowercase hex.
#[inline]
pub fn encode_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(HEX_CHARS[(b >> 4) as usize] as char);
        out.push(HEX_CHARS[(b & 0x0f) as usize] as char);
    }
    out
}
