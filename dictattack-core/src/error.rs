use std::fmt;
use std::time::Duration;

/// The stage of a run a failure or timeout belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Index,
    Match,
    Monitor,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Index => f.write_str("index"),
            Phase::Match => f.write_str("match"),
            Phase::Monitor => f.write_str("monitor"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to start worker runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("{phase} phase did not finish within {timeout:?}")]
    Timeout { phase: Phase, timeout: Duration },
}

/// A chunk task that did not complete. Sibling chunks are unaffected; the
/// failure is carried to the final report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFailure {
    pub phase: Phase,
    pub chunk: usize,
    pub reason: String,
}

impl fmt::Display for ChunkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} chunk {} failed: {}", self.phase, self.chunk, self.reason)
    }
}

impl ChunkFailure {
    pub(crate) fn from_join_error(phase: Phase, chunk: usize, err: tokio::task::JoinError) -> Self {
        let reason = if err.is_panic() {
            let payload = err.into_panic();
            payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "worker panicked".to_string())
        } else {
            err.to_string()
        };
        Self { phase, chunk, reason }
    }
}
