//! Sequences the two phases and the progress monitor on a per-run runtime.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::credentials::CredentialStore;
use crate::digest::HashAlgorithm;
use crate::error::{ChunkFailure, Error, Phase};
use crate::index::{IndexBuild, Wordlist, build_index};
use crate::matcher::match_all;
use crate::progress::{
    DEFAULT_CHECKPOINT_STEP, DEFAULT_POLL_INTERVAL, ProgressCounters, ProgressMonitor, ProgressReporter,
};

/// Upper bound for either worker phase.
pub const DEFAULT_PHASE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Upper bound for the monitor to wind down once matching is done.
pub const DEFAULT_MONITOR_TIMEOUT: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Size of the blocking pool shared by both phases, and the chunk count.
    pub workers: usize,
    pub algorithm: HashAlgorithm,
    pub poll_interval: Duration,
    /// Records between progress lines.
    pub checkpoint_step: u64,
    pub phase_timeout: Duration,
    pub monitor_timeout: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1),
            algorithm: HashAlgorithm::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            checkpoint_step: DEFAULT_CHECKPOINT_STEP,
            phase_timeout: DEFAULT_PHASE_TIMEOUT,
            monitor_timeout: DEFAULT_MONITOR_TIMEOUT,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.workers == 0 {
            return Err(Error::InvalidConfig("workers must be at least 1".into()));
        }
        if self.checkpoint_step == 0 {
            return Err(Error::InvalidConfig("checkpoint_step must be at least 1".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(Error::InvalidConfig("poll_interval must be non-zero".into()));
        }
        if self.phase_timeout.is_zero() || self.monitor_timeout.is_zero() {
            return Err(Error::InvalidConfig("timeouts must be non-zero".into()));
        }
        Ok(())
    }
}

/// Aggregate outcome of a run.
#[derive(Debug)]
pub struct RunReport {
    pub passwords_found: u64,
    pub hashes_computed: u64,
    pub records: usize,
    /// Distinct digests in the index.
    pub index_size: usize,
    /// Time since the coordinator was created, input loading included.
    pub elapsed: Duration,
    pub failures: Vec<ChunkFailure>,
}

pub struct Coordinator {
    config: RunConfig,
    started: Instant,
}

impl Coordinator {
    /// Validates `config` and starts the run clock.
    pub fn new(config: RunConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self { config, started: Instant::now() })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs both phases against `store`, resolving its records in place.
    ///
    /// Chunk work runs on a blocking pool capped at `workers` threads. The
    /// monitor runs as an async task on the runtime's own worker thread, so a
    /// backlog of chunk tasks cannot starve it.
    pub fn run(
        &self,
        store: &CredentialStore,
        wordlist: Wordlist,
        reporter: Box<dyn ProgressReporter>,
    ) -> Result<RunReport, Error> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(self.config.workers)
            .thread_name("dictattack-worker")
            .enable_time()
            .build()
            .map_err(Error::Runtime)?;

        let result = runtime.block_on(self.run_phases(store, wordlist, reporter));

        // Timed-out chunks cannot be interrupted; do not wait for them.
        runtime.shutdown_background();
        result
    }

    async fn run_phases(
        &self,
        store: &CredentialStore,
        wordlist: Wordlist,
        reporter: Box<dyn ProgressReporter>,
    ) -> Result<RunReport, Error> {
        let config = &self.config;
        let counters = Arc::new(ProgressCounters::new());

        info!("Building hash index with {} workers", config.workers);
        let IndexBuild { index, hashes_computed, mut failures } = timeout(
            config.phase_timeout,
            build_index(Arc::new(wordlist), config.algorithm, config.workers, Arc::clone(&counters)),
        )
        .await
        .map_err(|_| Error::Timeout { phase: Phase::Index, timeout: config.phase_timeout })?;

        let index = Arc::new(index);
        let index_size = index.len();
        let total = store.len() as u64;

        let cancel = CancellationToken::new();
        let monitor = ProgressMonitor::new(reporter, config.poll_interval, config.checkpoint_step);
        let monitor_handle = tokio::spawn(monitor.run(total, Arc::clone(&counters), cancel.clone()));

        let outcome = match timeout(
            config.phase_timeout,
            match_all(store, index, config.workers, Arc::clone(&counters)),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                cancel.cancel();
                return Err(Error::Timeout { phase: Phase::Match, timeout: config.phase_timeout });
            }
        };

        // A failed chunk leaves records unprocessed; the monitor would never
        // reach its exit condition.
        if counters.records_processed() < total {
            cancel.cancel();
        }

        join_monitor(monitor_handle, config.monitor_timeout, &cancel).await?;

        failures.extend(outcome.failures);

        Ok(RunReport {
            passwords_found: outcome.passwords_found,
            hashes_computed,
            records: store.len(),
            index_size,
            elapsed: self.started.elapsed(),
            failures,
        })
    }
}

/// Waits for the monitor task. A monitor that outlives `limit` is cancelled
/// and reported as a timeout; a monitor that panicked is only logged.
async fn join_monitor(
    handle: JoinHandle<bool>,
    limit: Duration,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    match timeout(limit, handle).await {
        Ok(Ok(true)) => {}
        Ok(Ok(false)) => debug!("Progress output suppressed after cancellation"),
        Ok(Err(e)) => warn!("Progress monitor failed: {}", e),
        Err(_) => {
            cancel.cancel();
            return Err(Error::Timeout { phase: Phase::Monitor, timeout: limit });
        }
    }
    Ok(())
}
