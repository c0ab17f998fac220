//! Shared counters and the progress monitor that observes them.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default number of processed records between progress lines.
pub const DEFAULT_CHECKPOINT_STEP: u64 = 1000;

/// Default monitor polling interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Counters written by index and match workers, read by the monitor.
///
/// Increments use `Release` and reads use `Acquire`: a reader that observes an
/// incremented `passwords_found` or `records_processed` also observes the
/// record update that preceded it.
#[derive(Debug, Default)]
pub struct ProgressCounters {
    hashes_computed: AtomicU64,
    passwords_found: AtomicU64,
    records_processed: AtomicU64,
}

impl ProgressCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_hashes(&self) {
        self.hashes_computed.fetch_add(1, Ordering::Release);
    }

    pub fn increment_found(&self) {
        self.passwords_found.fetch_add(1, Ordering::Release);
    }

    pub fn increment_processed(&self) {
        self.records_processed.fetch_add(1, Ordering::Release);
    }

    pub fn hashes_computed(&self) -> u64 {
        self.hashes_computed.load(Ordering::Acquire)
    }

    pub fn passwords_found(&self) -> u64 {
        self.passwords_found.load(Ordering::Acquire)
    }

    pub fn records_processed(&self) -> u64 {
        self.records_processed.load(Ordering::Acquire)
    }
}

/// Point-in-time view handed to a [`ProgressReporter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub processed: u64,
    pub total: u64,
    pub found: u64,
}

impl ProgressSnapshot {
    pub fn remaining(&self) -> u64 {
        self.total.saturating_sub(self.processed)
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.processed as f64 / self.total as f64 * 100.0
        }
    }
}

/// Tracks the highest checkpoint already reported.
#[derive(Debug)]
pub struct CheckpointTracker {
    step: u64,
    last: u64,
}

impl CheckpointTracker {
    pub fn new(step: u64) -> Self {
        Self { step: step.max(1), last: 0 }
    }

    /// Returns the newest checkpoint crossed since the previous call, if any.
    /// Checkpoints skipped over in a single burst are collapsed into one.
    pub fn observe(&mut self, processed: u64) -> Option<u64> {
        let checkpoint = processed / self.step * self.step;
        if checkpoint > self.last {
            self.last = checkpoint;
            Some(checkpoint)
        } else {
            None
        }
    }
}

/// Renders progress. Implementations must not block for long; they run on the
/// monitor task.
pub trait ProgressReporter: Send {
    /// Called on every poll before completion with the live counts.
    fn poll(&mut self, _snapshot: &ProgressSnapshot) {}

    fn checkpoint(&mut self, snapshot: &ProgressSnapshot);

    /// Called exactly once when monitoring ends normally.
    fn finish(&mut self, snapshot: &ProgressSnapshot);
}

/// Formats a progress line with a local timestamp.
pub fn format_progress_line(snapshot: &ProgressSnapshot) -> String {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    format!(
        "[{}] {:.2}% complete | Passwords Found: {} | Tasks Remaining: {}",
        timestamp,
        snapshot.percent(),
        snapshot.found,
        snapshot.remaining()
    )
}

/// Writes one line per checkpoint to the wrapped writer.
pub struct LineReporter<W> {
    out: W,
    broken: bool,
}

impl<W: Write + Send> LineReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out, broken: false }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, snapshot: &ProgressSnapshot) {
        if self.broken {
            return;
        }
        let line = format_progress_line(snapshot);
        if let Err(e) = writeln!(self.out, "{}", line).and_then(|_| self.out.flush()) {
            warn!("Progress output disabled: {}", e);
            self.broken = true;
        }
    }
}

impl LineReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ProgressReporter for LineReporter<W> {
    fn checkpoint(&mut self, snapshot: &ProgressSnapshot) {
        self.emit(snapshot);
    }

    fn finish(&mut self, snapshot: &ProgressSnapshot) {
        self.emit(snapshot);
    }
}

/// Drives an indicatif progress bar instead of printing lines.
pub struct BarReporter {
    bar: ProgressBar,
}

impl BarReporter {
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        match ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            Ok(style) => bar.set_style(style.progress_chars("#>-")),
            Err(e) => warn!("Invalid progress bar template: {}", e),
        }
        Self { bar }
    }
}

impl ProgressReporter for BarReporter {
    fn poll(&mut self, snapshot: &ProgressSnapshot) {
        self.bar.set_position(snapshot.processed);
        self.bar.set_message(format!("found {}", snapshot.found));
    }

    fn checkpoint(&mut self, _snapshot: &ProgressSnapshot) {}

    fn finish(&mut self, snapshot: &ProgressSnapshot) {
        self.bar.set_position(snapshot.processed);
        self.bar.finish_with_message(format!("found {}", snapshot.found));
    }
}

/// Polls `records_processed` and reports checkpoints until every record has
/// been processed or the token is cancelled.
pub struct ProgressMonitor {
    reporter: Box<dyn ProgressReporter>,
    poll_interval: Duration,
    tracker: CheckpointTracker,
}

impl ProgressMonitor {
    pub fn new(reporter: Box<dyn ProgressReporter>, poll_interval: Duration, checkpoint_step: u64) -> Self {
        Self {
            reporter,
            poll_interval,
            tracker: CheckpointTracker::new(checkpoint_step),
        }
    }

    /// Runs the polling loop. Returns `true` if the final line was emitted and
    /// `false` if monitoring was cancelled first.
    pub async fn run(
        mut self,
        total_records: u64,
        counters: Arc<ProgressCounters>,
        cancel: CancellationToken,
    ) -> bool {
        loop {
            if cancel.is_cancelled() {
                debug!("Progress monitor cancelled");
                return false;
            }

            let processed = counters.records_processed();
            if processed >= total_records {
                break;
            }

            let found = counters.passwords_found();
            self.reporter.poll(&ProgressSnapshot { processed, total: total_records, found });

            if let Some(checkpoint) = self.tracker.observe(processed) {
                self.reporter.checkpoint(&ProgressSnapshot { processed: checkpoint, total: total_records, found });
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Progress monitor cancelled");
                    return false;
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        self.reporter.finish(&ProgressSnapshot {
            processed: counters.records_processed(),
            total: total_records,
            found: counters.passwords_found(),
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Poll(ProgressSnapshot),
        Checkpoint(ProgressSnapshot),
        Finish(ProgressSnapshot),
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Event>>>);

    impl Recorder {
        fn events(&self) -> Vec<Event> {
            self.0.lock().unwrap().clone()
        }
    }

    impl ProgressReporter for Recorder {
        fn poll(&mut self, snapshot: &ProgressSnapshot) {
            self.0.lock().unwrap().push(Event::Poll(*snapshot));
        }

        fn checkpoint(&mut self, snapshot: &ProgressSnapshot) {
            self.0.lock().unwrap().push(Event::Checkpoint(*snapshot));
        }

        fn finish(&mut self, snapshot: &ProgressSnapshot) {
            self.0.lock().unwrap().push(Event::Finish(*snapshot));
        }
    }

    #[test]
    fn test_tracker_reports_each_checkpoint_once() {
        let mut tracker = CheckpointTracker::new(1000);
        assert_eq!(tracker.observe(0), None);
        assert_eq!(tracker.observe(999), None);
        assert_eq!(tracker.observe(1000), Some(1000));
        assert_eq!(tracker.observe(1000), None);
        assert_eq!(tracker.observe(1500), None);
        assert_eq!(tracker.observe(2001), Some(2000));
    }

    #[test]
    fn test_tracker_collapses_bursts() {
        let mut tracker = CheckpointTracker::new(1000);
        assert_eq!(tracker.observe(5432), Some(5000));
        assert_eq!(tracker.observe(5000), None);
        assert_eq!(tracker.observe(5999), None);
        assert_eq!(tracker.observe(6000), Some(6000));
    }

    #[test]
    fn test_snapshot_math() {
        let snapshot = ProgressSnapshot { processed: 250, total: 1000, found: 3 };
        assert_eq!(snapshot.remaining(), 750);
        assert!((snapshot.percent() - 25.0).abs() < f64::EPSILON);

        let empty = ProgressSnapshot { processed: 0, total: 0, found: 0 };
        assert_eq!(empty.remaining(), 0);
        assert!((empty.percent() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_progress_line_format() {
        let line = format_progress_line(&ProgressSnapshot { processed: 1000, total: 4000, found: 7 });
        assert!(line.starts_with('['));
        assert!(line.ends_with("] 25.00% complete | Passwords Found: 7 | Tasks Remaining: 3000"), "{line}");
    }

    #[test]
    fn test_line_reporter_writes_lines() {
        let mut reporter = LineReporter::new(Vec::new());
        let snapshot = ProgressSnapshot { processed: 2, total: 2, found: 1 };
        reporter.checkpoint(&snapshot);
        reporter.finish(&snapshot);
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(out.lines().count(), 2);
        assert!(out.contains("100.00% complete | Passwords Found: 1 | Tasks Remaining: 0"));
    }

    #[tokio::test]
    async fn test_monitor_emits_final_line_when_already_done() {
        let counters = Arc::new(ProgressCounters::new());
        for _ in 0..1234 {
            counters.increment_processed();
        }
        counters.increment_found();

        let recorder = Recorder::default();
        let monitor = ProgressMonitor::new(Box::new(recorder.clone()), Duration::from_millis(1), 1000);
        assert!(monitor.run(1234, counters, CancellationToken::new()).await);

        assert_eq!(
            recorder.events(),
            vec![Event::Finish(ProgressSnapshot { processed: 1234, total: 1234, found: 1 })]
        );
    }

    #[tokio::test]
    async fn test_monitor_empty_store_finishes_at_full_percent() {
        let recorder = Recorder::default();
        let monitor = ProgressMonitor::new(Box::new(recorder.clone()), Duration::from_millis(1), 1000);
        assert!(monitor.run(0, Arc::new(ProgressCounters::new()), CancellationToken::new()).await);

        let events = recorder.events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::Finish(s) => assert_eq!(s.remaining(), 0),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_monitor_tracks_concurrent_progress() {
        let total = 5_500u64;
        let counters = Arc::new(ProgressCounters::new());
        let recorder = Recorder::default();
        let monitor = ProgressMonitor::new(Box::new(recorder.clone()), Duration::from_millis(1), 1000);
        let handle = tokio::spawn(monitor.run(total, Arc::clone(&counters), CancellationToken::new()));

        let producer = Arc::clone(&counters);
        tokio::task::spawn_blocking(move || {
            for i in 0..total {
                if i % 10 == 0 {
                    producer.increment_found();
                }
                producer.increment_processed();
                if i % 500 == 0 {
                    std::thread::sleep(Duration::from_millis(2));
                }
            }
        })
        .await
        .unwrap();

        assert!(handle.await.unwrap());

        let events = recorder.events();
        let checkpoints: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                Event::Checkpoint(s) => Some(s.processed),
                Event::Poll(_) | Event::Finish(_) => None,
            })
            .collect();
        assert!(checkpoints.windows(2).all(|w| w[0] < w[1]), "checkpoints repeated: {checkpoints:?}");
        assert!(checkpoints.iter().all(|c| c % 1000 == 0 && *c > 0));

        match events.last() {
            Some(Event::Finish(s)) => {
                assert_eq!(s.processed, total);
                assert_eq!(s.remaining(), 0);
                assert_eq!(s.found, 550);
            }
            other => panic!("expected final line, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_monitor_cancellation_suppresses_output() {
        let counters = Arc::new(ProgressCounters::new());
        let recorder = Recorder::default();
        let cancel = CancellationToken::new();
        let monitor = ProgressMonitor::new(Box::new(recorder.clone()), Duration::from_secs(60), 1000);
        let handle = tokio::spawn(monitor.run(10, counters, cancel.clone()));

        cancel.cancel();
        assert!(!handle.await.unwrap());
        assert!(recorder.events().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_small_store_reports_live_polls() {
        let total = 40u64;
        let counters = Arc::new(ProgressCounters::new());
        let recorder = Recorder::default();
        let monitor = ProgressMonitor::new(Box::new(recorder.clone()), Duration::from_millis(1), 1000);
        let handle = tokio::spawn(monitor.run(total, Arc::clone(&counters), CancellationToken::new()));

        let producer = Arc::clone(&counters);
        tokio::task::spawn_blocking(move || {
            for _ in 0..total {
                producer.increment_processed();
                std::thread::sleep(Duration::from_millis(1));
            }
        })
        .await
        .unwrap();
        assert!(handle.await.unwrap());

        let events = recorder.events();
        let polls: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                Event::Poll(s) => Some(s.processed),
                _ => None,
            })
            .collect();
        assert!(!polls.is_empty());
        assert!(polls.windows(2).all(|w| w[0] <= w[1]), "polls went backwards: {polls:?}");
        assert!(polls.iter().all(|p| *p < total));
        assert!(!events.iter().any(|e| matches!(e, Event::Checkpoint(_))));
        assert!(matches!(events.last(), Some(Event::Finish(s)) if s.processed == total));
    }

    #[test]
    fn test_bar_follows_polls() {
        let mut reporter = BarReporter::new(40);
        reporter.bar.set_draw_target(indicatif::ProgressDrawTarget::hidden());
        reporter.poll(&ProgressSnapshot { processed: 7, total: 40, found: 2 });
        assert_eq!(reporter.bar.position(), 7);

        reporter.checkpoint(&ProgressSnapshot { processed: 0, total: 40, found: 2 });
        assert_eq!(reporter.bar.position(), 7);

        reporter.finish(&ProgressSnapshot { processed: 40, total: 40, found: 3 });
        assert_eq!(reporter.bar.position(), 40);
        assert!(reporter.bar.is_finished());
    }
}
