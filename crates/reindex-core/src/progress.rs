//! Progress reporting for reindex runs.
//!
//! Progress is advisory: the expected total comes from a separate count
//! query and may drift from the rows actually scanned.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

/// Default number of documents between progress reports.
pub const DEFAULT_LOG_EVERY: u64 = 10_000;

/// Progress counters of one reindex pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressCounters {
    /// Label naming the pass, e.g. "Reindexing [Invoice]"
    pub label: String,
    /// Rows the count query reported
    pub expected_total: u64,
    /// Documents handed to the index so far
    pub processed: u64,
    /// Set on the final report
    pub finished: bool,
}

impl ProgressCounters {
    /// Completion in percent, capped at 100. An empty pass counts as done.
    pub fn percent(&self) -> f64 {
        if self.expected_total == 0 {
            return 100.0;
        }
        (self.processed as f64 * 100.0 / self.expected_total as f64).min(100.0)
    }
}

/// Trait for receiving progress updates.
pub trait ProgressCallback: Send + Sync {
    /// Called every `log_every` documents and once when the pass ends.
    fn on_progress(&self, counters: &ProgressCounters);
}

/// A no-op progress callback for when progress reporting isn't needed.
pub struct NoOpProgressCallback;

impl ProgressCallback for NoOpProgressCallback {
    fn on_progress(&self, _counters: &ProgressCounters) {}
}

/// A callback that logs progress at info level.
pub struct LoggingProgressCallback;

impl ProgressCallback for LoggingProgressCallback {
    fn on_progress(&self, counters: &ProgressCounters) {
        if counters.finished {
            info!(
                label = %counters.label,
                processed = counters.processed,
                expected = counters.expected_total,
                "Indexing finished"
            );
        } else {
            info!(
                label = %counters.label,
                processed = counters.processed,
                expected = counters.expected_total,
                percent = format!("{:.1}", counters.percent()),
                "Indexing progress"
            );
        }
    }
}

/// Counts documents of one pass and reports to a callback periodically.
pub struct ProgressMonitor {
    counters: ProgressCounters,
    log_every: u64,
    callback: Arc<dyn ProgressCallback>,
    started: Instant,
}

impl ProgressMonitor {
    /// Monitor logging through [`LoggingProgressCallback`].
    pub fn new(label: impl Into<String>, expected_total: u64) -> Self {
        Self {
            counters: ProgressCounters {
                label: label.into(),
                expected_total,
                processed: 0,
                finished: false,
            },
            log_every: DEFAULT_LOG_EVERY,
            callback: Arc::new(LoggingProgressCallback),
            started: Instant::now(),
        }
    }

    pub fn with_log_every(mut self, log_every: u64) -> Self {
        self.log_every = log_every.max(1);
        self
    }

    pub fn with_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.callback = callback;
        self
    }

    /// Record `n` more indexed documents.
    pub fn documents_added(&mut self, n: u64) {
        let before = self.counters.processed;
        self.counters.processed += n;
        if before / self.log_every != self.counters.processed / self.log_every {
            self.callback.on_progress(&self.counters);
        }
    }

    /// Emit the final report and return the counters.
    pub fn finish(mut self) -> ProgressCounters {
        self.counters.finished = true;
        self.callback.on_progress(&self.counters);
        info!(
            label = %self.counters.label,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Pass complete"
        );
        self.counters
    }

    pub fn counters(&self) -> &ProgressCounters {
        &self.counters
    }
}
