//! Rebuild of the search index from the row store.
//!
//! [`Reindexer`] runs one job at a time over a list of entity types. Each
//! type is scanned through a forward-only cursor, optionally recalculated,
//! handed to the index sink in batches and finally optimized.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use reindex_types::{ReindexSettings, Settings};

use crate::checkpoint::{CheckpointStore, ReindexCheckpoint};
use crate::coordinator::JobCoordinator;
use crate::error::IndexingError;
use crate::progress::{LoggingProgressCallback, ProgressCallback, ProgressMonitor, DEFAULT_LOG_EVERY};
use crate::query::{build_count_query, build_query};
use crate::registry::{EntityDescriptor, EntityRegistry};
use crate::sink::IndexSink;
use crate::source::{RowSource, SessionGuard};

/// Configuration for index rebuild operations.
#[derive(Debug, Clone)]
pub struct RebuildConfig {
    /// Rows between index flushes; also the cursor fetch size.
    pub batch_size: usize,
    /// Documents between progress reports.
    pub progress_log_every: u64,
    /// Whether a failing entity type lets the remaining types run.
    pub continue_on_error: bool,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            progress_log_every: DEFAULT_LOG_EVERY,
            continue_on_error: false,
        }
    }
}

impl RebuildConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            batch_size: settings.batch_size,
            progress_log_every: settings.progress_log_every,
            continue_on_error: settings.continue_on_error,
        }
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn with_progress_log_every(mut self, every: u64) -> Self {
        self.progress_log_every = every;
        self
    }

    /// Set whether to continue on errors.
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }
}

/// Result of one entity type within a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeOutcome {
    /// Rows handed to the index
    Indexed(u64),
    /// The pass failed; only reported with `continue_on_error`
    Failed(String),
}

/// Per-type line of a finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeReport {
    pub entity_type: String,
    pub outcome: TypeOutcome,
}

/// Result of a rebuild request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// Another job was running; nothing was done.
    Rejected { running_since: DateTime<Utc> },
    /// The job ran over all requested types.
    Completed {
        /// Short names of the processed types, each followed by ", "
        summary: String,
        reports: Vec<TypeReport>,
    },
}

impl RebuildOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, RebuildOutcome::Rejected { .. })
    }

    /// Types whose pass failed.
    pub fn failed_types(&self) -> Vec<&str> {
        match self {
            RebuildOutcome::Rejected { .. } => Vec::new(),
            RebuildOutcome::Completed { reports, .. } => reports
                .iter()
                .filter(|r| matches!(r.outcome, TypeOutcome::Failed(_)))
                .map(|r| r.entity_type.as_str())
                .collect(),
        }
    }

    /// Rows indexed over all types.
    pub fn rows_indexed(&self) -> u64 {
        match self {
            RebuildOutcome::Rejected { .. } => 0,
            RebuildOutcome::Completed { reports, .. } => reports
                .iter()
                .map(|r| match r.outcome {
                    TypeOutcome::Indexed(rows) => rows,
                    TypeOutcome::Failed(_) => 0,
                })
                .sum(),
        }
    }
}

impl fmt::Display for RebuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebuildOutcome::Rejected { running_since } => write!(
                f,
                "Another re-index job is already running. The job was started at: {} (UTC)",
                running_since.format("%Y-%m-%d %H:%M:%S")
            ),
            RebuildOutcome::Completed { summary, .. } => f.write_str(summary),
        }
    }
}

/// Rebuilds the search index for registered entity types.
pub struct Reindexer {
    source: Arc<dyn RowSource>,
    sink: Arc<dyn IndexSink>,
    registry: EntityRegistry,
    coordinator: JobCoordinator,
    checkpoints: Option<Arc<dyn CheckpointStore>>,
    progress: Arc<dyn ProgressCallback>,
    config: RebuildConfig,
}

impl Reindexer {
    pub fn new(
        source: Arc<dyn RowSource>,
        sink: Arc<dyn IndexSink>,
        registry: EntityRegistry,
        config: RebuildConfig,
    ) -> Self {
        Self {
            source,
            sink,
            registry,
            coordinator: JobCoordinator::new(),
            checkpoints: None,
            progress: Arc::new(LoggingProgressCallback),
            config,
        }
    }

    /// Share job exclusion with other holders of `coordinator`.
    pub fn with_coordinator(mut self, coordinator: JobCoordinator) -> Self {
        self.coordinator = coordinator;
        self
    }

    /// Record a checkpoint after every successful pass.
    pub fn with_checkpoints(mut self, store: Arc<dyn CheckpointStore>) -> Self {
        self.checkpoints = Some(store);
        self
    }

    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    pub fn coordinator(&self) -> &JobCoordinator {
        &self.coordinator
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Reindex `types` in the given order as a single job.
    ///
    /// Returns [`RebuildOutcome::Rejected`] right away if a job is running.
    /// A failing type aborts the job unless `continue_on_error` is set; rows
    /// already flushed to the index stay there either way.
    pub fn rebuild_database_search_indices<S: AsRef<str>>(
        &self,
        types: &[S],
        settings: Option<&ReindexSettings>,
    ) -> Result<RebuildOutcome, IndexingError> {
        let guard = match self.coordinator.try_acquire() {
            Ok(guard) => guard,
            Err(running_since) => {
                warn!(%running_since, "Re-index request rejected, another job is running");
                return Ok(RebuildOutcome::Rejected { running_since });
            }
        };
        info!(
            types = types.len(),
            started_at = %guard.started_at(),
            partial = settings.is_some_and(ReindexSettings::is_partial),
            "Re-index job started"
        );

        let mut summary = String::new();
        let mut reports = Vec::with_capacity(types.len());
        for entity_type in types {
            let name = entity_type.as_ref();
            summary.push_str(short_name(name));

            let result = self
                .registry
                .resolve(name)
                .and_then(|descriptor| self.reindex_type(descriptor, settings));
            match result {
                Ok(rows) => reports.push(TypeReport {
                    entity_type: name.to_string(),
                    outcome: TypeOutcome::Indexed(rows),
                }),
                Err(e) if self.config.continue_on_error => {
                    error!(entity = %name, error = %e, "Reindexing failed, continuing with next type");
                    summary.push_str(" (failed)");
                    reports.push(TypeReport {
                        entity_type: name.to_string(),
                        outcome: TypeOutcome::Failed(e.to_string()),
                    });
                }
                Err(e) => {
                    error!(entity = %name, error = %e, "Reindexing failed, aborting job");
                    return Err(e);
                }
            }
            summary.push_str(", ");
        }

        info!(summary = %summary, "Re-index job finished");
        drop(guard);
        Ok(RebuildOutcome::Completed { summary, reports })
    }

    /// Reindex the newest entries (modified since the start of yesterday,
    /// 1,000 at most) of `entity_type` and of the history type.
    pub fn rebuild_newest(&self, entity_type: &str) -> Result<RebuildOutcome, IndexingError> {
        self.rebuild_newest_entries(&[entity_type])
    }

    /// [`Reindexer::rebuild_newest`] for several types in one job. The
    /// history type is appended once, after the requested types.
    pub fn rebuild_newest_entries<S: AsRef<str>>(
        &self,
        entity_types: &[S],
    ) -> Result<RebuildOutcome, IndexingError> {
        let mut types: Vec<&str> = entity_types.iter().map(AsRef::as_ref).collect();
        if let Some(history) = self.registry.history_type() {
            if !types.contains(&history) {
                types.push(history);
            }
        }
        self.rebuild_database_search_indices(types.as_slice(), Some(&ReindexSettings::newest()))
    }

    /// Reindex all entries of `entity_type`.
    pub fn rebuild_full(&self, entity_type: &str) -> Result<RebuildOutcome, IndexingError> {
        self.rebuild_database_search_indices(&[entity_type], None)
    }

    /// One type's pass plus its log lines and checkpoint.
    fn reindex_type(
        &self,
        descriptor: &EntityDescriptor,
        settings: Option<&ReindexSettings>,
    ) -> Result<u64, IndexingError> {
        info!(entity = %descriptor.short_name(), "Reindexing started");
        let rows = self.reindex_one(descriptor, settings)?;
        info!(entity = %descriptor.short_name(), rows, "Reindexing done");

        if let Some(store) = &self.checkpoints {
            let partial = settings.is_some_and(ReindexSettings::is_partial);
            let checkpoint = ReindexCheckpoint::new(descriptor.name.clone(), rows, partial);
            if let Err(e) = store.save(&checkpoint) {
                warn!(entity = %descriptor.name, error = %e, "Failed to store reindex checkpoint");
            }
        }
        Ok(rows)
    }

    /// Reindex the rows of one entity type selected by `settings`.
    ///
    /// Does not take the job lock; [`Reindexer::rebuild_database_search_indices`]
    /// does. Returns the number of rows handed to the index. The session is
    /// closed on every exit path.
    pub fn reindex_one(
        &self,
        descriptor: &EntityDescriptor,
        settings: Option<&ReindexSettings>,
    ) -> Result<u64, IndexingError> {
        let label = format!("Reindexing [{}]", descriptor.short_name());
        let batch_size = self.config.batch_size.max(1);
        let mut session = SessionGuard::new(self.source.open_session()?);

        let count_query = build_count_query(descriptor, settings);
        let expected = session.count(&count_query)?;
        info!(label = %label, expected, query = %count_query, "Counted rows");

        let mut monitor = ProgressMonitor::new(label.clone(), expected)
            .with_log_every(self.config.progress_log_every)
            .with_callback(self.progress.clone());

        let query = build_query(descriptor, settings);
        session.scroll(&query, batch_size)?;

        let mut processed: u64 = 0;
        while let Some(mut row) = session.next_row()? {
            if let Some(recalculator) = &descriptor.recalculator {
                recalculator.recalculate(&mut row)?;
            }
            self.sink
                .index_object(&row, descriptor.modified_at_field.as_deref())?;
            monitor.documents_added(1);
            if processed % batch_size as u64 == 0 {
                self.sink.flush()?;
                session.clear();
            }
            processed += 1;
        }

        info!(label = %label, rows = processed, "Optimizing index");
        self.sink.optimize(&descriptor.name)?;
        monitor.finish();
        Ok(processed)
    }
}

fn short_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}
