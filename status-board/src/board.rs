use crate::{
    error::FetchError,
    record::ValidatedBatch,
    render::{DisplayModel, project},
    table::TableState,
};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Counters describing the poll loop since startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub polls_ok: u64,
    pub polls_failed: u64,
    /// Timer ticks skipped because a fetch was still in flight.
    pub ticks_skipped: u64,
    /// Individual records dropped by validation.
    pub records_dropped: u64,
}

/// State container owned by the top level and injected into the poller and renderer.
///
/// Holds the current [`TableState`] snapshot together with the last poll error. Failures only
/// ever touch `last_error` and the counters, never the table.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardState {
    pub table: TableState,
    pub last_error: Option<FetchError>,
    pub last_success: Option<DateTime<Utc>>,
    pub stats: PollStats,
}

impl BoardState {
    pub fn new(table: TableState) -> Self {
        Self {
            table,
            last_error: None,
            last_success: None,
            stats: PollStats::default(),
        }
    }

    /// Fold the outcome of one poll cycle into the board.
    pub fn apply(&mut self, outcome: Result<ValidatedBatch, FetchError>) {
        match outcome {
            Ok(batch) => self.apply_batch(batch),
            Err(error) => self.apply_failure(error),
        }
    }

    fn apply_batch(&mut self, batch: ValidatedBatch) {
        let ValidatedBatch { records, rejected } = batch;

        debug!(
            received = records.len(),
            dropped = rejected.len(),
            "merging status batch"
        );

        self.table = self.table.merge(records);
        self.last_error = None;
        self.last_success = Some(Utc::now());
        self.stats.polls_ok += 1;
        self.stats.records_dropped += rejected.len() as u64;
    }

    fn apply_failure(&mut self, error: FetchError) {
        warn!(%error, "status poll failed, keeping previous table");
        self.last_error = Some(error);
        self.stats.polls_failed += 1;
    }

    pub fn record_skipped_tick(&mut self) {
        self.stats.ticks_skipped += 1;
    }

    /// Project the board into its display model.
    pub fn display(&self) -> DisplayModel {
        project(&self.table, self.last_error.as_ref())
    }
}
