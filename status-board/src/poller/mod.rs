//! Fixed-interval poller feeding the [`BoardState`].
//!
//! One timer drives fetch attempts. At most one fetch is in flight: a tick that fires while the
//! previous fetch is outstanding is skipped, never queued. Every applied outcome is published as
//! a fresh `Arc<BoardState>` snapshot on a [`watch`] channel for the renderer.
//!
//! There is no retry or backoff beyond the fixed interval; a failed poll is simply followed by
//! the next tick.

mod source;

pub use source::{HttpStatusSource, LATEST_STATUS_PATH, StatusSource, decode_batch, latest_status_url};

use crate::{board::BoardState, error::FetchError, record::RecordValidator};
use futures::{
    FutureExt,
    future::{BoxFuture, OptionFuture},
};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::{
    sync::{mpsc, watch},
    task::{JoinError, JoinHandle},
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

/// Poller configuration
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Base URL of the status service; `/status/latest` is appended
    pub base_url: String,
    /// Time between fetch attempts
    pub interval: Duration,
    /// Per-request timeout; expected to stay well under `interval`
    pub request_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            interval: Duration::from_millis(1000),
            request_timeout: Duration::from_millis(3000),
        }
    }
}

impl PollerConfig {
    /// Create a new configuration with custom base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set poll interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Shortest accepted poll interval.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

type InFlight = BoxFuture<'static, Result<Vec<serde_json::Value>, FetchError>>;

/// Periodically fetches from a [`StatusSource`] and folds each outcome into a [`BoardState`].
pub struct Poller {
    source: Arc<dyn StatusSource>,
    validator: RecordValidator,
    interval: Duration,
}

impl Poller {
    /// An `interval` below [`MIN_POLL_INTERVAL`] is raised to it.
    pub fn new(source: Arc<dyn StatusSource>, validator: RecordValidator, interval: Duration) -> Self {
        if interval < MIN_POLL_INTERVAL {
            warn!(
                interval_ms = interval.as_millis() as u64,
                "poll interval below minimum, clamping"
            );
        }

        Self {
            source,
            validator,
            interval: interval.max(MIN_POLL_INTERVAL),
        }
    }

    /// Spawn the poll loop, taking ownership of the provided board.
    ///
    /// The first fetch starts immediately. Returns a [`PollerHandle`] for cancellation and a
    /// receiver that always holds the latest published snapshot.
    pub fn start(self, board: BoardState) -> (PollerHandle, watch::Receiver<Arc<BoardState>>) {
        let (state_tx, state_rx) = watch::channel(Arc::new(board.clone()));
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let active = Arc::new(AtomicBool::new(true));

        let task = tokio::spawn(run_poll_loop(
            self,
            board,
            Arc::clone(&active),
            shutdown_rx,
            state_tx,
        ));

        let handle = PollerHandle {
            active,
            shutdown_tx,
            task,
        };

        (handle, state_rx)
    }
}

/// Cancellation handle for a running [`Poller`].
#[derive(Debug)]
pub struct PollerHandle {
    active: Arc<AtomicBool>,
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<BoardState>,
}

impl PollerHandle {
    /// Stop scheduling fetches. A fetch already in flight is dropped and its result never
    /// applied.
    pub fn cancel(&self) {
        self.active.store(false, Ordering::Release);
        let _ = self.shutdown_tx.try_send(());
    }

    #[cfg(test)]
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Wait for the poll loop to stop, returning the final board.
    pub async fn join(self) -> Result<BoardState, JoinError> {
        self.task.await
    }
}

async fn run_poll_loop(
    poller: Poller,
    mut board: BoardState,
    active: Arc<AtomicBool>,
    mut shutdown_rx: mpsc::Receiver<()>,
    state_tx: watch::Sender<Arc<BoardState>>,
) -> BoardState {
    let Poller {
        source,
        validator,
        interval,
    } = poller;

    info!(
        interval_ms = interval.as_millis() as u64,
        universe = board.table.policy().name(),
        "starting status poller"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut in_flight: Option<InFlight> = None;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                active.store(false, Ordering::Release);
                break;
            }
            _ = ticker.tick() => {
                if !active.load(Ordering::Acquire) {
                    break;
                }
                if in_flight.is_some() {
                    debug!("previous status fetch still in flight, skipping tick");
                    board.record_skipped_tick();
                    state_tx.send_replace(Arc::new(board.clone()));
                    continue;
                }

                let source = Arc::clone(&source);
                in_flight = Some(async move { source.fetch_once().await }.boxed());
            }
            Some(outcome) = OptionFuture::from(in_flight.as_mut()) => {
                in_flight = None;

                if !active.load(Ordering::Acquire) {
                    debug!("discarding status fetch completed after cancellation");
                    break;
                }

                board.apply(outcome.map(|records| validator.validate_batch(records)));
                state_tx.send_replace(Arc::new(board.clone()));
            }
        }
    }

    if in_flight.take().is_some() {
        debug!("dropping in-flight status fetch on shutdown");
    }

    info!(
        polls_ok = board.stats.polls_ok,
        polls_failed = board.stats.polls_failed,
        ticks_skipped = board.stats.ticks_skipped,
        "status poller stopped"
    );

    board
}
