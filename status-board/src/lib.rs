/// Status Board - Shared Library
///
/// Polls a status endpoint on a fixed interval and maintains a keyed table of the latest
/// record per identity, ready to be drawn by a display surface.
///
/// The library includes:
/// - Record decoding and per-record validation
/// - Identity policies (fixed or open universe) and the copy-on-write table
/// - The non-overlapping poll loop and its HTTP source
/// - Projection of the table into display rows, and a ratatui widget drawing them
pub mod board;
pub mod config;
pub mod error;
pub mod identity;
pub mod poller;
pub mod record;
pub mod render;
pub mod table;
pub mod widget;

// Re-export commonly used types for convenience
pub use board::{BoardState, PollStats};
pub use config::BoardConfig;
pub use error::{ConfigError, DecodeError, FetchError, MalformedRecordError};
pub use identity::{FixedUniverse, IdentityPolicy, OpenUniverse, UniverseKind};
pub use poller::{HttpStatusSource, Poller, PollerConfig, PollerHandle, StatusSource};
pub use record::{IdentityScheme, RecordValidator, StatusRecord, ValidatedBatch};
pub use render::{DisplayModel, DisplayRow, project};
pub use table::TableState;
