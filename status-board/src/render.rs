//! Pure projection of a [`TableState`] (plus the last poll error) into display rows.

use crate::{error::FetchError, record::StatusRecord, table::TableState};
use chrono::DateTime;

/// Text shown for any value that is unset or zero.
pub const PLACEHOLDER: &str = "-";

/// Decimal places used for bid and ask prices.
pub const PRICE_PRECISION: usize = 4;

/// Column headers, in display order.
pub const COLUMNS: [&str; 5] = ["Symbol", "Consumer", "Timestamp", "Bid", "Ask"];

/// One formatted table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub identity: String,
    pub consumer: String,
    pub timestamp: String,
    pub bid: String,
    pub ask: String,
}

impl DisplayRow {
    fn new(identity: &str, record: Option<&StatusRecord>) -> Self {
        match record {
            Some(record) => Self {
                identity: identity.to_string(),
                consumer: format_consumer(&record.consumer_id),
                timestamp: format_timestamp_ns(record.timestamp_ns),
                bid: format_price(record.bid_price),
                ask: format_price(record.ask_price),
            },
            None => Self {
                identity: identity.to_string(),
                consumer: PLACEHOLDER.to_string(),
                timestamp: PLACEHOLDER.to_string(),
                bid: PLACEHOLDER.to_string(),
                ask: PLACEHOLDER.to_string(),
            },
        }
    }

    /// Cells in [`COLUMNS`] order.
    pub fn cells(&self) -> [&str; 5] {
        [
            self.identity.as_str(),
            self.consumer.as_str(),
            self.timestamp.as_str(),
            self.bid.as_str(),
            self.ask.as_str(),
        ]
    }
}

/// Everything the display surface needs to draw one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayModel {
    pub rows: Vec<DisplayRow>,
    /// User-visible error message, shown alongside (never instead of) the rows.
    pub banner: Option<String>,
}

/// Project a table snapshot and the last poll error into a [`DisplayModel`].
pub fn project(table: &TableState, last_error: Option<&FetchError>) -> DisplayModel {
    DisplayModel {
        rows: table
            .iter()
            .map(|(identity, record)| DisplayRow::new(identity, record))
            .collect(),
        banner: last_error.map(|error| format!("Error fetching status: {error}")),
    }
}

/// Format nanoseconds since the epoch as `YYYY-MM-DD HH:MM:SS.mmm` (UTC).
///
/// Zero yields [`PLACEHOLDER`]. Sub-millisecond digits are truncated.
pub fn format_timestamp_ns(timestamp_ns: u64) -> String {
    if timestamp_ns == 0 {
        return PLACEHOLDER.to_string();
    }

    i64::try_from(timestamp_ns / 1_000_000)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(|time| time.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Format a price to [`PRICE_PRECISION`] decimal places, zero and non-finite as [`PLACEHOLDER`].
pub fn format_price(price: f64) -> String {
    if price == 0.0 || !price.is_finite() {
        return PLACEHOLDER.to_string();
    }
    format!("{:.*}", PRICE_PRECISION, price)
}

fn format_consumer(consumer_id: &str) -> String {
    if consumer_id.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        consumer_id.to_string()
    }
}
