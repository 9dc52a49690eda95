//! Startup configuration, read from the environment.
//!
//! | Variable             | Default                 |
//! |----------------------|-------------------------|
//! | `STATUS_URL`         | `http://localhost:8000` |
//! | `POLL_INTERVAL_MS`   | `1000`                  |
//! | `REQUEST_TIMEOUT_MS` | `3000`                  |
//! | `SYMBOL_FILE`        | built-in [`DEFAULT_SYMBOLS`] |
//! | `UNIVERSE`           | `fixed`                 |
//! | `IDENTITY_KEY`       | `symbol`                |

use crate::{
    error::ConfigError,
    identity::{FixedUniverse, IdentityPolicy, OpenUniverse, UniverseKind},
    poller::{PollerConfig, latest_status_url},
    record::{IdentityScheme, RecordValidator, normalise_symbol},
    table::TableState,
};
use indexmap::IndexMap;
use std::{path::Path, str::FromStr, sync::Arc, time::Duration};

/// Tracked pairs and their numeric ids when no `SYMBOL_FILE` is supplied.
pub const DEFAULT_SYMBOLS: [(&str, i64); 18] = [
    ("adausdt", 50),
    ("avaxusdt", 170),
    ("bnbusdt", 258),
    ("btcusdt", 290),
    ("dogeusdt", 388),
    ("ethfiusdt", 469),
    ("ethusdt", 476),
    ("hyperusdt", 604),
    ("linkusdt", 721),
    ("shibusdt", 1101),
    ("solusdt", 1132),
    ("solvusdt", 1136),
    ("suiusdt", 1178),
    ("trxusdt", 1258),
    ("usdcusdt", 1288),
    ("wbtcusdt", 1341),
    ("xlmusdt", 1380),
    ("xrpusdt", 1394),
];

/// Everything needed to wire a poller, a table and a renderer together.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub poller: PollerConfig,
    pub universe: UniverseKind,
    pub identity_scheme: IdentityScheme,
    /// Tracked identity -> numeric id, in display order.
    pub symbols: IndexMap<String, i64>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            poller: PollerConfig::default(),
            universe: UniverseKind::default(),
            identity_scheme: IdentityScheme::default(),
            symbols: default_symbols(),
        }
    }
}

impl BoardConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut poller = PollerConfig::default();

        if let Some(url) = lookup("STATUS_URL") {
            poller.base_url = url;
        }
        // Fail fast on an unusable endpoint rather than on the first poll
        latest_status_url(&poller.base_url)?;

        if let Some(interval) = lookup("POLL_INTERVAL_MS") {
            poller.interval = parse_millis("POLL_INTERVAL_MS", &interval)?;
        }
        if let Some(timeout) = lookup("REQUEST_TIMEOUT_MS") {
            poller.request_timeout = parse_millis("REQUEST_TIMEOUT_MS", &timeout)?;
        }

        let universe = lookup("UNIVERSE")
            .map(|value| UniverseKind::from_str(&value))
            .transpose()?
            .unwrap_or_default();

        let identity_scheme = lookup("IDENTITY_KEY")
            .map(|value| IdentityScheme::from_str(&value))
            .transpose()?
            .unwrap_or_default();

        let symbols = match lookup("SYMBOL_FILE") {
            Some(path) => load_symbol_file(path)?,
            None => default_symbols(),
        };

        if universe == UniverseKind::Fixed && symbols.is_empty() {
            return Err(ConfigError::EmptyUniverse);
        }

        Ok(Self {
            poller,
            universe,
            identity_scheme,
            symbols,
        })
    }

    /// Identity policy selected by [`BoardConfig::universe`].
    pub fn policy(&self) -> Arc<dyn IdentityPolicy> {
        match self.universe {
            UniverseKind::Fixed => Arc::new(FixedUniverse::new(self.symbols.keys())),
            UniverseKind::Open => Arc::new(OpenUniverse),
        }
    }

    /// Initial, fully unset table.
    pub fn table(&self) -> TableState {
        TableState::initialize(self.policy())
    }

    /// Record validator for the configured identity scheme, labelling ids via the symbol map.
    pub fn validator(&self) -> RecordValidator {
        RecordValidator::new(self.identity_scheme).with_labels(&self.symbols)
    }
}

fn default_symbols() -> IndexMap<String, i64> {
    DEFAULT_SYMBOLS
        .iter()
        .map(|(symbol, id)| (symbol.to_string(), *id))
        .collect()
}

fn parse_millis(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(millis) if millis > 0 => Ok(Duration::from_millis(millis)),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

/// Load a `{ "btcusdt": 290, ... }` symbol file, keeping file order.
pub fn load_symbol_file(path: impl AsRef<Path>) -> Result<IndexMap<String, i64>, ConfigError> {
    let path = path.as_ref();
    let display = path.display().to_string();

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: display.clone(),
        source,
    })?;

    parse_symbol_map(&contents).map_err(|source| ConfigError::Parse {
        path: display,
        source,
    })
}

/// Parse a symbol map, normalising symbols so they match incoming records.
pub fn parse_symbol_map(contents: &str) -> Result<IndexMap<String, i64>, serde_json::Error> {
    let raw = serde_json::from_str::<IndexMap<String, i64>>(contents)?;

    Ok(raw
        .into_iter()
        .map(|(symbol, id)| (normalise_symbol(&symbol), id))
        .filter(|(symbol, _)| !symbol.is_empty())
        .collect())
}
