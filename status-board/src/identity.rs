//! Identity policies decide which keys a [`TableState`](crate::table::TableState) holds.
//!
//! - [`FixedUniverse`]: keys are the tracked identities configured at startup; the key set never
//!   changes and updates for unknown identities are ignored.
//! - [`OpenUniverse`]: starts empty and grows with every new identity observed.

use crate::{error::ConfigError, record::normalise_symbol};
use indexmap::IndexSet;
use std::{fmt::Debug, str::FromStr};

/// Strategy selected at configuration time that shapes the key set of the table.
pub trait IdentityPolicy: Debug + Send + Sync {
    /// Keys present, in display order, before any update is merged.
    fn seed(&self) -> Vec<String>;

    /// Whether an update for an identity absent from the table may insert a new row.
    fn admits_new(&self, identity: &str) -> bool;

    /// Short name used in logs and the status bar.
    fn name(&self) -> &'static str;
}

/// Pre-seeded, immutable key set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedUniverse {
    identities: IndexSet<String>,
}

impl FixedUniverse {
    pub fn new<I, S>(identities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            identities: identities
                .into_iter()
                .map(|identity| normalise_symbol(identity.as_ref()))
                .filter(|identity| !identity.is_empty())
                .collect(),
        }
    }
}

impl IdentityPolicy for FixedUniverse {
    fn seed(&self) -> Vec<String> {
        self.identities.iter().cloned().collect()
    }

    fn admits_new(&self, _: &str) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Key set that grows with every identity seen; entries are never removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenUniverse;

impl IdentityPolicy for OpenUniverse {
    fn seed(&self) -> Vec<String> {
        Vec::new()
    }

    fn admits_new(&self, _: &str) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "open"
    }
}

/// Configuration switch between the two policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UniverseKind {
    #[default]
    Fixed,
    Open,
}

impl FromStr for UniverseKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "open" => Ok(Self::Open),
            _ => Err(ConfigError::InvalidValue {
                key: "UNIVERSE",
                value: s.to_string(),
            }),
        }
    }
}
