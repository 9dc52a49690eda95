use crate::{
    identity::{FixedUniverse, IdentityPolicy, OpenUniverse},
    record::StatusRecord,
};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

/// Ordered mapping from identity to the latest known [`StatusRecord`], or `None` while unset.
///
/// A `TableState` is a snapshot: [`TableState::merge`] never mutates `self`, it returns a new
/// table. Rows are shared behind an [`Arc`] and only copied on the first write of a merge, so a
/// snapshot held by a renderer is never observed half-updated.
#[derive(Debug, Clone)]
pub struct TableState {
    policy: Arc<dyn IdentityPolicy>,
    rows: Arc<IndexMap<String, Option<StatusRecord>>>,
}

impl TableState {
    /// Build a table seeded by the provided [`IdentityPolicy`], every seeded key unset.
    pub fn initialize(policy: Arc<dyn IdentityPolicy>) -> Self {
        let rows: IndexMap<_, _> = policy
            .seed()
            .into_iter()
            .map(|identity| (identity, None))
            .collect();

        Self {
            policy,
            rows: Arc::new(rows),
        }
    }

    /// Fixed universe table tracking exactly the provided identities.
    pub fn fixed<I, S>(identities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::initialize(Arc::new(FixedUniverse::new(identities)))
    }

    /// Empty open universe table.
    pub fn open() -> Self {
        Self::initialize(Arc::new(OpenUniverse))
    }

    /// Fold a batch of updates into a new snapshot.
    ///
    /// Updates are applied in sequence order, so the last update for an identity within the batch
    /// wins. Identities the policy does not admit are ignored.
    pub fn merge<I>(&self, updates: I) -> Self
    where
        I: IntoIterator<Item = StatusRecord>,
    {
        let mut next = self.clone();
        for update in updates {
            next.upsert(update);
        }
        next
    }

    fn upsert(&mut self, update: StatusRecord) {
        if !self.rows.contains_key(&update.identity) && !self.policy.admits_new(&update.identity) {
            debug!(
                identity = %update.identity,
                universe = self.policy.name(),
                "ignoring update for untracked identity"
            );
            return;
        }

        let rows = Arc::make_mut(&mut self.rows);
        match rows.get_mut(&update.identity) {
            Some(slot) => *slot = Some(update),
            None => {
                rows.insert(update.identity.clone(), Some(update));
            }
        }
    }

    /// Rows in display order; `None` marks an identity with no record yet.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&StatusRecord>)> {
        self.rows
            .iter()
            .map(|(identity, record)| (identity.as_str(), record.as_ref()))
    }

    /// Latest record for an identity, if one has been received.
    pub fn get(&self, identity: &str) -> Option<&StatusRecord> {
        self.rows.get(identity).and_then(Option::as_ref)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.rows.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows holding a record.
    pub fn populated(&self) -> usize {
        self.rows.values().filter(|record| record.is_some()).count()
    }

    pub fn policy(&self) -> &dyn IdentityPolicy {
        self.policy.as_ref()
    }

    /// Whether two snapshots still share the same row storage.
    #[cfg(test)]
    pub(crate) fn shares_rows_with(&self, other: &TableState) -> bool {
        Arc::ptr_eq(&self.rows, &other.rows)
    }
}

impl PartialEq for TableState {
    fn eq(&self, other: &Self) -> bool {
        self.policy.name() == other.policy.name()
            && self.rows.len() == other.rows.len()
            && self.rows.iter().eq(other.rows.iter())
    }
}
