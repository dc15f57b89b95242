//! In-memory catalog store.
//!
//! The store holds exactly one [`CatalogSnapshot`] behind an [`ArcSwap`].
//! Readers load the current `Arc` without taking a lock; the refresher builds a
//! complete snapshot off to the side and publishes it with a single swap.
//! Snapshots are never mutated after publication.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use tracing::warn;

use super::record::BuildingBlock;

#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    ids: Vec<String>,
    records: HashMap<String, Arc<BuildingBlock>>,
    fetched_at: Option<DateTime<Utc>>,
}

impl CatalogSnapshot {
    /// Build a snapshot from fetched records. Identifiers are sorted here,
    /// once, so listing never sorts. On duplicate identifiers the last record
    /// wins.
    pub fn from_records(
        records: impl IntoIterator<Item = BuildingBlock>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        let mut by_id: HashMap<String, Arc<BuildingBlock>> = HashMap::new();
        for record in records {
            let id = record.item_identifier.clone();
            if by_id.insert(id.clone(), Arc::new(record)).is_some() {
                warn!(item_identifier = %id, "Duplicate building block identifier, keeping the last one");
            }
        }

        let mut ids: Vec<String> = by_id.keys().cloned().collect();
        ids.sort_unstable();

        Self {
            ids,
            records: by_id,
            fetched_at: Some(fetched_at),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Arc<BuildingBlock>> {
        self.records.get(id)
    }

    /// All identifiers, ascending.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// `None` until the first successful refresh.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }
}

/// Shared handle to the current snapshot.
#[derive(Debug, Default)]
pub struct CatalogStore {
    current: ArcSwap<CatalogSnapshot>,
}

impl CatalogStore {
    /// An empty store, as at process start.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: CatalogSnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(snapshot),
        }
    }

    /// The snapshot in effect right now. Hold on to it to get a consistent
    /// view across several lookups.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.current.load_full()
    }

    pub fn get(&self, id: &str) -> Option<Arc<BuildingBlock>> {
        self.current.load().get(id).cloned()
    }

    pub fn list_ids(&self) -> Vec<String> {
        self.current.load().ids().to_vec()
    }

    /// Publish a new snapshot, replacing the old one wholesale.
    pub fn replace(&self, snapshot: CatalogSnapshot) {
        self.current.store(Arc::new(snapshot));
    }
}
