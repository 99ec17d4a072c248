//! The in-memory path index and its persisted JSON form.

use dashmap::DashMap;
use loft_core::ContainerId;
use std::collections::BTreeMap;

/// Mapping from path to the ordered chunk ids that reconstruct its payload.
///
/// Mutating different keys concurrently is safe. A put and a delete racing
/// on the same key have no ordering guarantee; the result is whichever
/// finishes last.
#[derive(Debug, Default)]
pub struct PathIndex {
    entries: DashMap<String, Vec<ContainerId>>,
}

impl PathIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the persisted JSON object form.
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        let map: BTreeMap<String, Vec<ContainerId>> = serde_json::from_slice(bytes)?;
        Ok(Self {
            entries: map.into_iter().collect(),
        })
    }

    /// Serialize to the persisted JSON object form, keys sorted.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        let snapshot: BTreeMap<String, Vec<ContainerId>> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        serde_json::to_vec_pretty(&snapshot)
    }

    /// Get a copy of the sequence registered for `path`.
    pub fn sequence(&self, path: &str) -> Option<Vec<ContainerId>> {
        self.entries.get(path).map(|entry| entry.value().clone())
    }

    /// Remove and return the sequence registered for `path`.
    pub fn remove(&self, path: &str) -> Option<Vec<ContainerId>> {
        self.entries.remove(path).map(|(_, ids)| ids)
    }

    /// Register `ids` as the sequence for `path`, superseding any previous
    /// sequence.
    pub fn insert(&self, path: impl Into<String>, ids: Vec<ContainerId>) {
        self.entries.insert(path.into(), ids);
    }

    /// Whether `path` is registered.
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of registered paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no registered paths.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of all registered paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }
}
