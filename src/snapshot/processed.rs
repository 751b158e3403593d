//! Halftime deduplication: the set of events already reported today.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::debug;

use crate::db::json_file;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProcessedFile {
    #[serde(default)]
    ids: BTreeSet<String>,
}

/// Persisted set of event ids that have had their halftime handled.
///
/// Every insert is written through to disk so a restart mid-evening never
/// sends a second halftime report for the same game.
pub struct ProcessedEvents {
    path: PathBuf,
    ids: BTreeSet<String>,
}

impl ProcessedEvents {
    /// Load from `path`; missing or corrupt files start empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ids = json_file::load::<ProcessedFile>(&path)
            .map(|f| f.ids)
            .unwrap_or_default();
        debug!("{} processed event id(s) loaded", ids.len());
        ProcessedEvents { path, ids }
    }

    pub fn is_processed(&self, event_id: &str) -> bool {
        self.ids.contains(event_id)
    }

    /// Mark `event_id` handled and persist. Marking twice is a no-op.
    pub fn mark_processed(&mut self, event_id: &str) -> Result<()> {
        if self.ids.insert(event_id.to_string()) {
            self.persist()?;
        }
        Ok(())
    }

    /// Empty the set (new operating day) and persist.
    pub fn reset(&mut self) -> Result<()> {
        self.ids.clear();
        self.persist()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    fn persist(&self) -> Result<()> {
        json_file::save_atomic(
            &self.path,
            &ProcessedFile {
                ids: self.ids.clone(),
            },
        )
    }
}
