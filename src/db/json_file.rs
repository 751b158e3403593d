//! Whole-file JSON state with crash-safe rewrites.
//!
//! Files are written to a sibling `.tmp` and renamed over the target, so a
//! kill mid-write leaves either the old or the new contents, never a torn file.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Read and parse `path`.
///
/// Returns `None` when the file is missing or unparseable; corrupt state is
/// logged and treated as empty rather than failing startup.
pub fn load<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring corrupt state file {}: {}", path.display(), e);
            None
        }
    }
}

/// Serialize `value` and atomically replace `path` with it.
pub fn save_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)
                .with_context(|| format!("create state dir {}", dir.display()))?;
        }
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(value).context("serialize state")?;
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        ids: Vec<String>,
    }

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load::<Sample>(&dir.path().join("nope.json")), None);
    }

    #[test]
    fn test_corrupt_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load::<Sample>(&path), None);
    }

    #[test]
    fn test_save_creates_dirs_and_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let value = Sample {
            ids: vec!["401".into()],
        };
        save_atomic(&path, &value).unwrap();
        assert_eq!(load::<Sample>(&path), Some(value));
        assert!(!path.with_extension("json.tmp").exists());
    }
}
