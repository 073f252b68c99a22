//! File-based learner-state storage.
//!
//! Memory states are stored one JSON file per deck under
//! `~/.trellis/srs/`; node progress lives in a single `progress.json` map.
//! Atomic writes are achieved via temp file + rename pattern.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{progress_path, srs_dir};
use crate::error::{Result, TrellisError};
use crate::path::progress::NodeProgress;
use crate::srs::MemoryMap;
use crate::storage::{ProgressStore, StateStore};

/// Map deck ids onto safe file stems.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '-',
        })
        .collect()
}

/// Write JSON atomically: temp file, sync, rename.
fn atomic_write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

    {
        let mut file =
            fs::File::create(&temp_path).map_err(|e| TrellisError::storage(&temp_path, e))?;
        file.write_all(json.as_bytes())
            .map_err(|e| TrellisError::storage(&temp_path, e))?;
        file.sync_all()
            .map_err(|e| TrellisError::storage(&temp_path, e))?;
    }

    fs::rename(&temp_path, path).map_err(|e| TrellisError::storage(path, e))?;
    Ok(())
}

/// File-based memory-state storage, one JSON file per deck.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    srs_dir: PathBuf,
}

impl FileStateStore {
    /// Create a store at the default directory (`~/.trellis/srs/` or
    /// `$TRELLIS_HOME/srs/`).
    pub fn new() -> Result<Self> {
        let dir = srs_dir().ok_or_else(|| {
            TrellisError::config("Could not determine srs directory (no home directory)")
        })?;
        Self::with_dir(dir)
    }

    /// Create a store at a custom directory.
    pub fn with_dir(srs_dir: impl Into<PathBuf>) -> Result<Self> {
        let srs_dir = srs_dir.into();
        if !srs_dir.exists() {
            fs::create_dir_all(&srs_dir).map_err(|e| TrellisError::storage(&srs_dir, e))?;
        }
        Ok(Self { srs_dir })
    }

    fn deck_path(&self, deck_id: &str) -> PathBuf {
        self.srs_dir.join(format!("{}.json", sanitize_key(deck_id)))
    }
}

impl StateStore for FileStateStore {
    fn load(&self, deck_id: &str) -> Result<MemoryMap> {
        let path = self.deck_path(deck_id);
        if !path.exists() {
            return Ok(MemoryMap::new());
        }

        let content = fs::read_to_string(&path).map_err(|e| TrellisError::storage(&path, e))?;
        let map: MemoryMap = serde_json::from_str(&content)?;
        Ok(map)
    }

    fn save(&self, deck_id: &str, map: &MemoryMap) -> Result<()> {
        atomic_write_json(&self.deck_path(deck_id), map)
    }

    fn clear(&self, deck_id: &str) -> Result<()> {
        let path = self.deck_path(deck_id);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| TrellisError::storage(&path, e))?;
        }
        Ok(())
    }
}

/// File-based node-progress storage, a single JSON map keyed by node id.
///
/// Legacy records are normalized on read, so callers only ever see records
/// with a populated history.
#[derive(Debug, Clone)]
pub struct FileProgressStore {
    progress_path: PathBuf,
}

impl FileProgressStore {
    /// Create a store at the default location (`~/.trellis/progress.json`).
    pub fn new() -> Result<Self> {
        let path = progress_path().ok_or_else(|| {
            TrellisError::config("Could not determine progress path (no home directory)")
        })?;
        Self::with_path(path)
    }

    /// Create a store at a custom path.
    pub fn with_path(progress_path: impl Into<PathBuf>) -> Result<Self> {
        let progress_path = progress_path.into();
        if let Some(parent) = progress_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| TrellisError::storage(parent, e))?;
            }
        }
        Ok(Self { progress_path })
    }

    fn read_all(&self) -> Result<HashMap<String, NodeProgress>> {
        if !self.progress_path.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(&self.progress_path)
            .map_err(|e| TrellisError::storage(&self.progress_path, e))?;
        let map: HashMap<String, NodeProgress> = serde_json::from_str(&content)?;
        Ok(map)
    }

    fn write_all(&self, map: &HashMap<String, NodeProgress>) -> Result<()> {
        atomic_write_json(&self.progress_path, map)
    }
}

impl ProgressStore for FileProgressStore {
    fn get(&self, node_id: &str) -> Result<Option<NodeProgress>> {
        let all = self.read_all()?;
        Ok(all.get(node_id).cloned().map(|mut progress| {
            progress.normalize();
            progress
        }))
    }

    fn put(&self, node_id: &str, progress: &NodeProgress) -> Result<()> {
        let mut all = self.read_all()?;
        all.insert(node_id.to_string(), progress.clone());
        self.write_all(&all)
    }

    fn delete(&self, node_id: &str) -> Result<()> {
        let mut all = self.read_all()?;
        if all.remove(node_id).is_some() {
            self.write_all(&all)?;
        }
        Ok(())
    }
}
