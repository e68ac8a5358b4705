//! Output tree layout and JSON file writing.
//!
//! ```text
//! <output>/
//!   concerts.json  artists.json  venues.json  stats.json  songs.json
//!   concert_details/<concert_id>.json
//!   venue_details/<venue_id>.json
//!   artist_details/<artist_id>.json
//! ```

use anyhow::{Context, Result};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Clone, Debug)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn concerts(&self) -> PathBuf {
        self.root.join("concerts.json")
    }

    pub fn artists(&self) -> PathBuf {
        self.root.join("artists.json")
    }

    pub fn venues(&self) -> PathBuf {
        self.root.join("venues.json")
    }

    pub fn stats(&self) -> PathBuf {
        self.root.join("stats.json")
    }

    pub fn songs(&self) -> PathBuf {
        self.root.join("songs.json")
    }

    pub fn concert_details(&self) -> PathBuf {
        self.root.join("concert_details")
    }

    pub fn venue_details(&self) -> PathBuf {
        self.root.join("venue_details")
    }

    pub fn artist_details(&self) -> PathBuf {
        self.root.join("artist_details")
    }

    /// Create the root and every detail directory.
    pub fn create_dirs(&self) -> Result<()> {
        for dir in [
            self.root.clone(),
            self.concert_details(),
            self.venue_details(),
            self.artist_details(),
        ] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }
        Ok(())
    }
}

/// Path of `<id>.json` inside a detail directory.
pub fn detail_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{}.json", id))
}

/// Write a value as indented JSON, replacing any existing file.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Delete `*.json` files in `dir` whose stem is not in `keep`.
///
/// Returns the removed stems, sorted. Other files are left alone.
pub fn prune_stale(dir: &Path, keep: &FxHashSet<&str>) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to list {}", dir.display()))
        }
    };

    let mut removed = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if keep.contains(stem) {
            continue;
        }
        fs::remove_file(&path)
            .with_context(|| format!("Failed to delete stale file {}", path.display()))?;
        info!(file = %path.display(), "deleted stale detail file");
        removed.push(stem.to_string());
    }
    removed.sort();
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_json_is_indented_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        write_json(&path, &json!({"total": 1, "items": [1, 2]})).unwrap();
        write_json(&path, &json!({"total": 2})).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\n  \"total\": 2\n}");
    }

    #[test]
    fn test_write_json_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("x.json");
        assert!(write_json(&path, &json!([])).is_err());
    }

    #[test]
    fn test_layout_creates_detail_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path().join("data"));
        layout.create_dirs().unwrap();
        assert!(layout.concert_details().is_dir());
        assert!(layout.venue_details().is_dir());
        assert!(layout.artist_details().is_dir());
        assert_eq!(detail_path(&layout.venue_details(), "v1"), layout.root().join("venue_details/v1.json"));
    }

    #[test]
    fn test_prune_stale_keeps_current_and_non_json() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["keep.json", "stale.json", "also_stale.json", "notes.txt"] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }
        let keep: FxHashSet<&str> = ["keep"].into_iter().collect();
        let removed = prune_stale(dir.path(), &keep).unwrap();
        assert_eq!(removed, vec!["also_stale", "stale"]);
        assert!(dir.path().join("keep.json").exists());
        assert!(dir.path().join("notes.txt").exists());
        assert!(!dir.path().join("stale.json").exists());
    }

    #[test]
    fn test_prune_missing_dir_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let removed = prune_stale(&dir.path().join("nope"), &FxHashSet::default()).unwrap();
        assert!(removed.is_empty());
    }
}
