//! Run configuration: where the concert database comes from and where the
//! JSON tree goes.
//!
//! The database is resolved from `--source`, then `CONCERT_EXPORT_DATABASE`,
//! then the default snapshot in the platform data directory. The output
//! directory defaults to `website/data` next to the tool's own directory.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::store::SqliteStore;

pub const DATABASE_ENV: &str = "CONCERT_EXPORT_DATABASE";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no concert database configured (looked for {})", describe(.default_path.as_deref()))]
    NotConfigured { default_path: Option<PathBuf> },

    #[error("concert database not found at {}", .path.display())]
    Missing { path: PathBuf },

    #[error("could not open concert database at {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
}

fn describe(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "no platform data directory".to_string())
}

impl SourceError {
    /// Instructions printed before exiting.
    pub fn remediation(&self) -> String {
        let default = describe(ExportConfig::default_source().as_deref());
        format!(
            "To fix this, point the exporter at a database snapshot:\n  \
             export {}=/path/to/concerts.sqlite3\n\n\
             Or pass it explicitly:\n  \
             concert-export --source /path/to/concerts.sqlite3\n\n\
             Or place the snapshot at the default location:\n  {}",
            DATABASE_ENV, default
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportConfig {
    pub source: PathBuf,
    pub output_dir: PathBuf,
}

impl ExportConfig {
    /// `<data_dir>/concert-export/concerts.sqlite3`
    pub fn default_source() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("concert-export").join("concerts.sqlite3"))
    }

    /// `website/data` beside the directory the tool is installed in.
    pub fn default_output_dir() -> PathBuf {
        let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
        manifest_dir
            .parent()
            .unwrap_or(manifest_dir)
            .join("website")
            .join("data")
    }

    /// `source` is the explicit path (flag or environment), if any.
    pub fn resolve(
        source: Option<PathBuf>,
        output_dir: Option<PathBuf>,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            source: resolve_source(source, Self::default_source())?,
            output_dir: output_dir.unwrap_or_else(Self::default_output_dir),
        })
    }

    pub fn open_store(&self) -> Result<SqliteStore, SourceError> {
        SqliteStore::open(&self.source).map_err(|source| SourceError::Open {
            path: self.source.clone(),
            source,
        })
    }
}

/// An explicit path must exist; the fallback is only used when it exists.
pub fn resolve_source(
    explicit: Option<PathBuf>,
    fallback: Option<PathBuf>,
) -> Result<PathBuf, SourceError> {
    match explicit {
        Some(path) if path.is_file() => Ok(path),
        Some(path) => Err(SourceError::Missing { path }),
        None => match fallback {
            Some(path) if path.is_file() => Ok(path),
            default_path => Err(SourceError::NotConfigured { default_path }),
        },
    }
}
