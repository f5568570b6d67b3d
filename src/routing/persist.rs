//! `routes.json` persistence.
//!
//! The file is a flat JSON object of `path → target` strings. Writes go to a
//! temporary file in the same directory which is then renamed over the old
//! one, so readers and crashes never see a half-written file.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

/// Route file name inside the runtime directory.
pub const ROUTES_FILE: &str = "routes.json";

/// Why the persisted routes could not be loaded. Always recoverable.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed route file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub fn load_routes(path: &Path) -> Result<BTreeMap<String, String>, LoadError> {
    let content = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_slice(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_routes(path: &Path, routes: &BTreeMap<String, String>) -> io::Result<()> {
    let content = serde_json::to_vec(routes).map_err(io::Error::other)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(&content)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;

    Ok(())
}
