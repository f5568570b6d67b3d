//! Address files: discovery artifacts in the runtime directory.
//!
//! Each listener writes its reachable URL to a small text file once it is
//! bound, and removes it when it stops. Other processes only read them.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::net::listener::ListenerError;

pub const GATEWAY_URL_FILE: &str = "gateway.url";
pub const MANAGEMENT_URL_FILE: &str = "management.url";

/// Write `url` to `<runtime_path>/<filename>`, creating the directory if needed.
pub fn publish(runtime_path: &Path, filename: &str, url: &str) -> Result<PathBuf, ListenerError> {
    let path = runtime_path.join(filename);

    write_private(&path, url.as_bytes()).map_err(|source| ListenerError::Publish {
        path: path.clone(),
        source,
    })?;

    Ok(path)
}

/// Read a published URL.
pub fn read(runtime_path: &Path, filename: &str) -> io::Result<String> {
    Ok(fs::read_to_string(runtime_path.join(filename))?.trim().to_string())
}

/// Remove a runtime file; a file that is already gone is not an error.
pub fn remove(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => tracing::debug!(file = %path.display(), "Removed runtime file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "Failed to remove runtime file");
        }
    }
}

/// Write `contents` to `path` readable only by the owner, creating parent
/// directories as needed.
pub fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options.open(path)?.write_all(contents)
}
