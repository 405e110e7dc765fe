//! Crash-safe replace-in-place.
//!
//! New content goes to a temporary file in the target's directory, is synced
//! to disk, and is then renamed over the target. A reader sees either the old
//! file or the new one, never a truncated mix.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{ControlPlaneError, Result};

/// Mode of files that did not exist before the write.
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o644;

/// Replace `path` with exactly `contents`.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    write_atomic_with(path, |file| file.write_all(contents))
}

/// Replace `path` with whatever `fill` writes.
///
/// If `fill` or any later step fails, the temporary file is removed and
/// `path` keeps its previous content.
pub fn write_atomic_with<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut fs::File) -> io::Result<()>,
{
    let write_failed = |source: io::Error| ControlPlaneError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_failed)?;

    fill(tmp.as_file_mut()).map_err(write_failed)?;
    tmp.as_file_mut().flush().map_err(write_failed)?;
    tmp.as_file().sync_all().map_err(write_failed)?;

    // Temp files are created 0600. Keep the mode of the file being replaced,
    // or make a new file readable by the services that consume it.
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => {
            fs::set_permissions(tmp.path(), metadata.permissions()).map_err(write_failed)?
        }
        _ => set_new_file_mode(tmp.as_file()).map_err(write_failed)?,
    }

    tmp.persist(path).map_err(|e| write_failed(e.error))?;

    tracing::debug!(path = %path.display(), "File replaced");
    Ok(())
}

#[cfg(unix)]
fn set_new_file_mode(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(NEW_FILE_MODE))
}

#[cfg(not(unix))]
fn set_new_file_mode(_file: &fs::File) -> io::Result<()> {
    Ok(())
}
