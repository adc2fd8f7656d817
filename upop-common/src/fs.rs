//! Atomic file replacement
//!
//! Writes go to a sibling `<name>.tmp` file which is fsynced and then renamed
//! over the target, so readers see either the old contents or the new ones,
//! never a truncated file.

use crate::{Error, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Replace `path` with `contents` atomically
///
/// Creates the parent directory if it does not exist yet. On failure the
/// temporary file is removed and the previous contents of `path` are left
/// untouched.
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = temp_path_for(path)?;

    let written = File::create(&temp_path).and_then(|mut file| {
        file.write_all(contents)?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::Io(e));
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::Io(e));
    }

    tracing::debug!(
        path = %path.display(),
        bytes = contents.len(),
        "Atomically replaced file"
    );

    Ok(())
}

/// Sibling temp file used by [`atomic_write`]
pub fn temp_path_for(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::InvalidInput(format!("Not a file path: {}", path.display())))?;

    let mut temp_name = file_name.to_os_string();
    temp_name.push(".tmp");
    Ok(path.with_file_name(temp_name))
}
