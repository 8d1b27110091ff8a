use crate::error::{Error, Result};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Writes text artifacts to disk atomically.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    backup_existing: bool,
}

impl Writer {
    /// Creates a new writer.
    #[must_use]
    pub const fn new(backup_existing: bool) -> Self {
        Self { backup_existing }
    }

    /// Writes `content` to `path`, replacing any existing file.
    ///
    /// # Process
    ///
    /// 1. Creates missing parent directories
    /// 2. Creates a backup if the file exists and backup is enabled
    /// 3. Writes content to a temporary sibling file and syncs it
    /// 4. Atomically renames the temporary file to the target path
    ///
    /// The temporary file is removed if any step after its creation fails.
    ///
    /// # Errors
    ///
    /// Returns an error if any filesystem operation fails.
    pub fn write(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        if path.exists() && self.backup_existing {
            self.backup_file(path)?;
        }

        let temp_path = temp_path_for(path)?;
        let result = Self::write_and_rename(&temp_path, path, content);

        if result.is_err() && temp_path.exists() {
            let _ = fs::remove_file(&temp_path);
        }

        result?;
        debug!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(())
    }

    fn write_and_rename(temp_path: &Path, path: &Path, content: &str) -> Result<()> {
        let mut temp_file = fs::File::create(temp_path).map_err(|e| Error::io(temp_path, e))?;

        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| Error::io(temp_path, e))?;

        temp_file.sync_all().map_err(|e| Error::io(temp_path, e))?;

        drop(temp_file);

        fs::rename(temp_path, path).map_err(|e| Error::io(path, e))
    }

    /// Creates a timestamped backup of an existing file.
    fn backup_file(&self, path: &Path) -> Result<PathBuf> {
        let timestamp = chrono::Local::now().format("%Y%m%d%H%M%S%f");

        let filename = path
            .file_name()
            .ok_or_else(|| Error::config("Invalid file path"))?
            .to_string_lossy();

        let backup_path = path.with_file_name(format!("{filename}.backup.{timestamp}"));

        fs::copy(path, &backup_path).map_err(|e| Error::io(&backup_path, e))?;

        debug!("Created backup: {}", backup_path.display());
        Ok(backup_path)
    }
}

fn temp_path_for(path: &Path) -> Result<PathBuf> {
    let filename = path
        .file_name()
        .ok_or_else(|| Error::config(format!("Invalid output path: {}", path.display())))?
        .to_string_lossy();

    Ok(path.with_file_name(format!(".{filename}.tmp")))
}
