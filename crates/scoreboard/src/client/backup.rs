//! Private on-disk copy of the leaderboard used in degraded mode.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::model::ScoreEntry;

use super::ClientError;

/// Fixed file name of the backup inside its directory.
pub const BACKUP_FILE: &str = "scoreboard-backup.json";

/// A JSON file holding the entry list only. Stats are always recomputed
/// from the entries after loading.
#[derive(Debug, Clone)]
pub struct LocalBackup {
    path: PathBuf,
}

impl LocalBackup {
    /// Backup stored as [`BACKUP_FILE`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(BACKUP_FILE),
        }
    }

    /// Full path of the backup file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if a backup has been written.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the backed-up entries, if any.
    pub fn load(&self) -> Result<Option<Vec<ScoreEntry>>, ClientError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Replace the backup with `entries`.
    ///
    /// Written to a temporary file in the same directory and renamed over
    /// the old one, so readers see either the old or the new list.
    pub fn save(&self, entries: &[ScoreEntry]) -> Result<(), ClientError> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            serde_json::to_writer(&mut writer, entries)?;
            writer.flush()?;
        }
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Delete the backup. Missing files are fine.
    pub fn remove(&self) -> Result<(), ClientError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
