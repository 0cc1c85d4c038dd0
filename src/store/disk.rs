use crate::core::error::StoreError;
use crate::core::snapshot::RateSnapshot;
use crate::store::SnapshotStore;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Keeps the snapshot as a JSON file.
///
/// Saving writes a temporary file next to the destination and renames it into
/// place, so a crash mid-write leaves the previous snapshot intact.
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn corrupt(&self, message: impl ToString) -> StoreError {
        StoreError::CorruptData {
            path: self.path.clone(),
            message: message.to_string(),
        }
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<RateSnapshot>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No stored snapshot");
                return Ok(None);
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => return Err(self.corrupt(e)),
            Err(e) => return Err(e.into()),
        };

        let snapshot: RateSnapshot =
            serde_json::from_str(&content).map_err(|e| self.corrupt(e))?;
        snapshot.check_rates().map_err(|e| self.corrupt(e))?;

        debug!(path = %self.path.display(), base = %snapshot.base, "Loaded stored snapshot");
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &RateSnapshot) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut file = NamedTempFile::new_in(&dir)?;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            serde_json::to_writer(&mut writer, snapshot).map_err(io::Error::from)?;
            writer.flush()?;
        }
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;

        debug!(path = %self.path.display(), "Saved snapshot");
        Ok(())
    }
}
