use crate::domain::errors::StoreError;
use crate::domain::tables::Tables;
use crate::ports::outbound::SnapshotStore;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[cfg(feature = "locking")]
use crate::adapters::lock::DataDirLock;

/// File-backed snapshot store.
///
/// Persists the full table set with bincode. Every save writes a temp
/// file, syncs it and renames it over the data file, so a reader never
/// sees a partial snapshot.
#[derive(Debug)]
pub struct FileSnapshotStore {
    path: PathBuf,
    #[cfg(feature = "locking")]
    _lock: DataDirLock,
}

impl FileSnapshotStore {
    /// Data file name inside the data directory.
    pub const DATA_FILE: &'static str = "forms.db";

    /// Open the store in `data_dir`, taking the directory lock.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir).map_err(StoreError::persistence)?;

        #[cfg(feature = "locking")]
        let lock = DataDirLock::acquire(data_dir).map_err(|e| StoreError::Locked {
            message: e.to_string(),
        })?;

        let path = data_dir.join(Self::DATA_FILE);
        match std::fs::metadata(&path) {
            Ok(metadata) => info!(
                path = %path.display(),
                bytes = metadata.len(),
                "Found existing snapshot"
            ),
            Err(_) => info!(path = %path.display(), "No existing snapshot"),
        }

        Ok(Self {
            path,
            #[cfg(feature = "locking")]
            _lock: lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<Tables>, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::persistence(e)),
        };
        let tables: Tables = bincode::deserialize(&bytes).map_err(StoreError::persistence)?;
        info!(
            path = %self.path.display(),
            forms = tables.forms.len(),
            accounts = tables.accounts.len(),
            "Loaded snapshot"
        );
        Ok(Some(tables))
    }

    fn save(&self, tables: &Tables) -> Result<(), StoreError> {
        let bytes = bincode::serialize(tables).map_err(StoreError::persistence)?;

        let temp_path = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path).map_err(StoreError::persistence)?;
        file.write_all(&bytes).map_err(StoreError::persistence)?;
        file.sync_all().map_err(StoreError::persistence)?;
        std::fs::rename(&temp_path, &self.path).map_err(StoreError::persistence)?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "Snapshot written");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
