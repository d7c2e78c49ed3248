use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use fs2::FileExt;
use tokio::fs;
use tracing::{debug, error, instrument, warn};

use crate::errors::{DatastoreError, Result};
use crate::store::{Datastore, SettingsRecord, validate_name};

/// File-based settings store
///
/// Every setting lives in its own JSON file holding the record together with
/// its created/modified timestamps.
///
/// # Directory Structure
/// ```text
/// ~/.config/snap-downloader/
/// ├── lock                   # Advisory lock file, held while writing
/// └── settings/
///     └── store/
///         └── headers.json   # Record for namespace "store", key "headers"
/// ```
#[derive(Debug, Clone)]
pub struct FileDatastore {
    settings_dir: PathBuf,
    lock_file: PathBuf,
}

impl FileDatastore {
    /// Open (creating if needed) a settings store rooted at `storage_dir`
    pub async fn new(storage_dir: impl AsRef<Path>) -> Result<Self> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        let settings_dir = storage_dir.join("settings");
        let lock_file = storage_dir.join("lock");

        create_private_dir(&settings_dir).await?;
        #[cfg(unix)]
        restrict_permissions(&storage_dir, 0o700).map_err(|e| {
            DatastoreError::DirectoryCreationFailed {
                path: storage_dir.clone(),
                source: e,
            }
        })?;

        debug!("Opened settings store at {}", storage_dir.display());

        Ok(Self {
            settings_dir,
            lock_file,
        })
    }

    /// Get default storage directory for the current platform
    pub fn default_storage_dir() -> Result<PathBuf> {
        let project_dirs = directories::ProjectDirs::from("", "", "snap-downloader")
            .ok_or(DatastoreError::ProjectDirectoriesUnavailable)?;

        Ok(project_dirs.config_dir().to_path_buf())
    }

    fn record_path(&self, namespace: &str, key: &str) -> PathBuf {
        self.settings_dir.join(namespace).join(format!("{}.json", key))
    }

    /// Acquire an exclusive lock on the storage, released when the file drops
    fn acquire_lock(&self) -> Result<std::fs::File> {
        let lock_file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_file)
            .with_context(|| format!("Failed to open lock file {}", self.lock_file.display()))
            .map_err(|e| DatastoreError::WriteFailed {
                path: self.lock_file.clone(),
                source: e,
            })?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| DatastoreError::Locked)?;

        Ok(lock_file)
    }

    async fn read_record(&self, path: &Path) -> Result<Option<SettingsRecord>> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                error!("Failed to read settings file {}: {}", path.display(), e);
                return Err(DatastoreError::ReadFailed {
                    path: path.to_path_buf(),
                    source: e.into(),
                });
            }
        };

        let record = serde_json::from_str(&content).map_err(|e| DatastoreError::ParsingFailed {
            path: path.to_path_buf(),
            source: e.into(),
        })?;

        Ok(Some(record))
    }

    async fn write_record(&self, path: &Path, record: &SettingsRecord) -> Result<()> {
        let write_failed = |e: anyhow::Error| DatastoreError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        };

        if let Some(parent) = path.parent() {
            create_private_dir(parent).await?;
        }

        let json = serde_json::to_string_pretty(record)?;

        // Atomic write: temp file, fsync, rename over the old record
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, json)
            .await
            .context("Failed to write temporary settings file")
            .map_err(write_failed)?;

        #[cfg(unix)]
        restrict_permissions(&temp_path, 0o600).map_err(write_failed)?;

        std::fs::File::open(&temp_path)
            .and_then(|file| file.sync_all())
            .context("Failed to sync temporary settings file")
            .map_err(write_failed)?;

        fs::rename(&temp_path, path)
            .await
            .context("Failed to move settings file into place")
            .map_err(write_failed)?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl Datastore for FileDatastore {
    #[instrument(skip(self))]
    async fn settings_get(&self, namespace: &str, key: &str) -> Result<SettingsRecord> {
        validate_name(namespace)?;
        validate_name(key)?;

        let path = self.record_path(namespace, key);
        self.read_record(&path)
            .await?
            .ok_or_else(|| DatastoreError::not_found(namespace, key))
    }

    #[instrument(skip(self, data))]
    async fn settings_put(&self, namespace: &str, key: &str, data: &str) -> Result<SettingsRecord> {
        validate_name(namespace)?;
        validate_name(key)?;

        let _lock = self.acquire_lock()?;
        let path = self.record_path(namespace, key);

        // An unreadable previous record is replaced rather than merged
        let previous = match self.read_record(&path).await {
            Ok(previous) => previous,
            Err(e) => {
                warn!("Overwriting unreadable settings file {}: {}", path.display(), e);
                None
            }
        };

        let record = SettingsRecord::replacing(previous.as_ref(), namespace, key, data);
        self.write_record(&path, &record).await?;

        debug!("Stored setting {}/{}", namespace, key);
        Ok(record)
    }
}

async fn create_private_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| DatastoreError::DirectoryCreationFailed {
            path: path.to_path_buf(),
            source: e.into(),
        })?;

    #[cfg(unix)]
    restrict_permissions(path, 0o700).map_err(|e| DatastoreError::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path, mode: u32) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .with_context(|| format!("Failed to set permissions on {}", path.display()))
}
