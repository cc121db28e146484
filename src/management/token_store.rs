use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::error::{Error, Result};

/// Name of the serialized credential cache inside the application directory.
pub const TOKEN_FILE: &str = ".token.bin";

/// Durable storage of the serialized credential cache.
///
/// The stored bytes are opaque to this type. Writes go to a sibling temporary
/// file first and are renamed over the target, so a crash mid-write never
/// leaves a truncated cache behind.
///
/// # File Location
///
/// - Linux: `~/.local/share/mstodo/.token.bin`
/// - macOS: `~/Library/Application Support/mstodo/.token.bin`
/// - Windows: `%LOCALAPPDATA%/mstodo/.token.bin`
///
/// # Example
///
/// ```
/// let store = TokenCacheStore::new(config::default_app_dir());
/// if let Some(bytes) = store.load().await? {
///     let cache = TokenCache::deserialize(&bytes)?;
/// }
/// store.clear().await?;
/// ```
#[derive(Debug, Clone)]
pub struct TokenCacheStore {
    app_dir: PathBuf,
}

impl TokenCacheStore {
    pub fn new(app_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_dir: app_dir.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.app_dir.join(TOKEN_FILE)
    }

    /// Returns the stored blob, or `None` when nothing was stored yet.
    ///
    /// # Errors
    ///
    /// Any read failure other than a missing file is returned as
    /// [`Error::Storage`], never swallowed.
    pub async fn load(&self) -> Result<Option<Vec<u8>>> {
        let path = self.path();
        match async_fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("cannot read", &path, e)),
        }
    }

    /// Stores `bytes`, creating the application directory when needed.
    ///
    /// Callers only save after the credential cache reported a change, a
    /// silent reacquisition from a still valid token never reaches this.
    ///
    /// # Arguments
    ///
    /// * `bytes` - Serialized credential cache, stored as-is
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] naming the path when the directory cannot be
    /// created or the file cannot be written or replaced.
    pub async fn save(&self, bytes: &[u8]) -> Result<()> {
        async_fs::create_dir_all(&self.app_dir)
            .await
            .map_err(|e| io_error("cannot create", &self.app_dir, e))?;

        let path = self.path();
        let tmp = self.app_dir.join(format!("{TOKEN_FILE}.tmp"));
        async_fs::write(&tmp, bytes)
            .await
            .map_err(|e| io_error("cannot write", &tmp, e))?;
        async_fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_error("cannot replace", &path, e))
    }

    /// Deletes the stored blob. A missing file is not an error.
    pub async fn clear(&self) -> Result<()> {
        let path = self.path();
        match async_fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("cannot delete", &path, e)),
        }
    }
}

fn io_error(what: &str, path: &Path, err: std::io::Error) -> Error {
    Error::storage(&format!("{what} {}", path.display()), err)
}
