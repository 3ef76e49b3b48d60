//! Disk-backed content-addressed cache.
//!
//! Entries are whole files named by a digest of their logical input plus the
//! asset type extension. Writes go through a temp file in the cache
//! directory and are renamed into place without clobbering, so readers never
//! observe a partially written entry and an existing entry is never replaced.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::{debug, log};

use super::BundleError;

/// Cache directory name (inside project root)
pub const CACHE_DIR: &str = ".sheaf/cache";

/// Content-addressed blob store rooted at a single directory.
#[derive(Debug, Clone)]
pub struct ContentCache {
    dir: PathBuf,
}

impl ContentCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache directory path (may not exist yet).
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the cache directory if needed and return it.
    pub fn ensure_dir(&self) -> Result<&Path, BundleError> {
        fs::create_dir_all(&self.dir).map_err(|e| BundleError::io(&self.dir, e))?;
        Ok(&self.dir)
    }

    /// Path of the entry with the given name.
    pub fn entry_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Read an entry. Unreadable entries count as misses.
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        fs::read(self.entry_path(name)).ok()
    }

    /// Store an entry unless one with the same name already exists.
    pub fn put(&self, name: &str, bytes: &[u8]) -> Result<(), BundleError> {
        let dir = self.ensure_dir()?;
        let path = self.entry_path(name);

        let mut tmp = tempfile::Builder::new()
            .prefix(".partial.")
            .tempfile_in(dir)
            .map_err(|e| BundleError::io(dir, e))?;
        tmp.write_all(bytes)
            .and_then(|()| tmp.flush())
            .map_err(|e| BundleError::io(tmp.path(), e))?;

        match tmp.persist_noclobber(&path) {
            Ok(_) => Ok(()),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(BundleError::io(path, e.error)),
        }
    }

    /// Return the entry for `name`, producing and storing it on a miss.
    ///
    /// A hit never calls `producer`. Producer errors are returned untouched
    /// and nothing is stored for them. Failing to store a produced entry is
    /// logged; the produced bytes are still returned.
    pub fn get_or_put<F, E>(&self, name: &str, producer: F) -> Result<Vec<u8>, E>
    where
        F: FnOnce() -> Result<Vec<u8>, E>,
    {
        if let Some(bytes) = self.get(name) {
            debug!("cache"; "hit {}", name);
            return Ok(bytes);
        }

        let bytes = producer()?;
        if let Err(e) = self.put(name, &bytes) {
            log!("cache"; "failed to store {}: {}", name, e);
        }
        Ok(bytes)
    }

    /// Remove the whole cache directory.
    pub fn clear(&self) -> Result<bool, BundleError> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(BundleError::io(&self.dir, e)),
        }
    }
}
