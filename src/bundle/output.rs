//! Artifacts written to the destination directory.
//!
//! Bundles, copied static files and rendered pages all implement
//! [`OutputFile`], so the writer treats them uniformly.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{Bundle, BundleError, is_remote, local_path};

/// Something that can be written under a destination root.
pub trait OutputFile {
    /// Path relative to the destination root.
    fn relative_path(&self) -> PathBuf;

    /// Absolute output path under `root`.
    fn destination(&self, root: &Path) -> PathBuf {
        root.join(self.relative_path())
    }

    fn should_write(&self) -> bool {
        true
    }

    /// Write to `destination(root)`, creating parent directories.
    fn write(&self, root: &Path) -> Result<(), BundleError>;

    /// Source file this artifact is a copy of, if any.
    fn source_path(&self) -> Option<&Path> {
        None
    }
}

/// A file copied verbatim from the site source.
#[derive(Debug, Clone)]
pub struct StaticFile {
    source: PathBuf,
    relative: PathBuf,
}

impl StaticFile {
    pub fn new(source: impl Into<PathBuf>, relative: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            relative: relative.into(),
        }
    }
}

impl OutputFile for StaticFile {
    fn relative_path(&self) -> PathBuf {
        self.relative.clone()
    }

    fn write(&self, root: &Path) -> Result<(), BundleError> {
        let dest = self.destination(root);
        create_parent(&dest)?;
        fs::copy(&self.source, &dest).map_err(|e| BundleError::io(&self.source, e))?;
        Ok(())
    }

    fn source_path(&self) -> Option<&Path> {
        Some(&self.source)
    }
}

/// A file whose content was produced during the build.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    relative: PathBuf,
    content: Vec<u8>,
}

impl GeneratedFile {
    pub fn new(relative: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            relative: relative.into(),
            content: content.into(),
        }
    }
}

impl OutputFile for GeneratedFile {
    fn relative_path(&self) -> PathBuf {
        self.relative.clone()
    }

    fn write(&self, root: &Path) -> Result<(), BundleError> {
        write_bytes(&self.destination(root), &self.content)
    }
}

/// Create parent directories and write `bytes` to `path`.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), BundleError> {
    create_parent(path)?;
    fs::write(path, bytes).map_err(|e| BundleError::io(path, e))
}

fn create_parent(path: &Path) -> Result<(), BundleError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BundleError::io(parent, e))?;
    }
    Ok(())
}

/// Every artifact the build will write, in registration order.
#[derive(Default)]
pub struct OutputSet {
    entries: Vec<Arc<dyn OutputFile>>,
}

impl OutputSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: Arc<dyn OutputFile>) {
        self.entries.push(entry);
    }

    /// Register a bundle, replacing any entry with the same relative path.
    pub fn register_bundle(&mut self, bundle: Arc<Bundle>) {
        let path = bundle.relative_path();
        self.entries.retain(|e| e.relative_path() != path);
        self.entries.push(bundle);
    }

    /// Drop static copies of the given local source identifiers.
    ///
    /// Returns how many entries were removed.
    pub fn remove_sources(&mut self, source_dir: &Path, identifiers: &[String]) -> usize {
        let bundled: Vec<PathBuf> = identifiers
            .iter()
            .filter(|id| !is_remote(id))
            .map(|id| source_dir.join(local_path(id)))
            .collect();

        let before = self.entries.len();
        self.entries
            .retain(|e| !e.source_path().is_some_and(|p| bundled.iter().any(|b| b == p)));
        before - self.entries.len()
    }

    /// Write every entry that wants to be written. Returns the count.
    pub fn write_all(&self, root: &Path) -> Result<usize, BundleError> {
        let mut written = 0;
        for entry in self.entries.iter().filter(|e| e.should_write()) {
            entry.write(root)?;
            written += 1;
        }
        Ok(written)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Relative paths of all entries, in order.
    #[cfg(test)]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.entries.iter().map(|e| e.relative_path()).collect()
    }
}
