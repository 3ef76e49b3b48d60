//! Built bundles and the per-run registry that deduplicates them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::{BundleError, Digest, OutputFile, local_path, write_bytes};

/// A built bundle.
#[derive(Debug, Clone)]
pub struct Bundle {
    /// Source identifiers in bundle order.
    pub sources: Vec<String>,
    /// Asset type (`js`, `css`).
    pub kind: String,
    /// Output filename (explicit name or `{digest}.{kind}`).
    pub filename: String,
    /// Whether `filename` was given explicitly.
    pub named: bool,
    /// Merged content before compression.
    pub raw: Vec<u8>,
    /// Content written to disk (equals `raw` when not compressed).
    pub content: Vec<u8>,
    /// Digest of `raw`.
    pub digest: Digest,
    /// Digest of the ordered source list.
    pub fingerprint: Digest,
    /// URL path prefix the bundle is published under.
    pub base: String,
    /// Dev-mode bundle that references its sources instead of merging them.
    pub nomerge: bool,
}

impl Bundle {
    /// A dev-mode placeholder that is never assembled or written.
    pub fn unmerged(sources: Vec<String>, kind: String, fingerprint: Digest, base: String) -> Self {
        Self {
            sources,
            kind,
            filename: String::new(),
            named: false,
            raw: Vec::new(),
            content: Vec::new(),
            digest: Digest::of(b""),
            fingerprint,
            base,
            nomerge: true,
        }
    }
}

impl OutputFile for Bundle {
    fn relative_path(&self) -> PathBuf {
        local_path(&self.base).join(&self.filename)
    }

    fn should_write(&self) -> bool {
        !self.nomerge
    }

    fn write(&self, root: &Path) -> Result<(), BundleError> {
        write_bytes(&self.destination(root), &self.content)
    }
}

/// Bundles built during the current run, keyed by fingerprint.
///
/// Explicitly named bundles are also kept under their name, so two names
/// built from the same source list stay distinct. Rebuilding a name with a
/// different source list replaces the earlier bundle of that name.
#[derive(Debug, Default)]
pub struct BundleRegistry {
    by_fingerprint: FxHashMap<Digest, Arc<Bundle>>,
    by_name: FxHashMap<String, Arc<Bundle>>,
}

impl BundleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, fingerprint: &Digest) -> Option<Arc<Bundle>> {
        self.by_fingerprint.get(fingerprint).cloned()
    }

    /// Store a bundle under its fingerprint, overwriting any earlier one.
    pub fn insert(&mut self, bundle: Arc<Bundle>) {
        if bundle.named
            && let Some(previous) = self
                .by_name
                .insert(bundle.filename.clone(), Arc::clone(&bundle))
            && previous.fingerprint != bundle.fingerprint
            && self
                .by_fingerprint
                .get(&previous.fingerprint)
                .is_some_and(|current| Arc::ptr_eq(current, &previous))
        {
            self.by_fingerprint.remove(&previous.fingerprint);
        }
        self.by_fingerprint.insert(bundle.fingerprint, bundle);
    }

    /// Distinct bundles: every name plus every unnamed fingerprint.
    pub fn len(&self) -> usize {
        let unnamed = self.by_fingerprint.values().filter(|b| !b.named).count();
        unnamed + self.by_name.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub fn get_named(&self, name: &str) -> Option<Arc<Bundle>> {
        self.by_name.get(name).cloned()
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Bundle>> {
        let unnamed = self.by_fingerprint.values().filter(|b| !b.named);
        unnamed.chain(self.by_name.values())
    }
}
