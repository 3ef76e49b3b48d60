//! Resolved engine settings.
//!
//! Built once at start of run from the `[asset_bundler]` configuration and
//! passed into the engine by value.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::Serialize;

use super::{CACHE_DIR, Digest, MarkupTemplate, default_templates};

/// Default URL path prefix for generated bundles.
pub const DEFAULT_BASE_PATH: &str = "/bundles/";

#[derive(Debug, Clone)]
pub struct BundlerSettings {
    /// Enabled compression backends by type (plugin name or command).
    pub compress: BTreeMap<String, String>,
    /// Extern files for `optimize-advanced`, relative to the source dir.
    pub js_externs: Vec<String>,
    /// URL path prefix, always starting and ending with `/`.
    pub base_path: String,
    /// Prefix prepended to `base_path` in markup (CDN or server URL).
    pub server_url: String,
    /// Drop directly-published copies of bundled source files.
    pub remove_bundled: bool,
    /// Dev mode: no merging of anonymous bundles, no compression.
    pub dev: bool,
    /// Markup templates by type.
    pub markup: FxHashMap<String, MarkupTemplate>,
    /// Site source directory that local identifiers resolve against.
    pub source_dir: PathBuf,
    /// Content cache directory (also holds command temp files).
    pub cache_dir: PathBuf,
}

impl Default for BundlerSettings {
    fn default() -> Self {
        Self {
            compress: BTreeMap::new(),
            js_externs: Vec::new(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            server_url: String::new(),
            remove_bundled: false,
            dev: false,
            markup: default_templates()
                .map(|(kind, template)| (kind.to_string(), template))
                .collect(),
            source_dir: PathBuf::from("."),
            cache_dir: PathBuf::from(CACHE_DIR),
        }
    }
}

/// Compression-relevant settings, serialized into compression cache keys.
#[derive(Serialize)]
struct CompressionKey<'a> {
    compress: &'a BTreeMap<String, String>,
    js_externs: &'a [String],
}

impl BundlerSettings {
    /// Settings rooted at a project directory with default options.
    pub fn for_project(root: &Path, source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            cache_dir: root.join(CACHE_DIR),
            ..Self::default()
        }
    }

    /// Absolute extern file paths.
    pub fn externs(&self) -> Vec<PathBuf> {
        self.js_externs
            .iter()
            .map(|e| self.source_dir.join(e))
            .collect()
    }

    /// Cache key for compressing content with `content_digest` under the
    /// current compression settings.
    pub fn compression_key(&self, content_digest: Digest) -> Digest {
        let config = serde_json::to_string(&CompressionKey {
            compress: &self.compress,
            js_externs: &self.js_externs,
        })
        .unwrap_or_default();
        let dev = self.dev.to_string();
        Digest::of_parts([content_digest.id().as_str(), config.as_str(), dev.as_str()])
    }

    /// Public URL of a bundle file.
    pub fn bundle_url(&self, base: &str, filename: &str) -> String {
        format!("{}{}{}", self.server_url, base, filename)
    }
}

/// Normalize a URL path prefix to begin and end with `/`.
///
/// - `bundles` -> `/bundles/`
/// - `/static/js` -> `/static/js/`
/// - `` -> `/`
pub fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}
