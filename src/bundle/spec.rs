//! Bundle requests and source identifier helpers.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use super::Digest;

/// Asset types the engine knows how to bundle.
pub const SUPPORTED_TYPES: &[&str] = &["js", "css"];

/// Matches `http://`, `https://` and protocol-relative `//` identifiers.
static REMOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i-u)^(https?:)?//").expect("valid remote pattern"));

/// One request to the engine: an ordered source list of a single type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSpec {
    /// Source identifiers in bundle order (site paths or remote URLs).
    pub sources: Vec<String>,
    /// Type tag derived from the file extension (`js`, `css`).
    pub kind: String,
    /// Explicit output filename; derived from the content digest when absent.
    pub name: Option<String>,
    /// Rebuild even if a bundle with the same fingerprint exists.
    pub force: bool,
}

impl AssetSpec {
    pub fn new(sources: Vec<String>, kind: impl Into<String>) -> Self {
        Self {
            sources,
            kind: kind.into(),
            name: None,
            force: false,
        }
    }

    /// Set an explicit output filename.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Request a rebuild regardless of earlier bundles.
    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    /// Dedup key: digest of the ordered source list.
    pub fn fingerprint(&self) -> Digest {
        Digest::of_parts(&self.sources)
    }
}

/// Check if a source identifier refers to a remote URL.
pub fn is_remote(identifier: &str) -> bool {
    REMOTE_RE.is_match(identifier)
}

/// Rewrite a remote identifier onto the canonical `https` transport.
///
/// - `//cdn.example.com/a.js` -> `https://cdn.example.com/a.js`
/// - `HTTP://cdn.example.com/a.js` -> `https://cdn.example.com/a.js`
pub fn canonical_url(identifier: &str) -> String {
    REMOTE_RE.replace(identifier, "https://").into_owned()
}

/// Lowercased extension of an identifier, ignoring URL query and fragment.
pub fn type_of(identifier: &str) -> Option<String> {
    let path = identifier
        .split(['?', '#'])
        .next()
        .unwrap_or(identifier);
    let name = path.rsplit('/').next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Check if a type tag is bundled by the engine.
pub fn is_supported(kind: &str) -> bool {
    SUPPORTED_TYPES.contains(&kind)
}

/// Site-relative path of a local identifier (leading slashes removed).
pub fn local_path(identifier: &str) -> &Path {
    Path::new(identifier.trim_start_matches('/'))
}

/// Split a local identifier into its directory and file name.
///
/// - `/js/vendor/a.js` -> (`js/vendor`, `a.js`)
/// - `main.css` -> (``, `main.css`)
pub fn split_identifier(identifier: &str) -> (PathBuf, String) {
    let path = local_path(identifier);
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let file = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    (dir, file)
}
