//! Source rendering within the site context.
//!
//! Files that start with a `---` front-matter block are treated as
//! templates: the block is stripped and `{{ site.NAME }}` placeholders are
//! replaced with `[site]` variables (unknown names render empty). Files
//! without front matter are returned byte for byte.

use std::borrow::Cow;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use rustc_hash::FxHashMap;

use crate::bundle::{RenderError, SourceRenderer};
use crate::utils::path::is_contained;

static SITE_VAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{[[:space:]]*site\.([A-Za-z0-9_-]+)[[:space:]]*\}\}")
        .expect("valid site variable pattern")
});

/// Renders files from the site source directory.
#[derive(Debug, Clone)]
pub struct SiteRenderer {
    source: PathBuf,
    vars: FxHashMap<String, String>,
}

impl SiteRenderer {
    pub fn new(source: impl Into<PathBuf>, vars: FxHashMap<String, String>) -> Self {
        Self {
            source: source.into(),
            vars,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Render file contents already read into memory.
    pub fn render_bytes<'a>(&self, bytes: &'a [u8]) -> Cow<'a, [u8]> {
        let Some(body) = strip_front_matter(bytes) else {
            return Cow::Borrowed(bytes);
        };
        let text = String::from_utf8_lossy(body);
        let rendered = SITE_VAR_RE.replace_all(&text, |caps: &Captures| {
            self.vars.get(&caps[1]).cloned().unwrap_or_default()
        });
        Cow::Owned(rendered.into_owned().into_bytes())
    }

    /// Read and render a file by absolute path.
    pub fn render_path(&self, path: &Path) -> Result<Vec<u8>, RenderError> {
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => RenderError::Missing(path.to_path_buf()),
            _ => RenderError::Io(path.to_path_buf(), e),
        })?;
        Ok(self.render_bytes(&bytes).into_owned())
    }
}

impl SourceRenderer for SiteRenderer {
    fn render(&self, dir: &Path, file: &str) -> Result<Vec<u8>, RenderError> {
        let relative = dir.join(file);
        if !is_contained(&relative) {
            return Err(RenderError::OutsideSource(relative));
        }
        let path = self.source.join(relative);
        if !path.is_file() {
            return Err(RenderError::Missing(path));
        }
        self.render_path(&path)
    }
}

/// Body after a leading `---` front-matter block, if the file has one.
fn strip_front_matter(bytes: &[u8]) -> Option<&[u8]> {
    let rest = bytes
        .strip_prefix(b"---\n")
        .or_else(|| bytes.strip_prefix(b"---\r\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive(|&b| b == b'\n') {
        offset += line.len();
        let trimmed = line.strip_suffix(b"\n").unwrap_or(line);
        let trimmed = trimmed.strip_suffix(b"\r").unwrap_or(trimmed);
        if trimmed == b"---" {
            return Some(&rest[offset..]);
        }
    }
    None
}
