//! Source directory scanning.

use std::path::{Component, Path, PathBuf};

use globset::GlobBuilder;
use jwalk::WalkDir;

use crate::log;

/// Check whether a source-relative path is published.
///
/// Any component starting with `_` or `.` hides the whole subtree.
pub fn is_published(relative: &Path) -> bool {
    relative.components().all(|c| match c {
        Component::Normal(name) => {
            let name = name.to_string_lossy();
            !name.starts_with('_') && !name.starts_with('.')
        }
        _ => true,
    })
}

/// Collect publishable files under `source`, sorted by path.
///
/// Anything under one of the `exclude` paths is skipped, which keeps the
/// destination and the config file out when they live inside the source.
pub fn scan_source(source: &Path, exclude: &[PathBuf]) -> Vec<PathBuf> {
    WalkDir::new(source)
        .skip_hidden(false)
        .sort(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .filter(|path| !exclude.iter().any(|ex| path.starts_with(ex)))
        .filter(|path| path.strip_prefix(source).is_ok_and(is_published))
        .collect()
}

/// Expand a glob pattern relative to `source` into `/`-rooted identifiers.
///
/// Files whose basename starts with `.` never match. An invalid pattern is
/// logged and matches nothing.
pub fn glob_sources(source: &Path, pattern: &str) -> Vec<String> {
    let pattern = pattern.trim_start_matches('/');
    let matcher = match GlobBuilder::new(pattern).literal_separator(true).build() {
        Ok(glob) => glob.compile_matcher(),
        Err(e) => {
            log!("page"; "invalid glob `{}`: {}", pattern, e);
            return Vec::new();
        }
    };

    WalkDir::new(source)
        .skip_hidden(false)
        .sort(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(|e| {
            let path = e.path();
            let relative = path.strip_prefix(source).ok()?.to_path_buf();
            matcher.is_match(&relative).then(|| to_identifier(&relative))
        })
        .collect()
}

/// `/`-rooted identifier for a source-relative path.
fn to_identifier(relative: &Path) -> String {
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    format!("/{}", parts.join("/"))
}
