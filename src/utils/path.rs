//! Filesystem path normalization.

use std::path::{Component, Path, PathBuf};

/// Convert a path to an absolute, normalized form.
///
/// Existing paths are canonicalized. Paths that don't exist yet (such as a
/// fresh output directory) are made absolute against the cwd and cleaned
/// lexically, so `.` and `..` never survive.
///
/// # Example
/// ```ignore
/// use sheaf::utils::path::normalize_path;
/// let dest = normalize_path(Path::new("site/../_site"));
/// ```
pub fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };
    clean(&absolute)
}

/// Check that a relative path stays inside the directory it is joined to.
///
/// Purely lexical: absolute paths and `..` that climb above the start are
/// rejected, `a/../b` is fine.
pub fn is_contained(relative: &Path) -> bool {
    let mut depth = 0usize;
    for component in relative.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

/// Resolve `.` and `..` components without touching the filesystem.
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_existing() {
        let dir = TempDir::new().unwrap();
        let canonical = dir.path().canonicalize().unwrap();
        assert_eq!(normalize_path(&dir.path().join("./")), canonical);
    }

    #[test]
    fn test_normalize_missing() {
        let dir = TempDir::new().unwrap();
        let canonical = dir.path().canonicalize().unwrap();
        let path = canonical.join("src/../_site/./bundles");
        assert_eq!(normalize_path(&path), canonical.join("_site/bundles"));
    }

    #[test]
    fn test_is_contained() {
        assert!(is_contained(Path::new("js/a.js")));
        assert!(is_contained(Path::new("js/../css/./a.css")));
        assert!(!is_contained(Path::new("../secret.js")));
        assert!(!is_contained(Path::new("js/../../secret.js")));
        assert!(!is_contained(Path::new("/etc/passwd")));
    }

    #[test]
    fn test_normalize_relative() {
        let path = normalize_path(Path::new("does-not-exist/x"));
        assert!(path.is_absolute());
        assert!(path.ends_with("does-not-exist/x"));
    }
}
