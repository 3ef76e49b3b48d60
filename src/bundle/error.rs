//! Bundle engine error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort the build of a single bundle.
///
/// Per-source problems (missing files, failed downloads) are recovered
/// inside the assembler and never show up here.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("compressing `{bundle}` failed: {message}")]
    Compression { bundle: String, message: String },

    #[error("`{plugin}` could not process input: {message}")]
    Plugin {
        plugin: &'static str,
        message: String,
    },

    #[error("refusing to substitute unsafe path into command: {0}")]
    UnsafePath(PathBuf),

    #[error("IO error at `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BundleError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors from the host renderer for a single local source.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("source file not found: {0}")]
    Missing(PathBuf),

    #[error("source `{0}` is outside the site directory")]
    OutsideSource(PathBuf),

    #[error("failed to read `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

/// Errors from a single remote download attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP client unavailable: {0}")]
    Client(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_bundle_error_display() {
        let err = BundleError::Compression {
            bundle: "app.js".into(),
            message: "exit status 1".into(),
        };
        let display = err.to_string();
        assert!(display.contains("app.js"));
        assert!(display.contains("exit status 1"));

        let err = BundleError::io("cache/x.js", Error::new(ErrorKind::NotFound, "gone"));
        assert!(err.to_string().contains("cache/x.js"));
    }

    #[test]
    fn test_render_error_display() {
        let err = RenderError::Missing(PathBuf::from("js/a.js"));
        assert!(err.to_string().contains("js/a.js"));
    }
}
