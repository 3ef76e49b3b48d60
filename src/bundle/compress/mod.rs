//! Compression backends.
//!
//! ```text
//! compress setting        backend
//! ----------------        -------
//! false / absent / dev -> NoOp
//! "minify" | "optimize"
//!   | "optimize-advanced" -> Plugin
//! any other string     -> Command (shell template)
//! ```

mod command;
mod plugin;

pub use command::CommandTemplate;
pub use plugin::Plugin;

use std::path::{Path, PathBuf};

use super::{BundleError, BundlerSettings};

/// Per-invocation inputs shared by every backend.
#[derive(Debug, Clone, Copy)]
pub struct CompressContext<'a> {
    /// Asset type of the content (`js`, `css`).
    pub kind: &'a str,
    /// Bundle filename, for error messages.
    pub bundle: &'a str,
    /// Directory for temp files (the cache directory).
    pub temp_dir: &'a Path,
    /// Extern declaration files for `optimize-advanced`.
    pub externs: &'a [PathBuf],
}

/// A compression backend for one asset type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compressor {
    NoOp,
    Command(CommandTemplate),
    Plugin(Plugin),
}

impl Compressor {
    /// Select the backend configured for `kind`.
    ///
    /// Dev mode always selects `NoOp`.
    pub fn select(settings: &BundlerSettings, kind: &str) -> Self {
        if settings.dev {
            return Self::NoOp;
        }
        match settings.compress.get(kind) {
            None => Self::NoOp,
            Some(backend) => Self::from_backend(backend),
        }
    }

    /// Parse a backend identifier (plugin name or command template).
    pub fn from_backend(backend: &str) -> Self {
        match Plugin::from_name(backend) {
            Some(plugin) => Self::Plugin(plugin),
            None => Self::Command(CommandTemplate::new(backend)),
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp)
    }

    /// Compress `input` with this backend.
    pub fn compress(&self, input: &[u8], ctx: &CompressContext<'_>) -> Result<Vec<u8>, BundleError> {
        match self {
            Self::NoOp => Ok(input.to_vec()),
            Self::Command(template) => template.run(input, ctx),
            Self::Plugin(plugin) => plugin.apply(input, ctx.kind, ctx.externs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with(kind: &str, backend: &str) -> BundlerSettings {
        let mut settings = BundlerSettings::default();
        settings.compress.insert(kind.into(), backend.into());
        settings
    }

    #[test]
    fn test_select() {
        let settings = settings_with("js", "optimize");
        assert_eq!(
            Compressor::select(&settings, "js"),
            Compressor::Plugin(Plugin::Optimize)
        );
        assert!(Compressor::select(&settings, "css").is_noop());

        let settings = settings_with("css", "csso :infile");
        assert_eq!(
            Compressor::select(&settings, "css"),
            Compressor::Command(CommandTemplate::new("csso :infile"))
        );
    }

    #[test]
    fn test_dev_selects_noop() {
        let mut settings = settings_with("js", "minify");
        settings.dev = true;
        assert!(Compressor::select(&settings, "js").is_noop());
    }

    #[test]
    fn test_noop_passes_through() {
        let dir = std::env::temp_dir();
        let ctx = CompressContext {
            kind: "js",
            bundle: "a.js",
            temp_dir: &dir,
            externs: &[],
        };
        assert_eq!(Compressor::NoOp.compress(b"a ;", &ctx).unwrap(), b"a ;");
    }
}
