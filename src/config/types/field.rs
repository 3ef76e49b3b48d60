//! Dotted config field paths for diagnostics.

use owo_colors::OwoColorize;
use std::fmt;

/// Path of a config field such as `asset_bundler.compress.js`.
///
/// Generated by `#[derive(Config)]`:
///
/// ```ignore
/// diag.error(BundlerConfig::FIELDS.server_url, "invalid URL");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(pub &'static str);

impl FieldPath {
    #[inline]
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }

    /// Enclosing section, or `""` for top-level keys.
    pub fn section(&self) -> &'static str {
        self.0.rsplit_once('.').map_or("", |(section, _)| section)
    }

    /// Last path segment.
    pub fn key(&self) -> &'static str {
        self.0.rsplit_once('.').map_or(self.0, |(_, key)| key)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_args!("`{}`", self.0).bright_blue())
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_and_key() {
        let path = FieldPath::new("asset_bundler.compress.js");
        assert_eq!(path.section(), "asset_bundler.compress");
        assert_eq!(path.key(), "js");

        let top = FieldPath::new("destination");
        assert_eq!(top.section(), "");
        assert_eq!(top.key(), "destination");
    }
}
