//! `[asset_bundler.compress]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [asset_bundler.compress]
//! js = "optimize-advanced"          # built-in plugin
//! css = "csso :infile -o :outfile"  # external command
//! js_externs = ["_externs/jquery.js"]
//! ```

use macros::Config;
use serde::{Deserialize, Serialize};

use crate::bundle::{CommandTemplate, Plugin};
use crate::config::ConfigDiagnostics;

/// Compression for one asset type.
///
/// - `false` / `""`: off
/// - `true`: the built-in `minify` plugin
/// - `"minify"`, `"optimize"`, `"optimize-advanced"`: built-in plugins
/// - any other string: a shell command with `:infile` / `:outfile`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompressSetting {
    Enabled(bool),
    Backend(String),
}

impl Default for CompressSetting {
    fn default() -> Self {
        Self::Enabled(false)
    }
}

impl CompressSetting {
    /// Backend identifier, or `None` when compression is off.
    pub fn backend(&self) -> Option<&str> {
        match self {
            Self::Enabled(false) => None,
            Self::Enabled(true) => Some(Plugin::Minify.name()),
            Self::Backend(s) if s.trim().is_empty() => None,
            Self::Backend(s) => Some(s.trim()),
        }
    }
}

/// Per-type compression backends.
/// Values: false | true | "minify" | "optimize" | "optimize-advanced" | "<command>".
#[derive(Debug, Clone, Default, Serialize, Deserialize, Config)]
#[serde(default)]
#[config(section = "asset_bundler.compress")]
pub struct CompressConfig {
    /// JavaScript bundles.
    #[config(inline_doc = "JavaScript bundles.")]
    pub js: CompressSetting,

    /// Stylesheet bundles.
    #[config(inline_doc = "Stylesheet bundles.")]
    pub css: CompressSetting,

    /// Extern declaration files for `optimize-advanced`, relative to source.
    pub js_externs: Vec<String>,
}

impl CompressConfig {
    /// Enabled backends keyed by asset type.
    pub fn backends(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [("js", &self.js), ("css", &self.css)]
            .into_iter()
            .filter_map(|(kind, setting)| setting.backend().map(|b| (kind, b)))
    }

    /// Validate backends and extern files.
    pub fn validate(&self, source_dir: &std::path::Path, diag: &mut ConfigDiagnostics) {
        for (kind, backend) in self.backends() {
            let field = match kind {
                "js" => Self::FIELDS.js,
                _ => Self::FIELDS.css,
            };
            match Plugin::from_name(backend) {
                Some(plugin) if !plugin.supports(kind) => {
                    diag.warn(
                        field,
                        format!("`{}` does not process {} bundles", plugin.name(), kind),
                    );
                }
                Some(_) => {}
                None => {
                    let command = CommandTemplate::new(backend);
                    if let Some(program) = command.program()
                        && which::which(program).is_err()
                    {
                        diag.hint(field, format!("`{program}` not found in PATH"));
                    }
                }
            }
        }

        for extern_file in &self.js_externs {
            if !source_dir.join(extern_file).is_file() {
                diag.error_with_hint(
                    Self::FIELDS.js_externs,
                    format!("extern file `{extern_file}` not found"),
                    "paths are relative to the site source directory",
                );
            }
        }

        if !self.js_externs.is_empty()
            && self.js.backend() != Some(Plugin::OptimizeAdvanced.name())
        {
            diag.warn(
                Self::FIELDS.js_externs,
                "only used when `js = \"optimize-advanced\"`",
            );
        }
    }
}
