//! `[asset_bundler]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [asset_bundler]
//! base_path = "/bundles/"
//! server_url = "https://cdn.example.com"
//! remove_bundled = true
//!
//! [asset_bundler.markup_templates]
//! js = "<script src='{{url}}' defer></script>\n"
//!
//! [asset_bundler.named_bundles]
//! "vendor.js" = ["/js/jquery.js", "//cdn.example.com/lib.js"]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use macros::Config;
use serde::{Deserialize, Serialize};

use super::CompressConfig;
use crate::bundle::{
    BundlerSettings, DEFAULT_BASE_PATH, MarkupTemplate, TemplateError, default_template,
    default_templates, is_supported, normalize_base_path, type_of,
};
use crate::config::ConfigDiagnostics;
use crate::log;

/// Asset bundling options.
#[derive(Debug, Clone, Serialize, Deserialize, Config)]
#[serde(default)]
#[config(section = "asset_bundler")]
pub struct BundlerConfig {
    /// Per-language compile flags (coffee, less). Reserved; nothing is compiled yet.
    #[config(status = experimental)]
    pub compile: BTreeMap<String, bool>,

    /// Compression backends by type.
    #[config(sub, status = hidden)]
    pub compress: CompressConfig,

    /// URL path prefix for generated bundles.
    #[config(default = "/bundles/")]
    pub base_path: String,

    /// Server or CDN URL prepended to base_path in markup.
    pub server_url: String,

    /// Alias of server_url, used only when server_url is empty.
    #[config(status = deprecated)]
    pub cdn: Option<String>,

    /// Remove bundled source files from the published output.
    #[config(inline_doc = "Remove bundled source files from the published output.")]
    pub remove_bundled: bool,

    /// Reference original sources instead of merged bundles; disables compression.
    pub dev: bool,

    /// Markup template per type with a single `{{url}}` placeholder.
    #[config(status = hidden)]
    pub markup_templates: BTreeMap<String, toml::Value>,

    /// Bundles built after all pages, keyed by output filename.
    #[config(status = hidden)]
    pub named_bundles: BTreeMap<String, Vec<String>>,
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            compile: BTreeMap::from([("coffee".into(), false), ("less".into(), false)]),
            compress: CompressConfig::default(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            server_url: String::new(),
            cdn: None,
            remove_bundled: false,
            dev: false,
            markup_templates: BTreeMap::new(),
            named_bundles: BTreeMap::new(),
        }
    }
}

/// Run-wide signals that force or override dev mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct DevSignals {
    /// Top-level `dev` key, overrides `asset_bundler.dev` when present.
    pub global: Option<bool>,
    /// Top-level `watch` key.
    pub watch: bool,
    /// `--dev` on the command line.
    pub cli: bool,
}

impl BundlerConfig {
    /// Effective server URL (`server_url`, falling back to `cdn`).
    pub fn effective_server_url(&self) -> &str {
        if self.server_url.is_empty() {
            self.cdn.as_deref().unwrap_or_default()
        } else {
            &self.server_url
        }
    }

    /// Effective dev flag after applying run-wide signals.
    pub fn effective_dev(&self, signals: DevSignals) -> bool {
        let dev = signals.global.unwrap_or(self.dev);
        dev || signals.watch || signals.cli
    }

    /// Markup templates merged over the built-in defaults.
    ///
    /// Invalid configured templates are logged and replaced by the default
    /// for their type (or dropped if the type has none).
    pub fn markup(&self) -> rustc_hash::FxHashMap<String, MarkupTemplate> {
        let mut markup: rustc_hash::FxHashMap<_, _> = default_templates()
            .map(|(kind, template)| (kind.to_string(), template))
            .collect();

        for (kind, value) in &self.markup_templates {
            let parsed = match value {
                toml::Value::String(source) => MarkupTemplate::parse(source),
                other => Err(TemplateError::NotAString(other.type_str())),
            };
            match parsed {
                Ok(template) => {
                    markup.insert(kind.clone(), template);
                }
                Err(e) => {
                    log!("config"; "markup_templates.{}: {}, using the default template", kind, e);
                    match default_template(kind) {
                        Some(template) => markup.insert(kind.clone(), template),
                        None => markup.remove(kind),
                    };
                }
            }
        }
        markup
    }

    /// Resolve into the immutable settings the engine runs with.
    pub fn resolve(&self, root: &Path, source_dir: &Path, signals: DevSignals) -> BundlerSettings {
        let mut settings = BundlerSettings::for_project(root, source_dir);
        settings.compress = self
            .compress
            .backends()
            .map(|(kind, backend)| (kind.to_string(), backend.to_string()))
            .collect();
        settings.js_externs = self.compress.js_externs.clone();
        settings.base_path = normalize_base_path(&self.base_path);
        settings.server_url = self.effective_server_url().to_string();
        settings.remove_bundled = self.remove_bundled;
        settings.dev = self.effective_dev(signals);
        settings.markup = self.markup();
        settings
    }

    /// Validate bundler options.
    pub fn validate(&self, source_dir: &Path, diag: &mut ConfigDiagnostics) {
        self.compress.validate(source_dir, diag);

        let server_url = self.effective_server_url();
        if !server_url.is_empty() {
            // Protocol-relative URLs are valid in markup
            let absolute = if server_url.starts_with("//") {
                format!("https:{server_url}")
            } else {
                server_url.to_string()
            };
            if let Err(e) = url::Url::parse(&absolute) {
                let field = if self.server_url.is_empty() {
                    Self::FIELDS.cdn
                } else {
                    Self::FIELDS.server_url
                };
                diag.error_with_hint(
                    field,
                    format!("invalid URL `{server_url}`: {e}"),
                    "use an absolute URL such as `https://cdn.example.com`",
                );
            }
        }

        for (name, sources) in &self.named_bundles {
            match type_of(name) {
                Some(kind) if is_supported(&kind) => {}
                Some(kind) => diag.error(
                    Self::FIELDS.named_bundles,
                    format!("`{name}`: unsupported bundle type `{kind}`"),
                ),
                None => diag.error_with_hint(
                    Self::FIELDS.named_bundles,
                    format!("cannot determine bundle type (js or css) of `{name}`"),
                    "name the bundle with a `.js` or `.css` extension",
                ),
            }
            if sources.is_empty() {
                diag.warn(
                    Self::FIELDS.named_bundles,
                    format!("`{name}` has no sources"),
                );
            }
        }
    }
}
