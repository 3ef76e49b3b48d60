//! Site configuration management for `sheaf.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── bundler    # [asset_bundler]
//! │   └── compress   # [asset_bundler.compress]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   ├── field      # FieldPath
//! │   └── status     # FieldStatus checks
//! └── mod.rs         # SiteConfig (this file)
//! ```
//!
//! # Top-level keys
//!
//! | Key               | Purpose                                           |
//! |-------------------|---------------------------------------------------|
//! | `source`          | Site source directory (default `.`)               |
//! | `destination`     | Output directory (default `_site`)                |
//! | `dev`             | Global dev switch, overrides `asset_bundler.dev`  |
//! | `watch`           | Watch/serve signal, forces dev mode               |
//! | `[site]`          | Variables rendered as `{{ site.NAME }}`           |
//! | `[asset_bundler]` | Bundler options                                   |

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{BundlerConfig, CompressConfig, DevSignals};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::{
    bundle::BundlerSettings,
    cli::{BuildArgs, Cli, Commands},
    log,
    utils::path::normalize_path,
};
use anyhow::{Result, bail};
use macros::Config;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Default config filename.
pub const CONFIG_FILE: &str = "sheaf.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing sheaf.toml
#[derive(Debug, Clone, Serialize, Deserialize, Config)]
#[serde(default)]
#[config(section = "")]
pub struct SiteConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    #[config(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    #[config(skip)]
    pub root: PathBuf,

    /// `--dev` from the command line (internal use only)
    #[serde(skip)]
    #[config(skip)]
    pub cli_dev: bool,

    /// `--clean` from the command line (internal use only)
    #[serde(skip)]
    #[config(skip)]
    pub clean: bool,

    /// Site source directory.
    #[config(default = ".")]
    pub source: PathBuf,

    /// Output directory.
    #[config(default = "_site")]
    pub destination: PathBuf,

    /// Global dev switch; overrides `asset_bundler.dev` when set.
    pub dev: Option<bool>,

    /// Set by watch/serve tooling; forces dev mode.
    pub watch: bool,

    /// Site variables, rendered in sources as `{{ site.NAME }}`.
    #[config(status = hidden)]
    pub site: BTreeMap<String, toml::Value>,

    /// Bundler options.
    #[config(sub, status = hidden)]
    pub asset_bundler: BundlerConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            root: PathBuf::new(),
            cli_dev: false,
            clean: false,
            source: PathBuf::from("."),
            destination: PathBuf::from("_site"),
            dev: None,
            watch: false,
            site: BTreeMap::new(),
            asset_bundler: BundlerConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration for a command that needs an existing site.
    ///
    /// Searches upward from cwd to find the config file. The project root
    /// is the config file's parent directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let Some(config_path) = find_config_file(&cli.config) else {
            bail!(ConfigError::Validation(format!(
                "config file '{}' not found, run `sheaf init` to create one",
                cli.config.display()
            )));
        };

        let mut config = Self::from_path(&config_path)?;
        config.config_path = normalize_path(&config_path);
        config.finalize(cli);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Finalize configuration after loading.
    fn finalize(&mut self, cli: &Cli) {
        let root = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        self.root = root;
        self.normalize_paths();
        self.apply_command_options(cli);
    }

    /// Get path relative to the site root
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    /// Run-wide dev signals from the config and command line.
    pub fn dev_signals(&self) -> DevSignals {
        DevSignals {
            global: self.dev,
            watch: self.watch,
            cli: self.cli_dev,
        }
    }

    /// Resolve the bundler settings for this run.
    pub fn bundler_settings(&self) -> BundlerSettings {
        self.asset_bundler
            .resolve(&self.root, &self.source, self.dev_signals())
    }

    /// Effective dev mode for this run.
    pub fn is_dev(&self) -> bool {
        self.asset_bundler.effective_dev(self.dev_signals())
    }

    /// Value of a `[site]` variable as rendered text.
    pub fn site_var(&self, name: &str) -> Option<String> {
        self.site.get(name).map(|value| match value {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Build { build_args } => self.apply_build_args(build_args),
            Commands::Init { .. } | Commands::Clean => {}
        }
    }

    /// Apply build arguments from CLI.
    fn apply_build_args(&mut self, args: &BuildArgs) {
        crate::logger::set_verbose(args.verbose);
        self.cli_dev = args.dev;
        self.clean = args.clean;
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Normalize source and destination relative to root.
    fn normalize_paths(&mut self) {
        self.source = normalize_path(&self.root.join(&self.source));
        self.destination = normalize_path(&self.root.join(&self.destination));
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.validate_field_status(&mut diag);

        if !self.source.is_dir() {
            diag.error(
                Self::FIELDS.source,
                format!("source directory `{}` not found", self.source.display()),
            );
        }
        if self.destination == self.source || self.source.starts_with(&self.destination) {
            diag.error_with_hint(
                Self::FIELDS.destination,
                "destination must not contain the source directory",
                "use a dedicated output directory such as `_site`",
            );
        }

        self.asset_bundler.validate(&self.source, &mut diag);

        diag.report();

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config content.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> SiteConfig {
    let (parsed, ignored) = SiteConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_from_str_invalid_toml() {
        let result = SiteConfig::parse_with_ignored("[asset_bundler\nbase_path = \"/b/\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_site_config_default() {
        let config = SiteConfig::default();
        assert_eq!(config.source, PathBuf::from("."));
        assert_eq!(config.destination, PathBuf::from("_site"));
        assert!(config.dev.is_none());
        assert!(!config.is_dev());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[asset_bundler]\nbase_pth = \"/b/\"\n[unknown_section]\nfield = 1";
        let (_, ignored) = SiteConfig::parse_with_ignored(content).unwrap();
        assert!(ignored.iter().any(|f| f.contains("base_pth")));
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_site_vars() {
        let config = test_parse_config("[site]\ntitle = \"Blog\"\nyear = 2024");
        assert_eq!(config.site_var("title").as_deref(), Some("Blog"));
        assert_eq!(config.site_var("year").as_deref(), Some("2024"));
        assert_eq!(config.site_var("missing"), None);
    }

    #[test]
    fn test_global_dev_signals() {
        let config = test_parse_config("dev = false\n[asset_bundler]\ndev = true");
        assert!(!config.is_dev());

        let config = test_parse_config("watch = true");
        assert!(config.is_dev());
    }

    #[test]
    fn test_load_resolves_paths() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        let config_path = dir.path().join(CONFIG_FILE);
        fs::write(&config_path, "source = \"src\"\ndestination = \"public\"").unwrap();

        let cli = Cli::parse_from([
            "sheaf",
            "-C",
            config_path.to_str().unwrap(),
            "build",
            "--dev",
        ]);
        let config = SiteConfig::load(&cli).unwrap();

        assert_eq!(config.root, normalize_path(dir.path()));
        assert!(config.source.ends_with("src"));
        assert!(config.destination.ends_with("public"));
        assert!(config.is_dev());
        assert!(config.bundler_settings().dev);
    }

    #[test]
    fn test_validate_missing_source() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(CONFIG_FILE);
        fs::write(&config_path, "source = \"missing\"").unwrap();

        let cli = Cli::parse_from(["sheaf", "-C", config_path.to_str().unwrap(), "build"]);
        assert!(SiteConfig::load(&cli).is_err());
    }

    #[test]
    fn test_template_parses() {
        let template = SiteConfig::template_with_header();
        let parsed = test_parse_config(&template);
        assert_eq!(parsed.destination, PathBuf::from("_site"));
    }
}
