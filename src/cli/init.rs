//! `sheaf init`: write a commented default configuration.

use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

use crate::config::{BundlerConfig, CONFIG_FILE, CompressConfig, SiteConfig};
use crate::log;

/// Files to write ignore patterns to
const IGNORE_FILES: &[&str] = &[".gitignore", ".ignore"];

/// Examples for the map-valued sections, which have no generated template.
const MAP_SECTIONS: &str = "\
# Markup per type; `{{url}}` is replaced with the bundle URL.
# [asset_bundler.markup_templates]
# js = \"<script src='{{url}}' defer></script>\\n\"

# Bundles built after all pages, keyed by output filename.
# [asset_bundler.named_bundles]
# \"vendor.js\" = [\"/js/jquery.js\", \"//cdn.example.com/lib.js\"]

# Variables available to templated sources as `{{ site.NAME }}`.
# [site]
# title = \"\"
";

/// Create `sheaf.toml` (and ignore files) in `root`.
///
/// If `dry_run` is true, only prints the config template to stdout.
pub fn new_site(root: &Path, dry_run: bool) -> Result<()> {
    if dry_run {
        print!("{}", generate_config_template());
        return Ok(());
    }

    let config_path = root.join(CONFIG_FILE);
    if config_path.exists() {
        bail!("`{}` already exists", config_path.display());
    }

    fs::create_dir_all(root)
        .with_context(|| format!("Failed to create '{}'", root.display()))?;
    write_config(root)?;
    write_ignore_files(root, Path::new(&SiteConfig::default().destination))?;

    log!("init"; "wrote {}", config_path.display());
    Ok(())
}

/// Generate sheaf.toml content with comments
pub fn generate_config_template() -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "# Sheaf configuration file (v{})\n\n",
        env!("CARGO_PKG_VERSION")
    ));

    out.push_str(&SiteConfig::template_with_header());
    out.push('\n');

    out.push_str(&BundlerConfig::template_with_header());
    out.push('\n');

    out.push_str(&CompressConfig::template_with_header());
    out.push('\n');

    out.push_str(MAP_SECTIONS);

    out
}

/// Write default sheaf.toml configuration
fn write_config(root: &Path) -> Result<()> {
    let path = root.join(CONFIG_FILE);
    fs::write(&path, generate_config_template())
        .with_context(|| format!("Failed to write config file '{}'", path.display()))
}

/// Write .gitignore and .ignore files ignoring the output and cache dirs.
///
/// Existing ignore files are left untouched.
fn write_ignore_files(root: &Path, output_dir: &Path) -> Result<()> {
    let output_pattern = Path::new("/").join(output_dir);
    let patterns = [
        format!("{}/", output_pattern.to_string_lossy()),
        "/.sheaf/".to_string(),
    ];
    let content = patterns.join("\n") + "\n";

    for filename in IGNORE_FILES {
        let path = root.join(filename);
        if !path.exists() {
            fs::write(&path, &content)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use tempfile::TempDir;

    #[test]
    fn test_template_is_valid_config() {
        let template = generate_config_template();
        assert!(template.contains("[asset_bundler]"));
        assert!(template.contains("[asset_bundler.compress]"));

        let config = test_parse_config(&template);
        assert_eq!(config.asset_bundler.base_path, "/bundles/");
        assert_eq!(config.asset_bundler.compress.backends().count(), 0);
    }

    #[test]
    fn test_new_site() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("blog");
        new_site(&root, false).unwrap();

        assert!(root.join(CONFIG_FILE).is_file());
        let gitignore = fs::read_to_string(root.join(".gitignore")).unwrap();
        assert_eq!(gitignore, "/_site/\n/.sheaf/\n");

        assert!(new_site(&root, false).is_err());
    }

    #[test]
    fn test_ignore_files_not_overwritten() {
        let temp = TempDir::new().unwrap();
        let gitignore = temp.path().join(".gitignore");
        fs::write(&gitignore, "custom content").unwrap();

        write_ignore_files(temp.path(), Path::new("_site")).unwrap();

        let content = fs::read_to_string(&gitignore).unwrap();
        assert_eq!(content, "custom content");
    }
}
