//! `sheaf clean`.

use anyhow::{Context, Result};

use crate::{bundle::ContentCache, config::SiteConfig, log};

/// Remove the bundle cache directory.
pub fn clean(config: &SiteConfig) -> Result<()> {
    let cache = ContentCache::new(&config.bundler_settings().cache_dir);
    let dir = config.root_relative(cache.dir());
    let removed = cache
        .clear()
        .with_context(|| format!("failed to remove `{}`", dir.display()))?;
    if removed {
        log!("clean"; "removed {}", dir.display());
    } else {
        log!("clean"; "nothing to clean at {}", dir.display());
    }
    Ok(())
}
