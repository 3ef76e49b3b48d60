//! Minimal site host around the bundle engine.
//!
//! # Build flow
//!
//! ```text
//! scan source ─► static files ──────────────────────────┐
//!            └─► .html pages ─► render ─► expand tags ──┤
//! named bundles (forced) ───────────────────────────────┤
//!                                                       ▼
//!                                   OutputSet::write_all(destination)
//! ```

mod renderer;
mod scan;
mod tags;

pub use renderer::SiteRenderer;
pub use tags::expand_tags;

use scan::scan_source;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;

use crate::bundle::{
    AssetSpec, BuildStats, Engine, GeneratedFile, OutputSet, StaticFile, type_of,
};
use crate::config::SiteConfig;
use crate::{debug, log};

/// What a site build produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub pages: usize,
    pub static_files: usize,
    pub bundles: usize,
    pub written: usize,
    pub stats: BuildStats,
}

/// Build the whole site into the configured destination.
pub fn build_site(config: &SiteConfig) -> Result<BuildReport> {
    let vars: FxHashMap<String, String> = config
        .site
        .keys()
        .filter_map(|name| config.site_var(name).map(|value| (name.clone(), value)))
        .collect();
    let renderer = SiteRenderer::new(&config.source, vars);
    let mut engine = Engine::new(config.bundler_settings(), renderer);
    let mut outputs = OutputSet::new();
    let mut report = BuildReport::default();

    let exclude = [config.destination.clone(), config.config_path.clone()];
    let files = scan_source(&config.source, &exclude);

    let (pages, statics): (Vec<_>, Vec<_>) = files.into_iter().partition(|p| is_page(p));
    for path in statics {
        let relative = path.strip_prefix(&config.source)?.to_path_buf();
        outputs.push(Arc::new(StaticFile::new(path, relative)));
        report.static_files += 1;
    }

    for path in pages {
        let relative = path.strip_prefix(&config.source)?.to_path_buf();
        let page = relative.display().to_string();
        let rendered = engine
            .renderer()
            .render_path(&path)
            .with_context(|| format!("failed to render page `{page}`"))?;
        let html = expand_tags(
            &String::from_utf8_lossy(&rendered),
            &page,
            &mut engine,
            &mut outputs,
        )?;
        outputs.push(Arc::new(GeneratedFile::new(relative, html)));
        report.pages += 1;
    }

    for (name, sources) in &config.asset_bundler.named_bundles {
        let Some(kind) = type_of(name) else {
            log!("bundle"; "skipping named bundle `{}`: no type extension", name);
            continue;
        };
        let spec = AssetSpec::new(sources.clone(), kind)
            .with_name(name.clone())
            .forced();
        engine.build(&spec, &mut outputs)?;
    }

    if config.clean && config.destination.exists() {
        debug!("build"; "removing {}", config.destination.display());
        fs::remove_dir_all(&config.destination).with_context(|| {
            format!("failed to clean `{}`", config.destination.display())
        })?;
    }

    report.written = outputs.write_all(&config.destination)?;
    report.bundles = engine.registry().len();
    report.stats = engine.stats();
    Ok(report)
}

fn is_page(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html"))
}
