//! `sheaf build`.

use std::time::Instant;

use anyhow::Result;

use crate::{config::SiteConfig, debug, log, site::build_site, utils::plural::plural_count};

/// Build the site and report what was produced.
pub fn build(config: &SiteConfig) -> Result<()> {
    let start = Instant::now();
    if config.is_dev() {
        log!("build"; "dev mode: referencing original sources");
    }

    let report = build_site(config)?;

    debug!("build"; "{} assembled, {} reused, {} compressed",
        report.stats.assembled, report.stats.reused, report.stats.compressed);
    log!("build"; "{}, {}, {} -> {} ({} written) in {:.2?}",
        plural_count(report.pages, "page"),
        plural_count(report.static_files, "static file"),
        plural_count(report.bundles, "bundle"),
        config.root_relative(&config.destination).display(),
        report.written,
        start.elapsed());
    Ok(())
}
