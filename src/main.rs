//! Sheaf - a content-addressed asset bundler for static sites.

mod bundle;
mod cli;
mod config;
mod logger;
mod site;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::SiteConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    match &cli.command {
        Commands::Init { name, dry } => {
            let cwd = std::env::current_dir()?;
            let root = name.as_ref().map_or_else(|| cwd.clone(), |name| cwd.join(name));
            cli::init::new_site(&root, *dry)
        }
        Commands::Build { .. } => cli::build::build(&SiteConfig::load(&cli)?),
        Commands::Clean => cli::clean::clean(&SiteConfig::load(&cli)?),
    }
}
