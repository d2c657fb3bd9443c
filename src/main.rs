//! livepage - watch HTML documents on disk and stream every change to the browser.

mod actor;
mod cli;
mod config;
mod core;
mod document;
mod dom;
mod logger;
mod reactive;
mod stream;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{LiveConfig, init_config};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = init_config(LiveConfig::load(&cli)?);

    match &cli.command {
        Commands::Serve { .. } => cli::serve::bind_server()?.run(),
        Commands::Render {
            page, strip_ids, ..
        } => cli::render::render_page(&config, page, *strip_ids),
    }
}
