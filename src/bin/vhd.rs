//! VHD CLI Binary
//!
//! One-shot command runner and interactive shell for the virtual hard drive.

use anyhow::Context;
use clap::Parser;
use std::process;
use vhd::config::{xdg, ConfigLoader};
use vhd::logging::init_logging;
use vhd::tooling::cli::{Cli, CliContext};

fn main() {
    let cli = Cli::parse();

    if cli.init_config {
        match init_config(&cli) {
            Ok(path) => println!("Wrote {}", path),
            Err(e) => {
                eprintln!("Error: {:#}", e);
                process::exit(1);
            }
        }
        return;
    }

    let mut context = match start(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error initializing session: {:#}", e);
            process::exit(1);
        }
    };

    if cli.is_interactive() {
        if let Err(e) = context.run_interactive() {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
        return;
    }

    match context.execute(&cli.command) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output.trim_end());
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn start(cli: &Cli) -> anyhow::Result<CliContext> {
    let config = cli.load_config().context("loading configuration")?;
    init_logging(Some(&config.logging)).context("installing logger")?;
    tracing::debug!(drives = config.drives.len(), "configuration loaded");
    let context = CliContext::new(config, cli.config_base(), cli.is_interactive())
        .context("opening catalog")?;
    Ok(context)
}

fn init_config(cli: &Cli) -> anyhow::Result<String> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => xdg::global_config_path()?,
    };
    ConfigLoader::write_default(&path)?;
    Ok(path.display().to_string())
}
