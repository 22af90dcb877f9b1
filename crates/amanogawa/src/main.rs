// SPDX-FileCopyrightText: 2026 Amanogawa Addon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Amanogawa - a Stremio addon for Ukrainian anime dubs.
//!
//! This is the binary entry point: `serve` runs the addon, `login` authorizes
//! the Telegram user session it streams through.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod login;
mod serve;
mod shutdown;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use amanogawa_config::{AmanogawaConfig, ConfigError};

/// Amanogawa - a Stremio addon for Ukrainian anime dubs.
#[derive(Parser, Debug)]
#[command(name = "amanogawa", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the addon HTTP server.
    Serve,
    /// Authorize the Telegram user session interactively.
    Login,
}

fn load_config(path: Option<&Path>) -> Result<AmanogawaConfig, Vec<ConfigError>> {
    match path {
        Some(path) => amanogawa_config::load_and_validate_path(path),
        None => amanogawa_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("amanogawa: use --help for available commands");
        return;
    };

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            amanogawa_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Login => login::run_login(config).await,
    };

    if let Err(e) = result {
        eprintln!("amanogawa: {e}");
        std::process::exit(1);
    }
}
