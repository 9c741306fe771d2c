//! GemFamily - gem dependency graph renderer
//!
//! Resolves every runtime dependency of a gem (or of a Gemfile.lock) to one
//! concrete version using RubyGems version rules and draws the result.
//!
//! ## Architecture
//!
//! ```text
//! gem store (JSON) → repository → dependency::resolver → Graph → export (text/json/dot/dot -T)
//! ```

mod cli;
mod commands;
mod config;
mod dependency;
mod error;
mod export;
mod lockfile;
mod repository;
mod utils;
mod version;

use std::env;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;
use error::GemError;
use utils::terminal::print_error;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<GemError>() {
                Some(gem_err) => gem_err.display_with_hints(),
                None => print_error(&format!("{:#}", err)),
            }
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr; `GEMFAMILY_LOG` takes an `EnvFilter` directive and
/// `GEMFAMILY_LOG_FORMAT=json` switches to JSON lines.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("GEMFAMILY_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "gemfamily=debug"
        } else {
            "gemfamily=warn"
        })
    });

    let format = env::var("GEMFAMILY_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}
