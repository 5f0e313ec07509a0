//! slnbuild - target-graph build automation for .NET solutions
//!
//! Resolves the requested target together with its dependencies into an
//! ordered plan and runs it fail-fast.
//!
//! ## Architecture
//!
//! ```text
//! cli → target graph (resolve) → runner → build script → dotnet / project files
//! ```

mod build;
mod cli;
mod config;
mod error;
mod exec;
mod project;
mod target;
mod utils;
mod version;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_filter = if cli.verbose { "slnbuild=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(err) = cli.execute() {
        error::display_error(&err);
        std::process::exit(1);
    }
}
