//! Command-line driver for the API doc materializer.
//!
//! # Usage
//!
//! ```bash
//! apidoc-materializer [OPTIONS] --type <TYPE> <SOURCE>
//! ```
//!
//! # Examples
//!
//! Example response payload for a generic page of orders:
//! ```bash
//! apidoc-materializer ./src --type 'Page<Order>'
//! ```
//!
//! Request parameter table as YAML, restricted to a validation group:
//! ```bash
//! apidoc-materializer model.yaml --type SignUp -d request -k params -g Create -f yaml
//! ```

use anyhow::Result;
use apidoc_materializer::cli;
use clap::Parser;
use log::info;

fn main() -> Result<()> {
    // Parse once up front so the verbose flag can set the log level before validation logs anything
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("API doc materializer starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    Ok(())
}
