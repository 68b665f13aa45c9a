use std::process::exit;

use clap::Parser;
use log::*;
use pkgstage::cli::{init_logging, Cli};
use pkgstage::service::exit_code;
use pkgstage::{Pipeline, PipelineError};

/// pkgstage-run compiles the client for production, copies the package into
/// the server's publish directory and boots the server in the foreground.
#[derive(Parser)]
#[command(name = "pkgstage-run", version = env!("CARGO_PKG_VERSION"))]
struct Args {
    #[command(flatten)]
    cli: Cli,
}

fn main() {
    let args = Args::parse();
    init_logging();

    let config = match args.cli.load_config() {
        Ok(config) => config,
        Err(err) => {
            error!("{err:#}");
            exit(1);
        }
    };

    match Pipeline::new(config).run() {
        Ok(status) => exit(exit_code(status)),
        Err(err) => {
            if !matches!(err, PipelineError::CompileFailure { .. }) {
                error!("{err}");
            }
            exit(err.exit_code());
        }
    }
}
