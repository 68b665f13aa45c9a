use std::process::exit;

use clap::Parser;
use log::*;
use pkgstage::cli::{init_logging, Cli};
use pkgstage::{BuildMode, Pipeline};

/// pkgstage-build compiles the client in development mode and copies the
/// package into the server's publish directory.
#[derive(Parser)]
#[command(name = "pkgstage-build", version = env!("CARGO_PKG_VERSION"))]
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

    if let Err(err) = Pipeline::new(config).build(BuildMode::Development) {
        // Compile failures are already reported by the pipeline.
        if !matches!(err, pkgstage::PipelineError::CompileFailure { .. }) {
            error!("{err}");
        }
        exit(err.exit_code());
    }
}
