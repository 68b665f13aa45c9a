use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::*;

use crate::config::{Config, ResolvedConfig, DEFAULT_CONFIG_FILE};

/// Options shared by the `pkgstage-build` and `pkgstage-run` tools. Both work with no
/// arguments from the project root.
#[derive(Debug, Parser)]
pub struct Cli {
    #[arg(
        long = "root",
        short = 'r',
        value_name = "DIR",
        help = "Project root that relative paths are resolved against. Defaults to the current directory."
    )]
    pub root: Option<PathBuf>,

    #[arg(
        long = "config",
        short = 'c',
        value_name = "CONFIG FILE",
        help = "Use the specified configuration file instead of <root>/pkgstage.toml."
    )]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn root(&self) -> Result<PathBuf> {
        match &self.root {
            Some(root) => {
                if !root.is_dir() {
                    bail!(
                        "specified project root is not a directory: '{}'",
                        root.display()
                    );
                }
                root.canonicalize()
                    .with_context(|| format!("could not resolve '{}'", root.display()))
            }
            None => std::env::current_dir().context("could not determine the current directory"),
        }
    }

    /// Loads the configuration named on the command line, falling back to
    /// `<root>/pkgstage.toml` and then to the built-in defaults.
    pub fn load_config(&self) -> Result<ResolvedConfig> {
        let root = self.root()?;

        let config = match &self.config {
            Some(path) => {
                if !path.exists() {
                    bail!(
                        "specified configuration file does not exist: '{}'",
                        path.display()
                    );
                }
                Config::load(path)?
            }
            None => {
                let path = root.join(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Config::load(&path)?
                } else {
                    debug!("no {DEFAULT_CONFIG_FILE} in '{}', using defaults", root.display());
                    Config::default()
                }
            }
        };

        Ok(config.resolve(&root))
    }
}

/// Initializes logging at `info` unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    let env = env_logger::Env::default().filter_or("RUST_LOG", "info");
    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .init();
}
