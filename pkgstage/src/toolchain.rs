use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use log::*;

use crate::config::ToolchainConfig;
use crate::pipeline::PipelineError;

/// Which kind of package the toolchain should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Fast, unoptimized build with debug assertions.
    Development,
    /// Optimized build for serving.
    Production,
}

impl BuildMode {
    pub fn is_dev(self) -> bool {
        matches!(self, BuildMode::Development)
    }
}

/// The external packaging tool, invoked directly with an argument list.
#[derive(Debug, Clone)]
pub struct Toolchain {
    config: ToolchainConfig,
    source_dir: PathBuf,
}

impl Toolchain {
    pub fn new(config: ToolchainConfig, source_dir: impl Into<PathBuf>) -> Self {
        Toolchain {
            config,
            source_dir: source_dir.into(),
        }
    }

    pub fn args(&self, mode: BuildMode) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.config.args.iter().map(OsString::from).collect();
        if mode.is_dev() {
            args.extend(self.config.dev_args.iter().map(OsString::from));
        }
        args
    }

    pub fn command(&self, mode: BuildMode) -> Command {
        let mut command = Command::new(&self.config.program);
        command.args(self.args(mode)).current_dir(&self.source_dir);
        command
    }

    /// Runs the toolchain to completion and returns its exit status. Only a
    /// failure to start the process is an error here.
    pub fn compile(&self, mode: BuildMode) -> Result<ExitStatus, PipelineError> {
        debug!(
            "running {} {:?} in `{}`",
            self.config.program,
            self.args(mode),
            self.source_dir.display()
        );

        self.command(mode)
            .status()
            .map_err(|source| PipelineError::ToolchainSpawn {
                program: self.config.program.clone(),
                source,
            })
    }
}
