use std::io;
use std::process::ExitStatus;

use log::*;
use thiserror::Error;

use crate::config::ResolvedConfig;
use crate::service::Service;
use crate::stage::{self, StageError, StageReport};
use crate::toolchain::{BuildMode, Toolchain};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to compile ({})", describe_exit(.code))]
    CompileFailure { code: Option<i32> },
    #[error("could not start toolchain `{program}`: {source}")]
    ToolchainSpawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to stage package: {0}")]
    Staging(#[from] StageError),
    #[error("could not run service `{program}`: {source}")]
    ServiceLaunch {
        program: String,
        #[source]
        source: io::Error,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("toolchain exited with code {code}"),
        None => "toolchain was terminated by a signal".to_owned(),
    }
}

impl PipelineError {
    /// The code the process should exit with after this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::CompileFailure { code: Some(code) } if *code != 0 => *code,
            _ => 1,
        }
    }
}

/// Compiles the client, publishes the package and optionally boots the
/// server. Each step blocks until it is done.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ResolvedConfig,
    toolchain: Toolchain,
    service: Service,
}

impl Pipeline {
    pub fn new(config: ResolvedConfig) -> Self {
        let toolchain = Toolchain::new(config.toolchain.clone(), &config.source_dir);
        let service = Service::new(config.service.clone(), &config.root);

        Pipeline {
            config,
            toolchain,
            service,
        }
    }

    pub fn compile(&self, mode: BuildMode) -> Result<ExitStatus, PipelineError> {
        self.toolchain.compile(mode)
    }

    pub fn stage(&self) -> Result<StageReport, PipelineError> {
        Ok(stage::stage(
            &self.config.build_output_dir,
            &self.config.publish_dir,
        )?)
    }

    /// Compiles and, only if the toolchain succeeded, stages the package.
    pub fn build(&self, mode: BuildMode) -> Result<StageReport, PipelineError> {
        info!("compiling client");
        let status = self.compile(mode)?;

        if !status.success() {
            let err = PipelineError::CompileFailure {
                code: status.code(),
            };
            error!("{err}");
            return Err(err);
        }

        info!("copying package to server");
        let report = self.stage()?;
        info!(
            "staged {} files ({} bytes) into `{}`",
            report.files,
            report.bytes,
            self.config.publish_dir.display()
        );

        Ok(report)
    }

    pub fn launch_service(&self) -> Result<ExitStatus, PipelineError> {
        info!("booting server");
        let status = self.service.launch()?;

        if !status.success() {
            warn!("server exited with {status}");
        }

        Ok(status)
    }

    /// Production build, staging, then the service in the foreground.
    /// Returns the service's exit status.
    pub fn run(&self) -> Result<ExitStatus, PipelineError> {
        self.build(BuildMode::Production)?;
        self.launch_service()
    }
}
