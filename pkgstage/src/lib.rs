#[macro_use]
mod macros;

pub mod cli;
pub mod config;
pub mod pipeline;
pub mod service;
pub mod stage;
pub mod toolchain;

pub use config::{Config, ResolvedConfig};
pub use pipeline::{Pipeline, PipelineError};
pub use stage::{StageError, StageReport};
pub use toolchain::BuildMode;
