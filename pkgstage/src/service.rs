use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use log::*;

use crate::config::ServiceConfig;
use crate::pipeline::PipelineError;

/// The long-running server booted after a successful build.
#[derive(Debug, Clone)]
pub struct Service {
    config: ServiceConfig,
    working_dir: PathBuf,
}

impl Service {
    pub fn new(config: ServiceConfig, working_dir: impl Into<PathBuf>) -> Self {
        Service {
            config,
            working_dir: working_dir.into(),
        }
    }

    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.config.program);
        command
            .args(&self.config.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        command
    }

    /// Starts the service in the foreground and blocks until it exits.
    pub fn launch(&self) -> Result<ExitStatus, PipelineError> {
        debug!(
            "starting {} {:?} in `{}`",
            self.config.program,
            self.config.args,
            self.working_dir.display()
        );

        let mut child = self
            .command()
            .spawn()
            .map_err(|source| PipelineError::ServiceLaunch {
                program: self.config.program.clone(),
                source,
            })?;

        // Installed after the spawn so the child keeps the default handler.
        #[cfg(unix)]
        let _guard = IgnoreInterrupt::install();

        child.wait().map_err(|source| PipelineError::ServiceLaunch {
            program: self.config.program.clone(),
            source,
        })
    }
}

/// Ignores SIGINT in this process until dropped. Ctrl-C still reaches the
/// service through the terminal's process group, and we wait for it to exit.
#[cfg(unix)]
struct IgnoreInterrupt {
    previous: libc::sighandler_t,
}

#[cfg(unix)]
impl IgnoreInterrupt {
    fn install() -> Option<Self> {
        let previous = unsafe { libc::signal(libc::SIGINT, libc::SIG_IGN) };
        if previous == libc::SIG_ERR {
            warn!("failed to ignore SIGINT while the server runs");
            return None;
        }
        Some(IgnoreInterrupt { previous })
    }
}

#[cfg(unix)]
impl Drop for IgnoreInterrupt {
    fn drop(&mut self) {
        unsafe {
            libc::signal(libc::SIGINT, self.previous);
        }
    }
}

/// Maps a child's exit status to a code this process can exit with. A child
/// killed by a signal maps to `128 + signal`, as shells report it.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    #[test]
    fn exit_code_from_status() {
        assert_eq!(exit_code(ExitStatus::from_raw(0)), 0);
        assert_eq!(exit_code(ExitStatus::from_raw(7 << 8)), 7);
    }

    #[test]
    fn exit_code_from_signal() {
        // SIGINT
        assert_eq!(exit_code(ExitStatus::from_raw(2)), 130);
    }

    #[test]
    fn launch_waits_for_exit() {
        let temp = tempfile::tempdir().unwrap();
        let config = ServiceConfig {
            program: "sh".to_owned(),
            args: vec!["-c".to_owned(), "touch booted; exit 4".to_owned()],
        };

        let status = Service::new(config, temp.path()).launch().unwrap();

        assert_eq!(status.code(), Some(4));
        assert!(temp.path().join("booted").exists());
    }

    #[test]
    fn missing_program_is_launch_error() {
        let config = ServiceConfig {
            program: "pkgstage-no-such-server".to_owned(),
            args: vec![],
        };

        let err = Service::new(config, ".").launch().unwrap_err();
        assert!(matches!(err, PipelineError::ServiceLaunch { .. }));
    }
}
