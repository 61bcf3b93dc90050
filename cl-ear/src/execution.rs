// SPDX-License-Identifier: GPL-3.0-or-later

//! Running the real compiler.

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A process execution to start.
///
/// The child inherits the environment of the current process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub executable: PathBuf,
    /// The arguments without the program name.
    pub arguments: Vec<OsString>,
    pub working_dir: PathBuf,
}

impl From<Execution> for Command {
    fn from(val: Execution) -> Self {
        let mut command = Command::new(val.executable);
        command.args(val.arguments);
        command.current_dir(val.working_dir);
        command
    }
}

impl fmt::Display for Execution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arguments: Vec<_> = self.arguments.iter().map(|argument| argument.to_string_lossy()).collect();
        write!(
            f,
            "Execution path={}, args=[{}], cwd={}",
            self.executable.display(),
            arguments.join(","),
            self.working_dir.display()
        )
    }
}

/// Runs the execution to completion and returns its exit status.
///
/// A termination signal received meanwhile does not stop the current
/// process. The child is killed instead, and its status is returned.
pub fn supervise(execution: Execution) -> Result<ExitStatus, SuperviseError> {
    let signaled = termination_requests().map_err(SuperviseError::SignalHandlers)?;

    let executable = execution.executable.clone();
    let child = Command::from(execution)
        .spawn()
        .map_err(|source| SuperviseError::Spawn { executable: executable.clone(), source })?;

    wait(child, &signaled).map_err(|source| SuperviseError::Wait { executable, source })
}

/// Installs the handlers which record the last termination signal.
fn termination_requests() -> io::Result<Arc<AtomicUsize>> {
    let signaled = Arc::new(AtomicUsize::new(0));
    for &signal in signal_hook::consts::TERM_SIGNALS {
        signal_hook::flag::register_usize(signal, Arc::clone(&signaled), signal as usize)?;
    }
    Ok(signaled)
}

fn wait(mut child: Child, signaled: &AtomicUsize) -> io::Result<ExitStatus> {
    loop {
        if let Some(exit_status) = child.try_wait()? {
            log::debug!("Compiler process exited: {exit_status:?}");
            return Ok(exit_status);
        }

        let signal = signaled.swap(0, Ordering::SeqCst);
        if signal != 0 {
            log::debug!("Received signal {signal}, killing the compiler process");
            // The child may have exited already.
            if let Err(error) = child.kill() {
                log::warn!("Failed to kill the compiler process: {error}");
            }
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[derive(Error, Debug)]
pub enum SuperviseError {
    #[error("Failed to install termination signal handlers: {0}")]
    SignalHandlers(#[source] io::Error),
    #[error("Failed to execute '{}': {source}", .executable.display())]
    Spawn {
        executable: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Lost track of the compiler process '{}': {source}", .executable.display())]
    Wait {
        executable: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn execution(executable: &str, arguments: &[&str]) -> Execution {
        Execution {
            executable: PathBuf::from(executable),
            arguments: arguments.iter().map(OsString::from).collect(),
            working_dir: std::env::temp_dir(),
        }
    }

    #[test]
    fn test_command_from_execution() {
        let command = Command::from(execution("cl.exe", &["/c", "a.cpp"]));

        assert_eq!(command.get_program(), "cl.exe");
        assert_eq!(command.get_args().collect::<Vec<_>>(), vec!["/c", "a.cpp"]);
        assert_eq!(command.get_current_dir(), Some(std::env::temp_dir().as_path()));
    }

    #[test]
    fn test_supervise_missing_executable() {
        let result = supervise(execution("/nonexistent/cl.exe", &[]));

        match result {
            Err(error @ SuperviseError::Spawn { .. }) => {
                assert!(error.to_string().contains("/nonexistent/cl.exe"));
            }
            other => panic!("Expected Spawn error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_supervise_exit_status() {
        let success = supervise(execution("true", &[])).unwrap();
        let failure = supervise(execution("false", &[])).unwrap();

        assert!(success.success());
        assert_eq!(failure.code(), Some(1));
    }

    #[test]
    fn test_display_execution() {
        let sut = Execution {
            executable: PathBuf::from("cl.exe"),
            arguments: vec![OsString::from("/c"), OsString::from("a.cpp")],
            working_dir: PathBuf::from("/work"),
        };

        assert_eq!(sut.to_string(), "Execution path=cl.exe, args=[/c,a.cpp], cwd=/work");
    }

    #[cfg(unix)]
    #[test]
    fn test_supervise_passes_arguments() {
        let status = supervise(execution("sh", &["-c", "exit 3"])).unwrap();

        assert_eq!(status.code(), Some(3));
    }
}
