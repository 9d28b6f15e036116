//! Run shell commands with a deadline
//!
//! Only one command runs at a time. The caller blocks until the command
//! exits or its deadline passes, whichever happens first. A command that
//! outlives its deadline is killed along with everything it started.

use std::ffi::OsString;
use std::io::{self, Read};
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, sleep, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use thiserror::Error;

use crate::config::Invocation;
use crate::Status;

/// How often to check on a running child
const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Error)]
pub enum RunError {
    #[error("'{command}' failed: {status}{}", stderr_suffix(.stderr))]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("'{command}' timed out after {timeout} seconds")]
    TimedOut { command: String, timeout: u64 },
    #[error("error running '{command}': {source}")]
    Io {
        command: String,
        #[source]
        source: io::Error,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

impl RunError {
    /// The status the check should exit with because of this error
    pub fn status(&self) -> Status {
        match *self {
            RunError::Failed { .. } | RunError::TimedOut { .. } => Status::Critical,
            RunError::Io { .. } => Status::Unknown,
        }
    }
}

/// Something that can run a shell command and hand back its stdout lines
pub trait Execute {
    fn run(&self, command: &str) -> Result<Vec<String>, RunError>;
}

/// Runs commands through `/bin/sh` with a pinned `PATH`
#[derive(Clone, Debug)]
pub struct ShellRunner {
    search_path: OsString,
    timeout: Option<Duration>,
}

impl ShellRunner {
    pub fn new(search_path: OsString, timeout: Option<Duration>) -> ShellRunner {
        ShellRunner {
            search_path,
            timeout,
        }
    }

    pub fn from_invocation(inv: &Invocation) -> ShellRunner {
        ShellRunner::new(inv.search_path.clone(), inv.timeout)
    }

    fn spawn(&self, command: &str) -> io::Result<Child> {
        Command::new("/bin/sh")
            .arg("-c")
            .arg(command)
            .env("PATH", &self.search_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A group of its own, so that a timeout can take out whatever
            // the shell started too
            .process_group(0)
            .spawn()
    }
}

/// Wait for `child`, or kill its process group once `deadline` passes
///
/// Returns `None` if the child had to be killed.
fn wait_until(child: &mut Child, deadline: Option<Instant>) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                // A child we couldn't kill is left running rather than
                // blocking past the deadline
                if kill_group(child) {
                    child.wait()?;
                }
                return Ok(None);
            }
        }
        sleep(POLL_INTERVAL);
    }
}

/// SIGKILL everything in the child's process group, true if that worked
fn kill_group(child: &mut Child) -> bool {
    let pgid = Pid::from_raw(child.id() as i32);
    match killpg(pgid, Signal::SIGKILL) {
        Ok(()) => true,
        Err(e) => {
            // Most likely an elevated child we may not signal
            warn!("unable to kill process group {}: {}", pgid, e);
            match child.kill() {
                Ok(()) => true,
                Err(e) => {
                    warn!("unable to kill child {}: {}", pgid, e);
                    false
                }
            }
        }
    }
}

fn read_all<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<io::Result<String>> {
    thread::spawn(move || {
        let mut out = String::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_string(&mut out)?;
        }
        Ok(out)
    })
}

fn join_output(handle: JoinHandle<io::Result<String>>) -> io::Result<String> {
    handle
        .join()
        .unwrap_or_else(|_| Err(io::Error::new(io::ErrorKind::Other, "output reader panicked")))
}

impl Execute for ShellRunner {
    fn run(&self, command: &str) -> Result<Vec<String>, RunError> {
        let io_err = |source| RunError::Io {
            command: command.to_owned(),
            source,
        };
        debug!("running '{}' (timeout: {:?})", command, self.timeout);

        // A timeout too large to represent is the same as none
        let deadline = self.timeout.and_then(|t| Instant::now().checked_add(t));
        let mut child = self.spawn(command).map_err(io_err)?;
        let stdout = read_all(child.stdout.take());
        let stderr = read_all(child.stderr.take());

        let status = match wait_until(&mut child, deadline).map_err(io_err)? {
            Some(status) => status,
            None => {
                // The readers are left behind: a grandchild that escaped the
                // kill could still be holding the pipes open
                return Err(RunError::TimedOut {
                    command: command.to_owned(),
                    timeout: self.timeout.map(|t| t.as_secs()).unwrap_or(0),
                });
            }
        };

        let stdout = join_output(stdout).map_err(io_err)?;
        let stderr = join_output(stderr).map_err(io_err)?;
        debug!("'{}' exited with {}", command, status);
        if !status.success() {
            return Err(RunError::Failed {
                command: command.to_owned(),
                status,
                stderr,
            });
        }
        Ok(stdout.lines().map(str::to_owned).collect())
    }
}
