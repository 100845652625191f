//! Process-lifecycle seam between the controller and the OS.
//!
//! `TestRunner` talks to the child only through [`RunnerProcess`], so
//! platform process handling stays out of the lifecycle logic and tests
//! can substitute a scripted process.

use std::io::{Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{Duration, Instant};

use crate::RunnerError;

/// A running test-runner child process.
pub trait RunnerProcess: Send {
    /// Parent → child pipe end, carrying the parameter block and
    /// subsequent command bytes.
    fn command_pipe(&mut self) -> &mut dyn Write;

    /// Child → parent pipe end, carrying result codes.
    fn result_pipe(&mut self) -> &mut dyn Read;

    /// Non-blocking liveness poll. Safe to call every frame.
    fn is_alive(&mut self) -> Result<bool, RunnerError>;

    /// Waits up to `timeout` for the process to exit on its own.
    /// Returns whether it did.
    fn wait(&mut self, timeout: Duration) -> Result<bool, RunnerError>;

    /// Unconditionally terminates the process and reaps it.
    fn terminate(&mut self) -> Result<(), RunnerError>;
}

/// [`RunnerProcess`] backed by a spawned OS child.
///
/// The child's stdin is the command pipe and its stdout the result
/// pipe; stderr is inherited so early startup failures stay visible —
/// once running, the child logs to its own log file.
pub struct ChildProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: ChildStdout,
}

impl ChildProcess {
    /// Spawns `executable` with piped stdin and stdout.
    pub fn spawn(executable: &Path) -> Result<Self, RunnerError> {
        let mut child = Command::new(executable)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                path: executable.display().to_string(),
                source,
            })?;
        // Piped handles are always present on a freshly spawned child.
        let stdin = child.stdin.take().ok_or_else(|| {
            RunnerError::Spawn {
                path: executable.display().to_string(),
                source: std::io::Error::other("child has no stdin handle"),
            }
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            RunnerError::Spawn {
                path: executable.display().to_string(),
                source: std::io::Error::other("child has no stdout handle"),
            }
        })?;
        tracing::info!(pid = child.id(), path = %executable.display(), "test runner spawned");
        Ok(Self {
            child,
            stdin,
            stdout,
        })
    }
}

impl RunnerProcess for ChildProcess {
    fn command_pipe(&mut self) -> &mut dyn Write {
        &mut self.stdin
    }

    fn result_pipe(&mut self) -> &mut dyn Read {
        &mut self.stdout
    }

    fn is_alive(&mut self) -> Result<bool, RunnerError> {
        Ok(self.child.try_wait()?.is_none())
    }

    fn wait(&mut self, timeout: Duration) -> Result<bool, RunnerError> {
        // `Child` offers no native timed wait; poll at a coarse interval.
        let deadline = Instant::now() + timeout;
        loop {
            if self.child.try_wait()?.is_some() {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    fn terminate(&mut self) -> Result<(), RunnerError> {
        match self.child.kill() {
            Ok(()) => {
                self.child.wait()?;
                tracing::info!(pid = self.child.id(), "test runner killed");
                Ok(())
            }
            // Already exited between the poll and the kill.
            Err(err) if err.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
