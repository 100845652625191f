//! Parent-side test-run controller.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dropforge_pipe::{Command, ResultCode, RunConfig};
use dropforge_protocol::{DistributionProfile, LaunchProfile, ProjectDescriptor};

use crate::process::{ChildProcess, RunnerProcess};
use crate::{build_run_config, last_lines, LogTail, RunnerError};

/// Grace period `stop` waits for the child to exit after `Quit`.
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Manages one test-run child process from the editor's side.
///
/// Lifecycle: [`start`](TestRunner::start) spawns the child and sends
/// the parameter block, the editor then polls
/// [`is_running`](TestRunner::is_running) and
/// [`read_new_log`](TestRunner::read_new_log) every frame, and ends the
/// run with [`stop`](TestRunner::stop) or [`kill`](TestRunner::kill).
pub struct TestRunner {
    executable: PathBuf,
    process: Option<Box<dyn RunnerProcess>>,
    log: Option<LogTail>,
}

impl TestRunner {
    /// Controller for the runner executable at `executable`.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            process: None,
            log: None,
        }
    }

    /// Starts a test run. No-op if one is already running.
    ///
    /// Creates the run working directories, truncates the log file,
    /// spawns the child and sends it the parameter block. A failure
    /// after the spawn terminates the child before returning.
    pub fn start(
        &mut self,
        project: &ProjectDescriptor,
        profile: &DistributionProfile,
        launch: Option<&LaunchProfile>,
    ) -> Result<(), RunnerError> {
        if self.is_running() {
            tracing::debug!("test run already active");
            return Ok(());
        }

        let config = build_run_config(project, profile, launch);
        for kind in ["overlay", "config", "capture"] {
            std::fs::create_dir_all(project.testrun_dir(kind))?;
        }

        let process = Box::new(ChildProcess::spawn(&self.executable)?);
        self.begin_run(process, &config)
    }

    /// Second half of `start`: log preparation and parameter handshake.
    fn begin_run(
        &mut self,
        mut process: Box<dyn RunnerProcess>,
        config: &RunConfig,
    ) -> Result<(), RunnerError> {
        // The log is truncated and tailed from zero before the child
        // gets its parameters, so everything the run writes is captured.
        File::create(&config.log_file_path)?;
        let tail = LogTail::new(&config.log_file_path);

        if let Err(err) = handshake(process.as_mut(), config) {
            tracing::error!(error = %err, "parameter handshake failed, terminating child");
            let _ = process.terminate();
            return Err(err);
        }

        tracing::info!(game_id = %config.game_id, "test run started");
        self.process = Some(process);
        self.log = Some(tail);
        Ok(())
    }

    /// Non-blocking liveness poll. An exited child clears the process
    /// handle so a subsequent `start` is allowed; the log tail stays for
    /// inspection.
    pub fn is_running(&mut self) -> bool {
        let Some(process) = self.process.as_mut() else {
            return false;
        };
        match process.is_alive() {
            Ok(true) => true,
            Ok(false) => {
                tracing::info!("test runner exited");
                self.process = None;
                false
            }
            Err(err) => {
                tracing::warn!(error = %err, "liveness poll failed, dropping process handle");
                self.process = None;
                false
            }
        }
    }

    /// Requests graceful shutdown and waits a bounded grace period.
    ///
    /// Reports success even if the child has not exited yet; a child
    /// that outlives the grace period keeps its handle so [`kill`] can
    /// still reach it. A failure sending `Quit` falls back to [`kill`]
    /// (whose errors do propagate). No-op when not running.
    ///
    /// [`kill`]: TestRunner::kill
    pub fn stop(&mut self) -> Result<(), RunnerError> {
        let Some(mut process) = self.process.take() else {
            return Ok(());
        };

        let quit = Command::Quit
            .write_to(&mut process.command_pipe())
            .map_err(RunnerError::from)
            .and_then(|()| process.command_pipe().flush().map_err(RunnerError::from));
        if let Err(err) = quit {
            tracing::warn!(error = %err, "quit request failed, killing test runner");
            process.terminate()?;
            return Ok(());
        }

        if process.wait(STOP_GRACE)? {
            // Dropping the handle closes the command pipe.
            return Ok(());
        }
        tracing::warn!("test runner still running after grace period");
        self.process = Some(process);
        Ok(())
    }

    /// Unconditionally terminates the child. Idempotent.
    pub fn kill(&mut self) -> Result<(), RunnerError> {
        let Some(mut process) = self.process.take() else {
            return Ok(());
        };
        process.terminate()
    }

    /// Log bytes appended since the previous poll.
    pub fn read_new_log(&mut self) -> std::io::Result<String> {
        match self.log.as_mut() {
            Some(tail) => tail.read_new(),
            None => Ok(String::new()),
        }
    }

    /// The tail end of the current run's log file.
    pub fn last_log_lines(&self, max_lines: usize) -> std::io::Result<String> {
        match self.log.as_ref() {
            Some(tail) => last_lines(tail.path(), max_lines),
            None => Ok(String::new()),
        }
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log.as_ref().map(LogTail::path)
    }
}

/// Sends the parameter block and waits for the child's startup
/// acknowledgment on the result pipe.
fn handshake(process: &mut dyn RunnerProcess, config: &RunConfig) -> Result<(), RunnerError> {
    let mut pipe = process.command_pipe();
    config.write_to(&mut pipe)?;
    pipe.flush()?;
    match ResultCode::read_from(&mut process.result_pipe())? {
        ResultCode::Success => Ok(()),
        ResultCode::Failed => Err(RunnerError::Engine(
            "test runner reported startup failure".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read, Write};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedPipe {
        data: Arc<Mutex<Vec<u8>>>,
        broken: Arc<AtomicBool>,
    }

    impl Write for SharedPipe {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
            }
            self.data.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct FakeProcess {
        pipe: SharedPipe,
        /// Startup acknowledgment the parent reads during the handshake.
        results: Cursor<Vec<u8>>,
        alive: Arc<AtomicBool>,
        terminations: Arc<AtomicUsize>,
        /// A stubborn child ignores `Quit` and outlives the grace period.
        stubborn: bool,
    }

    impl FakeProcess {
        fn new() -> (Self, SharedPipe, Arc<AtomicBool>, Arc<AtomicUsize>) {
            let pipe = SharedPipe::default();
            let alive = Arc::new(AtomicBool::new(true));
            let terminations = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    pipe: pipe.clone(),
                    results: Cursor::new(vec![0]),
                    alive: Arc::clone(&alive),
                    terminations: Arc::clone(&terminations),
                    stubborn: false,
                },
                pipe,
                alive,
                terminations,
            )
        }
    }

    impl RunnerProcess for FakeProcess {
        fn command_pipe(&mut self) -> &mut dyn Write {
            &mut self.pipe
        }

        fn result_pipe(&mut self) -> &mut dyn Read {
            &mut self.results
        }

        fn is_alive(&mut self) -> Result<bool, RunnerError> {
            Ok(self.alive.load(Ordering::SeqCst))
        }

        fn wait(&mut self, _timeout: Duration) -> Result<bool, RunnerError> {
            if self.stubborn {
                return Ok(false);
            }
            self.alive.store(false, Ordering::SeqCst);
            Ok(true)
        }

        fn terminate(&mut self) -> Result<(), RunnerError> {
            self.alive.store(false, Ordering::SeqCst);
            self.terminations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn config(dir: &Path) -> RunConfig {
        RunConfig {
            log_file_path: dir.join("testRun.log").display().to_string(),
            game_id: "ab".repeat(16),
            window_title: "Test Run: Example".into(),
            full_screen: true,
            ..RunConfig::default()
        }
    }

    #[test]
    fn handshake_sends_full_config_block() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let (process, pipe, _, _) = FakeProcess::new();

        let mut runner = TestRunner::new("/nonexistent/testrunner");
        runner.begin_run(Box::new(process), &config).unwrap();
        assert!(runner.is_running());

        let sent = pipe.data.lock().unwrap().clone();
        let decoded = RunConfig::read_from(&mut &sent[..]).unwrap();
        assert_eq!(decoded, config);
        // Log file was truncated into existence before the handshake.
        assert!(dir.path().join("testRun.log").exists());
    }

    #[test]
    fn stop_sends_quit_and_reports_success() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let (process, pipe, _, terminations) = FakeProcess::new();

        let mut runner = TestRunner::new("/nonexistent/testrunner");
        runner.begin_run(Box::new(process), &config).unwrap();
        let handshake_len = pipe.data.lock().unwrap().len();

        runner.stop().unwrap();
        let sent = pipe.data.lock().unwrap().clone();
        assert_eq!(&sent[handshake_len..], [0]);
        assert_eq!(terminations.load(Ordering::SeqCst), 0);
        assert!(!runner.is_running());

        // Stopped already: no-op.
        runner.stop().unwrap();
        assert_eq!(pipe.data.lock().unwrap().len(), sent.len());
    }

    #[test]
    fn timed_out_stop_keeps_the_handle_for_kill() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let (mut process, _, alive, terminations) = FakeProcess::new();
        process.stubborn = true;

        let mut runner = TestRunner::new("/nonexistent/testrunner");
        runner.begin_run(Box::new(process), &config).unwrap();

        // The child ignores Quit; stop still succeeds, but the process
        // must stay reachable.
        runner.stop().unwrap();
        assert!(alive.load(Ordering::SeqCst));
        assert!(runner.is_running());

        runner.kill().unwrap();
        assert_eq!(terminations.load(Ordering::SeqCst), 1);
        assert!(!runner.is_running());
    }

    #[test]
    fn stop_falls_back_to_kill_on_pipe_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let (process, pipe, _, terminations) = FakeProcess::new();

        let mut runner = TestRunner::new("/nonexistent/testrunner");
        runner.begin_run(Box::new(process), &config).unwrap();

        pipe.broken.store(true, Ordering::SeqCst);
        runner.stop().unwrap();
        assert_eq!(terminations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn kill_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let (process, _, _, terminations) = FakeProcess::new();

        let mut runner = TestRunner::new("/nonexistent/testrunner");
        runner.begin_run(Box::new(process), &config).unwrap();

        runner.kill().unwrap();
        runner.kill().unwrap();
        assert_eq!(terminations.load(Ordering::SeqCst), 1);
        assert!(!runner.is_running());
    }

    #[test]
    fn exited_child_clears_the_handle() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let (process, _, alive, _) = FakeProcess::new();

        let mut runner = TestRunner::new("/nonexistent/testrunner");
        runner.begin_run(Box::new(process), &config).unwrap();
        assert!(runner.is_running());

        alive.store(false, Ordering::SeqCst);
        assert!(!runner.is_running());

        // A fresh run may now begin.
        let (process, _, _, _) = FakeProcess::new();
        runner.begin_run(Box::new(process), &config).unwrap();
        assert!(runner.is_running());
    }

    #[test]
    fn failed_handshake_terminates_the_child() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let (process, pipe, _, terminations) = FakeProcess::new();
        pipe.broken.store(true, Ordering::SeqCst);

        let mut runner = TestRunner::new("/nonexistent/testrunner");
        let err = runner.begin_run(Box::new(process), &config).unwrap_err();
        assert!(matches!(err, RunnerError::Pipe(_)));
        assert_eq!(terminations.load(Ordering::SeqCst), 1);
        assert!(!runner.is_running());
    }

    #[test]
    fn failed_startup_ack_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let (mut process, _, _, terminations) = FakeProcess::new();
        process.results = Cursor::new(vec![1]);

        let mut runner = TestRunner::new("/nonexistent/testrunner");
        let err = runner.begin_run(Box::new(process), &config).unwrap_err();
        assert!(matches!(err, RunnerError::Engine(_)));
        assert_eq!(terminations.load(Ordering::SeqCst), 1);
        assert!(!runner.is_running());
    }

    #[test]
    fn log_polling_follows_the_run_log() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let (process, _, _, _) = FakeProcess::new();

        let mut runner = TestRunner::new("/nonexistent/testrunner");
        runner.begin_run(Box::new(process), &config).unwrap();
        assert_eq!(runner.read_new_log().unwrap(), "");

        std::fs::write(&config.log_file_path, "engine up\n").unwrap();
        assert_eq!(runner.read_new_log().unwrap(), "engine up\n");
        assert_eq!(runner.last_log_lines(10).unwrap(), "engine up\n");
    }
}
