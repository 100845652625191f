//! Child-side engine host.
//!
//! The child process reads its [`RunConfig`] once at startup, starts the
//! engine and acknowledges the startup on the result pipe, then lets a
//! dedicated thread block on the command pipe while the engine loop
//! runs. `Quit` flips a shared flag the engine loop polls; after quit is
//! requested the thread stops reading for the rest of the run.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dropforge_pipe::{Command, PipeError, ResultCode, RunConfig};

use crate::RunnerError;

/// Cooperative shutdown signal shared between the command thread and
/// the engine loop. Requesting quit only flips a flag, so it is safe
/// from any thread.
#[derive(Debug, Clone, Default)]
pub struct QuitFlag(Arc<AtomicBool>);

impl QuitFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One hosted game-engine instance.
pub trait Engine {
    /// Brings the engine up with the received run configuration.
    fn start(&mut self, config: &RunConfig) -> Result<(), RunnerError>;

    /// Runs the game until `quit` is requested or the game ends itself.
    fn run(&mut self, quit: &QuitFlag) -> Result<(), RunnerError>;

    /// Tears the engine down. Called exactly once after `run` returns,
    /// whether it succeeded or not.
    fn stop(&mut self) -> Result<(), RunnerError>;
}

/// Drives one complete run: start, startup acknowledgment, command
/// thread, engine loop, stop.
///
/// Errors out of the engine loop are logged and swallowed so the engine
/// is always stopped; only `start` and `stop` failures propagate. The
/// command thread is left detached — if the engine exits on its own the
/// thread stays blocked on the pipe until the process ends.
pub fn run<E, R, W>(
    engine: &mut E,
    config: &RunConfig,
    commands: R,
    results: &mut W,
) -> Result<(), RunnerError>
where
    E: Engine,
    R: Read + Send + 'static,
    W: Write,
{
    if let Err(err) = engine.start(config) {
        // Best effort; the parent may already be gone.
        let _ = ResultCode::Failed.write_to(results);
        let _ = results.flush();
        return Err(err);
    }
    ResultCode::Success.write_to(results)?;
    results.flush()?;
    tracing::info!(game_id = %config.game_id, "engine started");

    let quit = QuitFlag::new();
    let abort = Arc::new(AtomicBool::new(false));
    {
        let quit = quit.clone();
        let abort = Arc::clone(&abort);
        std::thread::spawn(move || command_loop(commands, quit, abort));
    }

    if let Err(err) = engine.run(&quit) {
        tracing::error!(error = %err, "engine run failed");
    }

    abort.store(true, Ordering::SeqCst);
    engine.stop()?;
    tracing::info!("engine stopped");
    Ok(())
}

/// Blocking command reader. Stops after `Quit`; read failures once the
/// host is tearing down are expected and swallowed.
fn command_loop<R: Read>(mut commands: R, quit: QuitFlag, abort: Arc<AtomicBool>) {
    loop {
        match Command::read_from(&mut commands) {
            Ok(Command::Quit) => {
                tracing::info!("quit requested");
                quit.request();
                break;
            }
            Err(PipeError::UnknownCommand(code)) => {
                tracing::warn!(code, "unknown command ignored");
            }
            Err(err) => {
                if abort.load(Ordering::SeqCst) {
                    tracing::debug!(error = %err, "command pipe closed during teardown");
                } else {
                    // Parent gone; treat as a quit request.
                    tracing::warn!(error = %err, "command pipe failed, quitting");
                    quit.request();
                }
                break;
            }
        }
    }
}
