//! Child test-runner executable.
//!
//! Spawned by the editor with its stdin wired to the command pipe and
//! its stdout to the result pipe. The process reads the full run
//! configuration first, then opens the log file the parent tails and
//! runs the engine host loop until `Quit` arrives or the game ends
//! itself.

use std::time::Duration;

use anyhow::Context;

use dropforge_pipe::RunConfig;
use dropforge_runner::host::{self, Engine, QuitFlag};
use dropforge_runner::RunnerError;

/// Engine integration point.
///
/// The real engine is loaded through the [`Engine`] seam; this binary
/// ships a placeholder that idles until quit so the process contract
/// (handshake, log file, command channel) is testable end to end.
struct IdleEngine;

impl Engine for IdleEngine {
    fn start(&mut self, config: &RunConfig) -> Result<(), RunnerError> {
        tracing::info!(
            game_id = %config.game_id,
            data = %config.data_directory,
            title = %config.window_title,
            "engine starting"
        );
        Ok(())
    }

    fn run(&mut self, quit: &QuitFlag) -> Result<(), RunnerError> {
        while !quit.is_requested() {
            std::thread::sleep(Duration::from_millis(50));
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RunnerError> {
        tracing::info!("engine stopping");
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    // The parameter block comes first on stdin; everything after it is
    // the command channel.
    let config = {
        let stdin = std::io::stdin();
        RunConfig::read_from(&mut stdin.lock()).context("reading run configuration")?
    };

    // Diagnostics go to the log file the parent tails.
    let log = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file_path)
        .with_context(|| format!("opening log file {}", config.log_file_path))?;
    tracing_subscriber::fmt()
        .with_writer(std::sync::Mutex::new(log))
        .with_ansi(false)
        .init();

    tracing::info!(game_id = %config.game_id, "test runner up");
    host::run(
        &mut IdleEngine,
        &config,
        std::io::stdin(),
        &mut std::io::stdout(),
    )
    .context("hosting engine")?;
    Ok(())
}
