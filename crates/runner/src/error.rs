//! Runner error types.

use dropforge_pipe::PipeError;

/// Errors from test-runner lifecycle management and the engine host.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Pipe(#[from] PipeError),

    #[error("failed spawning test runner '{path}': {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("engine error: {0}")]
    Engine(String),
}
