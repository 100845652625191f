//! Test-runner process lifecycle.
//!
//! The editor side spawns a sibling child executable hosting one
//! isolated game-engine instance, sends it the run configuration over a
//! pipe ([`dropforge_pipe`]) and from then on only polls: process alive,
//! newly appended log bytes, quit on request. The child side lives here
//! too ([`host`]): it reads the configuration once at startup and drives
//! the engine until quit is requested.

mod error;
pub mod host;
mod log;
mod params;
mod process;
mod runner;

pub use error::RunnerError;
pub use log::{last_lines, LogTail, DEFAULT_LAST_LINES};
pub use params::build_run_config;
pub use process::{ChildProcess, RunnerProcess};
pub use runner::TestRunner;
