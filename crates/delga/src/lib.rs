//! DELGA archive builder.
//!
//! A DELGA is a zip-format container holding every non-excluded project
//! file plus one generated XML game manifest. The build is driven by a
//! resumable task: callers poll [`DistributeTask::step`] once per UI
//! frame and each call performs one bounded unit of work, so the event
//! loop stays responsive without threads.

mod error;
mod manifest;
mod modules;
mod task;
mod writer;

pub use error::DelgaError;
pub use manifest::write_manifest;
pub use modules::{ContentModule, ModuleKind, ModuleRegistry};
pub use task::{BuildState, DistributeTask};
pub use writer::CountingWriter;
