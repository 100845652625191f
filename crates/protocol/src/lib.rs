//! Shared data model for the Dropforge editors and tools.
//!
//! Distribution profiles describe how a project is packaged into a DELGA
//! archive; launch profiles describe which engine modules and window
//! settings a test-run uses. Both are plain serde types so the CLI, the
//! test-runner and the remote server agree on one schema.

mod launch;
mod profile;
mod project;

pub use launch::{LaunchProfile, ModuleParameter, SystemModules};
pub use profile::{DistributionProfile, WindowSize};
pub use project::{ProjectDescriptor, ProjectError};

/// First path component reserved by the editor itself.
///
/// Anything under this segment is editor-internal and never distributed
/// or synchronized to remote clients.
pub const RESERVED_PATH_SEGMENT: &str = "igde";

/// File extension of the generated game manifest inside a DELGA archive.
pub const MANIFEST_EXTENSION: &str = ".degame";
