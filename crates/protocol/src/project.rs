use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{DistributionProfile, LaunchProfile};

/// Errors loading or saving a project descriptor.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no profile named '{0}'")]
    UnknownProfile(String),
}

/// The project descriptor: paths, script entry point and the profile sets.
///
/// Stored as JSON in the project directory. `directory` is not part of the
/// file; it is the location the descriptor was loaded from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDescriptor {
    pub name: String,
    /// Project directory on disk. Filled in by [`ProjectDescriptor::load`].
    #[serde(skip)]
    pub directory: PathBuf,
    /// Game data directory, relative to the project directory.
    pub path_data: String,
    /// Cache directory, relative to the project directory.
    pub path_cache: String,
    pub script_module: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub script_module_version: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<DistributionProfile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub launch_profiles: Vec<LaunchProfile>,
}

impl ProjectDescriptor {
    /// Loads a descriptor from `path` and records its parent directory.
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let data = std::fs::read_to_string(path)?;
        let mut descriptor: Self = serde_json::from_str(&data)?;
        descriptor.directory = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(descriptor)
    }

    /// Looks up a distribution profile by name.
    pub fn profile(&self, name: &str) -> Result<&DistributionProfile, ProjectError> {
        self.profiles
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ProjectError::UnknownProfile(name.into()))
    }

    /// Looks up a launch profile by name.
    pub fn launch_profile(&self, name: &str) -> Option<&LaunchProfile> {
        self.launch_profiles.iter().find(|p| p.name == name)
    }

    /// Absolute path of the game data directory.
    pub fn data_dir(&self) -> PathBuf {
        self.directory.join(&self.path_data)
    }

    /// Absolute path of a test-run working directory under the cache
    /// directory, e.g. `overlay`, `config` or `capture`.
    pub fn testrun_dir(&self, kind: &str) -> PathBuf {
        self.directory.join(&self.path_cache).join("testrun").join(kind)
    }

    /// Path of the test-run log file inside the project directory.
    pub fn testrun_log_path(&self) -> PathBuf {
        self.directory.join("testRun.log")
    }
}
