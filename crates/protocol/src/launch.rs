use serde::{Deserialize, Serialize};

/// A single engine-module parameter override: `(module, name, value)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleParameter {
    pub module: String,
    pub name: String,
    pub value: String,
}

/// Engine subsystem module selections.
///
/// Empty strings mean "engine default". Field order matches the wire
/// order of the run-parameter block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemModules {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub graphics: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub input: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub physics: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub animator: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ai: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub crash_recovery: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub audio: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub synthesizer: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub vr: String,
}

/// A launcher profile: module selections, window settings and run
/// arguments used to configure a test-run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchProfile {
    pub name: String,
    #[serde(default)]
    pub modules: SystemModules,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ModuleParameter>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub run_arguments: String,
    /// If set, the profile's run arguments replace instead of extend the
    /// base arguments.
    #[serde(default)]
    pub replace_run_arguments: bool,
    #[serde(default)]
    pub width: u16,
    #[serde(default)]
    pub height: u16,
    #[serde(default = "default_true")]
    pub full_screen: bool,
}

fn default_true() -> bool {
    true
}

impl LaunchProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modules: SystemModules::default(),
            parameters: Vec::new(),
            run_arguments: String::new(),
            replace_run_arguments: false,
            width: 0,
            height: 0,
            full_screen: true,
        }
    }
}
