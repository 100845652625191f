use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::MANIFEST_EXTENSION;

/// Initial window size of a distributed game.
///
/// `0x0` means "not set" — the launcher decides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: u16,
    pub height: u16,
}

impl WindowSize {
    pub fn is_set(&self) -> bool {
        self.width != 0 || self.height != 0
    }
}

/// A distribution profile: identity, packaging rules and run settings
/// for one published variant of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionProfile {
    pub name: String,
    pub identifier: Uuid,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alias_identifier: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub creator: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub website: String,
    /// VFS paths of icon images, embedded into the manifest with their
    /// pixel width as size attribute.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub icons: Vec<String>,
    #[serde(default)]
    pub window_size: WindowSize,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub script_directory: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub game_object: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path_config: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path_capture: String,
    /// Glob-style patterns matched against full unix paths; matches are
    /// excluded from distribution and remote synchronization.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_patterns: Vec<String>,
    /// Resource format extensions (with leading dot) the game requires
    /// even if no scanned file uses them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_extensions: Vec<String>,
    /// Target archive path relative to the project directory.
    pub delga_path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub run_arguments: String,
}

impl DistributionProfile {
    /// Returns a profile with a fresh identifier and everything else empty.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: Uuid::new_v4(),
            alias_identifier: String::new(),
            title: String::new(),
            description: String::new(),
            creator: String::new(),
            website: String::new(),
            icons: Vec::new(),
            window_size: WindowSize::default(),
            script_directory: String::new(),
            game_object: String::new(),
            path_config: String::new(),
            path_capture: String::new(),
            exclude_patterns: Vec::new(),
            required_extensions: Vec::new(),
            delga_path: String::new(),
            run_arguments: String::new(),
        }
    }

    /// Identifier in plain lowercase hex, no separators.
    pub fn identifier_hex(&self) -> String {
        hex::encode(self.identifier.as_bytes())
    }

    /// Name of the game manifest entry inside the archive:
    /// `<alias>.degame`, falling back to the hex identifier.
    pub fn manifest_entry_name(&self) -> String {
        if self.alias_identifier.is_empty() {
            format!("{}{MANIFEST_EXTENSION}", self.identifier_hex())
        } else {
            format!("{}{MANIFEST_EXTENSION}", self.alias_identifier)
        }
    }
}
