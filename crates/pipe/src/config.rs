//! The run-parameter block sent parent → child at startup.

use std::io::{Read, Write};

use dropforge_protocol::{ModuleParameter, SystemModules};

use crate::codec::{read_string16, read_u16, read_u8, write_string16, write_u16, write_u8};
use crate::PipeError;

/// The full test-run configuration, written as one burst immediately
/// after the child is spawned and read exactly once by the child before
/// anything else.
///
/// Field order and encoding are the wire contract: there is no tagging,
/// so reordering any field is a breaking change. Keep `write_to` and
/// `read_from` in lockstep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunConfig {
    pub log_file_path: String,
    pub data_directory: String,
    pub overlay_directory: String,
    pub config_directory: String,
    pub capture_directory: String,
    pub script_directory: String,
    pub script_version: String,
    pub game_object: String,
    pub vfs_path_config: String,
    pub vfs_path_capture: String,
    /// Game identifier in plain hex.
    pub game_id: String,
    pub window_width: u16,
    pub window_height: u16,
    pub full_screen: bool,
    pub window_title: String,
    pub parameters: Vec<ModuleParameter>,
    pub run_arguments: String,
    pub exclude_patterns: Vec<String>,
    pub required_extensions: Vec<String>,
    pub script_module: String,
    pub script_module_version: String,
    pub modules: SystemModules,
}

impl RunConfig {
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), PipeError> {
        write_string16(writer, &self.log_file_path)?;
        write_string16(writer, &self.data_directory)?;
        write_string16(writer, &self.overlay_directory)?;
        write_string16(writer, &self.config_directory)?;
        write_string16(writer, &self.capture_directory)?;
        write_string16(writer, &self.script_directory)?;
        write_string16(writer, &self.script_version)?;
        write_string16(writer, &self.game_object)?;
        write_string16(writer, &self.vfs_path_config)?;
        write_string16(writer, &self.vfs_path_capture)?;

        write_string16(writer, &self.game_id)?;
        write_u16(writer, self.window_width)?;
        write_u16(writer, self.window_height)?;
        write_u8(writer, self.full_screen as u8)?;
        write_string16(writer, &self.window_title)?;

        write_list_len(writer, self.parameters.len())?;
        for parameter in &self.parameters {
            write_string16(writer, &parameter.module)?;
            write_string16(writer, &parameter.name)?;
            write_string16(writer, &parameter.value)?;
        }

        write_string16(writer, &self.run_arguments)?;

        write_list_len(writer, self.exclude_patterns.len())?;
        for pattern in &self.exclude_patterns {
            write_string16(writer, pattern)?;
        }

        write_list_len(writer, self.required_extensions.len())?;
        for extension in &self.required_extensions {
            write_string16(writer, extension)?;
        }

        write_string16(writer, &self.script_module)?;
        write_string16(writer, &self.script_module_version)?;

        write_string16(writer, &self.modules.graphics)?;
        write_string16(writer, &self.modules.input)?;
        write_string16(writer, &self.modules.physics)?;
        write_string16(writer, &self.modules.animator)?;
        write_string16(writer, &self.modules.ai)?;
        write_string16(writer, &self.modules.crash_recovery)?;
        write_string16(writer, &self.modules.audio)?;
        write_string16(writer, &self.modules.synthesizer)?;
        write_string16(writer, &self.modules.network)?;
        write_string16(writer, &self.modules.vr)?;

        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, PipeError> {
        let log_file_path = read_string16(reader)?;
        let data_directory = read_string16(reader)?;
        let overlay_directory = read_string16(reader)?;
        let config_directory = read_string16(reader)?;
        let capture_directory = read_string16(reader)?;
        let script_directory = read_string16(reader)?;
        let script_version = read_string16(reader)?;
        let game_object = read_string16(reader)?;
        let vfs_path_config = read_string16(reader)?;
        let vfs_path_capture = read_string16(reader)?;

        let game_id = read_string16(reader)?;
        let window_width = read_u16(reader)?;
        let window_height = read_u16(reader)?;
        let full_screen = read_u8(reader)? != 0;
        let window_title = read_string16(reader)?;

        let parameter_count = read_u16(reader)? as usize;
        let mut parameters = Vec::with_capacity(parameter_count);
        for _ in 0..parameter_count {
            parameters.push(ModuleParameter {
                module: read_string16(reader)?,
                name: read_string16(reader)?,
                value: read_string16(reader)?,
            });
        }

        let run_arguments = read_string16(reader)?;

        let pattern_count = read_u16(reader)? as usize;
        let mut exclude_patterns = Vec::with_capacity(pattern_count);
        for _ in 0..pattern_count {
            exclude_patterns.push(read_string16(reader)?);
        }

        let extension_count = read_u16(reader)? as usize;
        let mut required_extensions = Vec::with_capacity(extension_count);
        for _ in 0..extension_count {
            required_extensions.push(read_string16(reader)?);
        }

        let script_module = read_string16(reader)?;
        let script_module_version = read_string16(reader)?;

        let modules = SystemModules {
            graphics: read_string16(reader)?,
            input: read_string16(reader)?,
            physics: read_string16(reader)?,
            animator: read_string16(reader)?,
            ai: read_string16(reader)?,
            crash_recovery: read_string16(reader)?,
            audio: read_string16(reader)?,
            synthesizer: read_string16(reader)?,
            network: read_string16(reader)?,
            vr: read_string16(reader)?,
        };

        Ok(Self {
            log_file_path,
            data_directory,
            overlay_directory,
            config_directory,
            capture_directory,
            script_directory,
            script_version,
            game_object,
            vfs_path_config,
            vfs_path_capture,
            game_id,
            window_width,
            window_height,
            full_screen,
            window_title,
            parameters,
            run_arguments,
            exclude_patterns,
            required_extensions,
            script_module,
            script_module_version,
            modules,
        })
    }
}

fn write_list_len<W: Write>(writer: &mut W, len: usize) -> Result<(), PipeError> {
    if len > u16::MAX as usize {
        return Err(PipeError::ListTooLong(len));
    }
    write_u16(writer, len as u16)
}
