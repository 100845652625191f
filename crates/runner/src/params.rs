//! Effective run-parameter computation.
//!
//! Merges distribution-profile overrides over launcher-profile defaults
//! into the wire configuration block. Profile values win when non-zero
//! or non-empty; a non-zero profile window size forces windowed mode.

use dropforge_pipe::RunConfig;
use dropforge_protocol::{DistributionProfile, LaunchProfile, ProjectDescriptor};

/// Builds the configuration block sent to the child process.
///
/// Without a launch profile the engine picks default modules and runs
/// fullscreen. The launch profile's arguments extend the distribution
/// profile's unless its replace flag is set, in which case they stand
/// alone.
pub fn build_run_config(
    project: &ProjectDescriptor,
    profile: &DistributionProfile,
    launch: Option<&LaunchProfile>,
) -> RunConfig {
    let mut width = launch.map(|l| l.width).unwrap_or(0);
    let mut height = launch.map(|l| l.height).unwrap_or(0);
    let mut full_screen = launch.map(|l| l.full_screen).unwrap_or(true);

    if profile.window_size.width != 0 {
        width = profile.window_size.width;
    }
    if profile.window_size.height != 0 {
        height = profile.window_size.height;
    }
    if profile.window_size.is_set() {
        full_screen = false;
    }

    let run_arguments = match launch {
        Some(l) if l.replace_run_arguments => l.run_arguments.clone(),
        Some(l) => join_arguments(&profile.run_arguments, &l.run_arguments),
        None => profile.run_arguments.clone(),
    };

    RunConfig {
        log_file_path: project.testrun_log_path().display().to_string(),
        data_directory: project.data_dir().display().to_string(),
        overlay_directory: project.testrun_dir("overlay").display().to_string(),
        config_directory: project.testrun_dir("config").display().to_string(),
        capture_directory: project.testrun_dir("capture").display().to_string(),
        script_directory: profile.script_directory.clone(),
        script_version: project.script_module_version.clone(),
        game_object: profile.game_object.clone(),
        vfs_path_config: profile.path_config.clone(),
        vfs_path_capture: profile.path_capture.clone(),
        game_id: profile.identifier_hex(),
        window_width: width,
        window_height: height,
        full_screen,
        window_title: format!("Test Run: {}", project.name),
        parameters: launch.map(|l| l.parameters.clone()).unwrap_or_default(),
        run_arguments,
        exclude_patterns: profile.exclude_patterns.clone(),
        required_extensions: profile.required_extensions.clone(),
        script_module: project.script_module.clone(),
        script_module_version: project.script_module_version.clone(),
        modules: launch.map(|l| l.modules.clone()).unwrap_or_default(),
    }
}

fn join_arguments(base: &str, extra: &str) -> String {
    if base.is_empty() {
        extra.to_owned()
    } else if extra.is_empty() {
        base.to_owned()
    } else {
        format!("{base} {extra}")
    }
}
