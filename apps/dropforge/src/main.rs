//! Headless project CLI.
//!
//! `dropforge distribute --profile <name>` builds the DELGA archive for
//! one distribution profile; `dropforge profiles list` prints the
//! profiles a project defines.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dropforge_delga::{DistributeTask, ModuleRegistry};
use dropforge_protocol::ProjectDescriptor;
use dropforge_vfs::DiskVfs;

#[derive(Parser)]
#[command(name = "dropforge", about = "Game project distribution tool")]
struct Cli {
    /// Project descriptor file.
    #[arg(long, default_value = "project.dfproj")]
    project: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the distribution archive for one profile.
    Distribute {
        /// Distribution profile name.
        #[arg(long)]
        profile: String,
    },
    /// Inspect distribution profiles.
    Profiles {
        #[command(subcommand)]
        command: ProfilesCommand,
    },
}

#[derive(Subcommand)]
enum ProfilesCommand {
    /// Print the names of all distribution profiles.
    List,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let project = ProjectDescriptor::load(&cli.project)
        .with_context(|| format!("loading project {}", cli.project.display()))?;

    match cli.command {
        Command::Distribute { profile } => distribute(&project, &profile),
        Command::Profiles {
            command: ProfilesCommand::List,
        } => {
            for profile in &project.profiles {
                println!("{}", profile.name);
            }
            Ok(())
        }
    }
}

fn distribute(project: &ProjectDescriptor, profile_name: &str) -> anyhow::Result<()> {
    let profile = project.profile(profile_name)?;
    let vfs = Arc::new(DiskVfs::new(project.data_dir()));
    let mut task = DistributeTask::new(
        vfs,
        project,
        profile,
        Vec::new(),
        ModuleRegistry::engine_default(),
    );

    loop {
        match task.step() {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => {
                eprintln!("{err}");
                eprintln!("Distribution Failed!");
                anyhow::bail!("distribution of profile '{profile_name}' failed");
            }
        }
    }

    println!(
        "Wrote {} ({} files, {} directories, {} bytes)",
        task.delga_path().display(),
        task.file_count(),
        task.directory_count(),
        task.archive_size(),
    );
    Ok(())
}
