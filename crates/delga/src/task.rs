//! Step-driven DELGA build task.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Datelike, Timelike};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use dropforge_protocol::{DistributionProfile, ProjectDescriptor};
use dropforge_vfs::{path, DirectoryScanner, ExcludeFilter, ScanProgress, Vfs};

use crate::{write_manifest, CountingWriter, DelgaError, ModuleRegistry};

/// Phase of a [`DistributeTask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    /// Nothing done yet; the first step opens the archive and seeds the scan.
    Initial,
    /// Scanning the data tree and writing entries.
    ProcessingFiles,
    /// Completed, successfully or not. Stepping is a no-op from here.
    Finished,
}

/// Builds one DELGA archive for a distribution profile.
///
/// Each [`step`](DistributeTask::step) call performs one bounded unit of
/// work and reports whether more remain. The first error moves the task
/// to [`BuildState::Finished`] and is returned to the caller; the
/// partially written archive is left on disk.
pub struct DistributeTask {
    vfs: Arc<dyn Vfs>,
    profile: DistributionProfile,
    script_module: String,
    script_module_version: String,
    base_gamedef_paths: Vec<String>,
    registry: ModuleRegistry,
    delga_path: PathBuf,

    state: BuildState,
    scanner: Option<DirectoryScanner>,
    zip: Option<ZipWriter<CountingWriter<File>>>,
    archive_size: Arc<AtomicU64>,

    file_count: u64,
    directory_count: u64,
    used_extensions: BTreeSet<String>,
    message: String,
}

impl DistributeTask {
    /// Prepares a build of `profile` from the project's data directory.
    ///
    /// `vfs` must be rooted at the data directory. The archive is written
    /// to the profile's `delga_path` resolved against the project
    /// directory. Nothing touches the disk until the first step.
    pub fn new(
        vfs: Arc<dyn Vfs>,
        project: &ProjectDescriptor,
        profile: &DistributionProfile,
        base_gamedef_paths: Vec<String>,
        registry: ModuleRegistry,
    ) -> Self {
        Self {
            vfs,
            profile: profile.clone(),
            script_module: project.script_module.clone(),
            script_module_version: project.script_module_version.clone(),
            base_gamedef_paths,
            registry,
            delga_path: project.directory.join(&profile.delga_path),
            state: BuildState::Initial,
            scanner: None,
            zip: None,
            archive_size: Arc::new(AtomicU64::new(0)),
            file_count: 0,
            directory_count: 0,
            used_extensions: BTreeSet::new(),
            message: String::new(),
        }
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Files written so far.
    pub fn file_count(&self) -> u64 {
        self.file_count
    }

    /// Directories that contributed at least one file.
    pub fn directory_count(&self) -> u64 {
        self.directory_count
    }

    /// Bytes written to the archive so far. Monotonic.
    pub fn archive_size(&self) -> u64 {
        self.archive_size.load(Ordering::Relaxed)
    }

    /// Human-readable description of the current activity.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Resolved output path of the archive.
    pub fn delga_path(&self) -> &std::path::Path {
        &self.delga_path
    }

    /// Performs one unit of work. Returns `true` while more remain.
    ///
    /// On error the task moves to [`BuildState::Finished`]; subsequent
    /// calls return `Ok(false)`.
    pub fn step(&mut self) -> Result<bool, DelgaError> {
        match self.advance() {
            Ok(more) => Ok(more),
            Err(err) => {
                tracing::error!(error = %err, "distribution failed");
                self.message = format!("Failed: {err}");
                self.state = BuildState::Finished;
                self.zip = None;
                self.scanner = None;
                Err(err)
            }
        }
    }

    fn advance(&mut self) -> Result<bool, DelgaError> {
        match self.state {
            BuildState::Initial => {
                self.begin()?;
                self.state = BuildState::ProcessingFiles;
                Ok(true)
            }
            BuildState::ProcessingFiles => {
                let scanner = self.scanner.as_mut().ok_or(DelgaError::Finished)?;
                match scanner.step()? {
                    ScanProgress::File {
                        path,
                        first_in_directory,
                    } => {
                        if first_in_directory {
                            self.directory_count += 1;
                        }
                        self.add_file(&path)?;
                        Ok(true)
                    }
                    ScanProgress::ExcludedFile { .. }
                    | ScanProgress::EnteredDirectory { .. }
                    | ScanProgress::SkippedDirectory { .. }
                    | ScanProgress::LeftDirectory { .. } => Ok(true),
                    ScanProgress::Done => {
                        self.finish()?;
                        self.state = BuildState::Finished;
                        Ok(true)
                    }
                }
            }
            BuildState::Finished => Ok(false),
        }
    }

    /// Creates the output archive and seeds the scan.
    fn begin(&mut self) -> Result<(), DelgaError> {
        self.message = "Preparing archive".into();
        tracing::info!(
            profile = %self.profile.name,
            path = %self.delga_path.display(),
            "building distribution archive"
        );

        if let Some(parent) = self.delga_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let writer = CountingWriter::new(File::create(&self.delga_path)?);
        self.archive_size = writer.size_handle();
        self.zip = Some(ZipWriter::new(writer));

        let filter =
            ExcludeFilter::new(&self.base_gamedef_paths, &self.profile.exclude_patterns)?;
        let mut scanner = DirectoryScanner::new(Arc::clone(&self.vfs), filter);
        scanner.begin()?;
        self.scanner = Some(scanner);
        Ok(())
    }

    /// Writes one scanned file into the archive.
    fn add_file(&mut self, file: &str) -> Result<(), DelgaError> {
        self.message = format!("Adding {file}");

        let method = match path::extension(file) {
            Some(extension) => {
                let extension = extension.to_ascii_lowercase();
                let method = match self.registry.find_matching(&extension) {
                    Some(module) if module.no_compress => CompressionMethod::Stored,
                    _ => CompressionMethod::Deflated,
                };
                self.used_extensions.insert(extension);
                method
            }
            None => CompressionMethod::Deflated,
        };

        let options = SimpleFileOptions::default()
            .compression_method(method)
            .last_modified_time(self.entry_time(file)?);

        // Zip entry names have no leading separator.
        let entry_name = file.trim_start_matches('/');
        let zip = self.zip.as_mut().ok_or(DelgaError::Finished)?;
        zip.start_file(entry_name, options)?;
        std::io::copy(&mut self.vfs.open(file)?, zip)?;
        self.file_count += 1;
        Ok(())
    }

    fn entry_time(&self, file: &str) -> Result<zip::DateTime, DelgaError> {
        let modified = self.vfs.modified(file)?;
        // Out-of-range timestamps fall back to the zip epoch.
        Ok(zip::DateTime::from_date_and_time(
            modified.year().clamp(1980, 2107) as u16,
            modified.month() as u8,
            modified.day() as u8,
            modified.hour() as u8,
            modified.minute() as u8,
            modified.second().min(58) as u8,
        )
        .unwrap_or_default())
    }

    /// Writes the game manifest as the final entry and closes the archive.
    fn finish(&mut self) -> Result<(), DelgaError> {
        self.message = "Writing game manifest".into();

        let mut formats = self.used_extensions.clone();
        for extension in &self.profile.required_extensions {
            formats.insert(extension.to_ascii_lowercase());
        }
        let manifest = write_manifest(
            self.vfs.as_ref(),
            &self.profile,
            &self.script_module,
            &self.script_module_version,
            &formats,
            &self.registry,
        )?;

        let mut zip = self.zip.take().ok_or(DelgaError::Finished)?;
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(self.profile.manifest_entry_name(), options)?;
        zip.write_all(&manifest)?;
        zip.finish()?;
        self.scanner = None;

        self.message = "Finished".into();
        tracing::info!(
            files = self.file_count,
            directories = self.directory_count,
            bytes = self.archive_size(),
            "distribution archive complete"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use dropforge_vfs::{MemoryVfs, VfsError};
    use std::io::Read;

    fn project(directory: &std::path::Path) -> ProjectDescriptor {
        ProjectDescriptor {
            name: "Example".into(),
            directory: directory.to_path_buf(),
            path_data: "data".into(),
            path_cache: "cache".into(),
            script_module: "DragonScript".into(),
            script_module_version: "1.24".into(),
            profiles: Vec::new(),
            launch_profiles: Vec::new(),
        }
    }

    fn profile() -> DistributionProfile {
        let mut profile = DistributionProfile::new("release");
        profile.alias_identifier = "example".into();
        profile.title = "Example".into();
        profile.delga_path = "dist/example.delga".into();
        profile.exclude_patterns = vec!["*.tmp".into()];
        profile
    }

    fn sample_vfs() -> MemoryVfs {
        let mut vfs = MemoryVfs::new();
        vfs.add_file("/model.demodel", b"model data".to_vec());
        vfs.add_file("/textures/stone.png", b"not a real png".to_vec());
        vfs.add_file("/scratch.tmp", b"junk".to_vec());
        vfs.add_file("/igde/editor.cfg", b"editor only".to_vec());
        vfs
    }

    fn run_to_completion(task: &mut DistributeTask) {
        while task.step().unwrap() {}
    }

    #[test]
    fn builds_archive_with_manifest_last() {
        let dir = tempfile::tempdir().unwrap();
        let mut task = DistributeTask::new(
            Arc::new(sample_vfs()),
            &project(dir.path()),
            &profile(),
            Vec::new(),
            ModuleRegistry::engine_default(),
        );
        run_to_completion(&mut task);

        assert_eq!(task.state(), BuildState::Finished);
        assert_eq!(task.file_count(), 2);
        assert_eq!(task.directory_count(), 2);
        assert!(task.archive_size() > 0);

        let file = File::open(dir.path().join("dist/example.delga")).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_owned())
            .collect();
        // Entry names carry no leading slash; the manifest comes last.
        assert_eq!(
            names,
            vec!["model.demodel", "textures/stone.png", "example.degame"]
        );

        let mut manifest = String::new();
        archive
            .by_name("example.degame")
            .unwrap()
            .read_to_string(&mut manifest)
            .unwrap();
        assert!(manifest.contains(r#"<requireFormat type="Model">.demodel</requireFormat>"#));
        assert!(manifest.contains(r#"<requireFormat type="Image">.png</requireFormat>"#));
    }

    #[test]
    fn excluded_content_never_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut task = DistributeTask::new(
            Arc::new(sample_vfs()),
            &project(dir.path()),
            &profile(),
            Vec::new(),
            ModuleRegistry::engine_default(),
        );
        run_to_completion(&mut task);

        let file = File::open(task.delga_path()).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        assert!(archive.by_name("scratch.tmp").is_err());
        assert!(archive.by_name("igde/editor.cfg").is_err());
    }

    #[test]
    fn incompressible_formats_are_stored() {
        let dir = tempfile::tempdir().unwrap();
        let mut task = DistributeTask::new(
            Arc::new(sample_vfs()),
            &project(dir.path()),
            &profile(),
            Vec::new(),
            ModuleRegistry::engine_default(),
        );
        run_to_completion(&mut task);

        let file = File::open(task.delga_path()).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        assert_eq!(
            archive.by_name("textures/stone.png").unwrap().compression(),
            CompressionMethod::Stored
        );
        assert_eq!(
            archive.by_name("model.demodel").unwrap().compression(),
            CompressionMethod::Deflated
        );
    }

    #[test]
    fn required_extensions_merged_into_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let mut profile = profile();
        profile.required_extensions = vec![".ogg".into()];

        let mut task = DistributeTask::new(
            Arc::new(sample_vfs()),
            &project(dir.path()),
            &profile,
            Vec::new(),
            ModuleRegistry::engine_default(),
        );
        run_to_completion(&mut task);

        let file = File::open(task.delga_path()).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut manifest = String::new();
        archive
            .by_name("example.degame")
            .unwrap()
            .read_to_string(&mut manifest)
            .unwrap();
        assert!(manifest.contains(r#"<requireFormat type="Sound">.ogg</requireFormat>"#));
    }

    #[test]
    fn base_gamedef_paths_prune_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut vfs = sample_vfs();
        vfs.add_file("/shared/materials/base.deskin", b"skin".to_vec());

        let mut task = DistributeTask::new(
            Arc::new(vfs),
            &project(dir.path()),
            &profile(),
            vec!["/shared".into()],
            ModuleRegistry::engine_default(),
        );
        run_to_completion(&mut task);

        let file = File::open(task.delga_path()).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        assert!(archive.by_name("shared/materials/base.deskin").is_err());
        // .deskin never seen, so not a required format either.
        let mut manifest = String::new();
        archive
            .by_name("example.degame")
            .unwrap()
            .read_to_string(&mut manifest)
            .unwrap();
        assert!(!manifest.contains(".deskin"));
    }

    #[test]
    fn archive_size_is_monotonic() {
        let dir = tempfile::tempdir().unwrap();
        let mut task = DistributeTask::new(
            Arc::new(sample_vfs()),
            &project(dir.path()),
            &profile(),
            Vec::new(),
            ModuleRegistry::engine_default(),
        );

        let mut last = 0;
        while task.step().unwrap() {
            let size = task.archive_size();
            assert!(size >= last);
            last = size;
        }
        assert_eq!(task.archive_size(), last);
    }

    #[test]
    fn entry_times_come_from_the_vfs() {
        let dir = tempfile::tempdir().unwrap();
        let mut vfs = MemoryVfs::new();
        vfs.add_file_with_time(
            "/model.demodel",
            b"m".to_vec(),
            Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap(),
        );

        let mut task = DistributeTask::new(
            Arc::new(vfs),
            &project(dir.path()),
            &profile(),
            Vec::new(),
            ModuleRegistry::engine_default(),
        );
        run_to_completion(&mut task);

        let file = File::open(task.delga_path()).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let entry = archive.by_name("model.demodel").unwrap();
        let time = entry.last_modified().unwrap();
        assert_eq!(time.year(), 2024);
        assert_eq!(time.month(), 3);
        assert_eq!(time.day(), 15);
    }

    /// A VFS whose `open` fails for one path.
    struct FailingVfs {
        inner: MemoryVfs,
        poison: String,
    }

    impl Vfs for FailingVfs {
        fn list_directories(&self, path: &str) -> Result<Vec<String>, VfsError> {
            self.inner.list_directories(path)
        }

        fn list_files(&self, path: &str) -> Result<Vec<String>, VfsError> {
            self.inner.list_files(path)
        }

        fn open(&self, path: &str) -> Result<Box<dyn Read + Send>, VfsError> {
            if path == self.poison {
                return Err(VfsError::access(
                    path,
                    std::io::Error::other("simulated read failure"),
                ));
            }
            self.inner.open(path)
        }

        fn modified(&self, path: &str) -> Result<chrono::DateTime<Utc>, VfsError> {
            self.inner.modified(path)
        }
    }

    #[test]
    fn first_error_finishes_the_task() {
        let dir = tempfile::tempdir().unwrap();
        let vfs = FailingVfs {
            inner: sample_vfs(),
            poison: "/model.demodel".into(),
        };

        let mut task = DistributeTask::new(
            Arc::new(vfs),
            &project(dir.path()),
            &profile(),
            Vec::new(),
            ModuleRegistry::engine_default(),
        );

        let err = loop {
            match task.step() {
                Ok(true) => continue,
                Ok(false) => panic!("task completed despite poisoned file"),
                Err(err) => break err,
            }
        };
        assert!(matches!(err, DelgaError::Vfs(_)));
        assert_eq!(task.state(), BuildState::Finished);
        // Stepping after failure is inert.
        assert!(!task.step().unwrap());
        assert!(task.message().starts_with("Failed"));
    }
}
