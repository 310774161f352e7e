//! The rename engine: date-folder provisioning and parallel move execution
//!
//! Handles the core logic of:
//! - Listing candidate media files under the root
//! - Building the immutable rename plan
//! - Provisioning one `YYYY-MM-DD` folder per distinct capture date
//! - Moving every file to its timestamped name, live-photo aware
//!
//! The two parallel phases are strictly ordered: provisioning runs to
//! completion before the first move, so the executor never races against a
//! missing destination directory. Within the move phase no worker mutates
//! shared state; the plan is read-only and the filesystem is the only shared
//! resource.

use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::plan::{FileDescriptor, RenamePlan, date_folder_name};
use crate::scan;
use chrono::{Local, NaiveDateTime, TimeZone};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{Level, debug, error, info, span, warn};

/// Result of processing a single file
#[derive(Debug, Clone)]
pub struct FileResult {
    /// Source file path
    pub source: PathBuf,

    /// Computed destination path
    pub destination: Option<PathBuf>,

    /// Processing status
    pub status: ProcessingStatus,

    /// Error message (if failed)
    pub error: Option<String>,
}

/// Status of file processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStatus {
    /// File was moved to its destination
    Renamed,
    /// Preview mode - the planned move was logged only
    Preview,
    /// Processing failed for this file
    Failed,
}

/// Processing statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub total_files: AtomicUsize,
    pub renamed: AtomicUsize,
    pub previewed: AtomicUsize,
    pub failed: AtomicUsize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> String {
        format!(
            "Total: {}, Renamed: {}, Previewed: {}, Failed: {}",
            self.total_files.load(Ordering::Relaxed),
            self.renamed.load(Ordering::Relaxed),
            self.previewed.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed)
        )
    }
}

/// `YYYYMMDD_HHMMSS_<category>_<original name><ext>` destination file name
pub fn target_file_name(
    time: &NaiveDateTime,
    category: &str,
    descriptor: &FileDescriptor,
) -> String {
    format!(
        "{}_{}_{}_{}{}",
        time.format("%Y%m%d"),
        time.format("%H%M%S"),
        category,
        descriptor.base_name,
        descriptor.extension
    )
}

/// Main processor wiring discovery, provisioning and move execution into
/// one run
pub struct Processor {
    config: RunConfig,
    stats: Arc<ProcessingStats>,
}

impl Processor {
    /// Create a new processor with the given configuration
    pub fn new(config: RunConfig) -> Self {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads())
            .build_global()
            .ok(); // Ignore if already initialized

        Self {
            config,
            stats: Arc::new(ProcessingStats::new()),
        }
    }

    /// Run the rename pipeline.
    ///
    /// Returns one result per planned file. Discovery and provisioning
    /// failures abort the run; per-file move failures are recorded in that
    /// file's result and never stop the rest of the batch.
    pub fn run(&self) -> Result<Vec<FileResult>> {
        let _span =
            span!(Level::INFO, "rename_run", root = %self.config.root_dir.display()).entered();

        if self.config.preview {
            info!(root = %self.config.root_dir.display(), "previewing renames");
        } else {
            info!(root = %self.config.root_dir.display(), "start renaming");
        }

        let paths = scan::list_files(
            &self.config.root_dir,
            &self.config.include_patterns(),
            &self.config.exclude_patterns(),
        )?;
        let plan = RenamePlan::build(&paths);

        if plan.is_empty() {
            info!("no files to process");
            return Ok(Vec::new());
        }
        info!(count = plan.len(), "found media files");
        self.stats.total_files.store(plan.len(), Ordering::Relaxed);
        debug!(workers = self.config.worker_threads(), "worker pool size");

        self.provision_date_dirs(&plan)?;

        let results: Vec<FileResult> = plan
            .files()
            .par_iter()
            .map(|descriptor| self.move_file(descriptor, &plan))
            .collect();

        info!("{}", self.stats.summary());
        Ok(results)
    }

    /// Get processing statistics reference
    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    /// Ensure one `root/YYYY-MM-DD` folder exists per distinct capture
    /// date. Creation is idempotent, so losing a concurrent creation race
    /// is not an error. Any real failure aborts the run since every move
    /// depends on its directory.
    fn provision_date_dirs(&self, plan: &RenamePlan) -> Result<()> {
        let dates = plan.distinct_dates();
        debug!(count = dates.len(), "provisioning date directories");

        dates.par_iter().try_for_each(|date| {
            let target = self.config.root_dir.join(date);
            if target.is_dir() {
                return Ok(());
            }
            if self.config.preview {
                info!(directory = %target.display(), "would create directory");
                return Ok(());
            }
            debug!(directory = %target.display(), "creating directory");
            fs::create_dir_all(&target).map_err(|e| Error::CreateDir {
                path: target.clone(),
                source: e,
            })
        })
    }

    /// Compute the destination for one descriptor and perform (or preview)
    /// the move. A paired video adopts its companion's timestamp for the
    /// destination; everything else uses its own.
    fn move_file(&self, descriptor: &FileDescriptor, plan: &RenamePlan) -> FileResult {
        let companion = plan.companion_of(descriptor, &self.config);
        let effective_time = companion.map_or(descriptor.created, |c| c.created);

        let destination = self
            .config
            .root_dir
            .join(date_folder_name(&effective_time))
            .join(target_file_name(
                &effective_time,
                &self.config.category,
                descriptor,
            ));

        if self.config.preview {
            info!(
                source = %descriptor.original_path.display(),
                destination = %destination.display(),
                "would rename"
            );
            self.stats.previewed.fetch_add(1, Ordering::Relaxed);
            return FileResult {
                source: descriptor.original_path.clone(),
                destination: Some(destination),
                status: ProcessingStatus::Preview,
                error: None,
            };
        }

        match execute_move(descriptor, companion, &destination) {
            Ok(()) => {
                info!(
                    source = %descriptor.original_path.display(),
                    destination = %destination.display(),
                    "renamed"
                );
                self.stats.renamed.fetch_add(1, Ordering::Relaxed);
                FileResult {
                    source: descriptor.original_path.clone(),
                    destination: Some(destination),
                    status: ProcessingStatus::Renamed,
                    error: None,
                }
            }
            Err(e) => {
                error!(
                    source = %descriptor.original_path.display(),
                    destination = %destination.display(),
                    error = %e,
                    "failed to rename file"
                );
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                FileResult {
                    source: descriptor.original_path.clone(),
                    destination: Some(destination),
                    status: ProcessingStatus::Failed,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// Move one file to its destination. The destination directory already
/// exists; an occupied destination is this file's failure, not a license
/// to overwrite.
fn execute_move(
    descriptor: &FileDescriptor,
    companion: Option<&FileDescriptor>,
    destination: &Path,
) -> Result<()> {
    if destination.exists() {
        return Err(Error::DestinationExists {
            path: destination.to_path_buf(),
        });
    }

    fs::rename(&descriptor.original_path, destination).map_err(|e| Error::Move {
        from: descriptor.original_path.clone(),
        to: destination.to_path_buf(),
        source: e,
    })?;

    // A paired video also carries the still's timestamp in its file
    // metadata, keeping the pair adjacent in time-ordered listings.
    if let Some(companion) = companion
        && let Some(stamp) = Local.from_local_datetime(&companion.created).earliest()
    {
        let stamp = filetime::FileTime::from_system_time(stamp.into());
        if let Err(e) = filetime::set_file_times(destination, stamp, stamp) {
            warn!(
                path = %destination.display(),
                error = %e,
                "moved, but could not stamp the companion timestamp"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;
    use walkdir::WalkDir;

    fn touch(path: &Path) {
        fs::write(path, b"x").unwrap();
    }

    fn config_for(root: &Path) -> RunConfig {
        RunConfig {
            root_dir: root.to_path_buf(),
            category: "trip".to_string(),
            ..RunConfig::default()
        }
    }

    /// Build the same plan the processor will build, to derive expected
    /// destinations from the real filesystem timestamps.
    fn reference_plan(config: &RunConfig) -> RenamePlan {
        let paths = scan::list_files(
            &config.root_dir,
            &config.include_patterns(),
            &config.exclude_patterns(),
        )
        .unwrap();
        RenamePlan::build(&paths)
    }

    fn expected_destination(config: &RunConfig, descriptor: &FileDescriptor) -> PathBuf {
        config
            .root_dir
            .join(date_folder_name(&descriptor.created))
            .join(target_file_name(
                &descriptor.created,
                &config.category,
                descriptor,
            ))
    }

    fn all_files(root: &Path) -> Vec<PathBuf> {
        WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .collect()
    }

    #[test]
    fn target_file_name_embeds_time_category_and_original_name() {
        let descriptor = FileDescriptor {
            original_path: PathBuf::from("DCIM/IMG_0001.heic"),
            base_name: "IMG_0001".to_string(),
            extension: ".heic".to_string(),
            created: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(10, 15, 2)
                .unwrap(),
        };
        assert_eq!(
            target_file_name(&descriptor.created, "DCIM", &descriptor),
            "20240301_101502_DCIM_IMG_0001.heic"
        );
    }

    #[test]
    fn renames_into_date_folder() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("IMG_0002.jpg");
        touch(&source);

        let config = config_for(dir.path());
        let plan = reference_plan(&config);
        let expected = expected_destination(&config, &plan.files()[0]);

        let results = Processor::new(config).run().unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, ProcessingStatus::Renamed);
        assert_eq!(results[0].destination.as_deref(), Some(expected.as_path()));
        assert!(!source.exists());
        assert!(expected.is_file());
    }

    #[test]
    fn live_pair_adopts_the_still_timestamp() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("IMG_0001.heic"));
        touch(&dir.path().join("IMG_0001.mov"));

        let config = config_for(dir.path());
        let plan = reference_plan(&config);
        let still = plan
            .files()
            .iter()
            .find(|d| d.extension == ".heic")
            .unwrap();
        let video = plan
            .files()
            .iter()
            .find(|d| d.extension == ".mov")
            .unwrap();

        let expected_still = expected_destination(&config, still);
        // The video lands next to the still, named with the still's time.
        let expected_video = config
            .root_dir
            .join(date_folder_name(&still.created))
            .join(target_file_name(&still.created, &config.category, video));

        let results = Processor::new(config).run().unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.status == ProcessingStatus::Renamed));
        assert!(expected_still.is_file());
        assert!(expected_video.is_file());
    }

    #[test]
    fn preview_leaves_the_filesystem_untouched() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("IMG_0003.jpg");
        touch(&source);

        let config = RunConfig {
            preview: true,
            ..config_for(dir.path())
        };
        let plan = reference_plan(&config);
        let expected = expected_destination(&config, &plan.files()[0]);

        let results = Processor::new(config).run().unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, ProcessingStatus::Preview);
        // Same destination decision as a real run would execute.
        assert_eq!(results[0].destination.as_deref(), Some(expected.as_path()));
        assert!(source.is_file());
        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert!(entries.iter().all(|e| e.path().is_file()));
    }

    #[test]
    fn empty_directory_short_circuits() {
        let dir = tempdir().unwrap();

        let results = Processor::new(config_for(dir.path())).run().unwrap();

        assert!(results.is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn occupied_destination_fails_that_file_only() {
        let dir = tempdir().unwrap();
        let blocked_source = dir.path().join("IMG_0004.jpg");
        touch(&blocked_source);
        touch(&dir.path().join("IMG_0005.png"));

        let config = config_for(dir.path());
        let plan = reference_plan(&config);
        let blocked = plan
            .files()
            .iter()
            .find(|d| d.base_name == "IMG_0004")
            .unwrap();
        let occupied = expected_destination(&config, blocked);
        fs::create_dir_all(occupied.parent().unwrap()).unwrap();
        touch(&occupied);

        let results = Processor::new(config).run().unwrap();

        let blocked_result = results
            .iter()
            .find(|r| r.source == blocked_source)
            .unwrap();
        assert_eq!(blocked_result.status, ProcessingStatus::Failed);
        assert!(
            blocked_result
                .error
                .as_deref()
                .unwrap()
                .contains("already exists")
        );
        assert!(blocked_source.is_file());

        let other_result = results.iter().find(|r| r.source != blocked_source).unwrap();
        assert_eq!(other_result.status, ProcessingStatus::Renamed);
    }

    #[test]
    fn second_run_finds_nothing_to_do() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("IMG_0006.jpg"));

        let first = Processor::new(config_for(dir.path())).run().unwrap();
        assert_eq!(first.len(), 1);
        let after_first = all_files(dir.path());

        let second = Processor::new(config_for(dir.path())).run().unwrap();
        assert!(second.is_empty());
        assert_eq!(all_files(dir.path()), after_first);
        assert_eq!(after_first.len(), 1);
    }

    #[test]
    fn stats_summary_reports_counters() {
        let stats = ProcessingStats::new();
        stats.total_files.store(4, Ordering::Relaxed);
        stats.renamed.fetch_add(2, Ordering::Relaxed);
        stats.previewed.fetch_add(1, Ordering::Relaxed);
        stats.failed.fetch_add(1, Ordering::Relaxed);

        let summary = stats.summary();
        assert!(summary.contains("Total: 4"));
        assert!(summary.contains("Renamed: 2"));
        assert!(summary.contains("Previewed: 1"));
        assert!(summary.contains("Failed: 1"));
    }
}
