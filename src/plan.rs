//! Rename plan construction and live-photo correlation
//!
//! A plan is built exactly once per run, up front, from the lister's output.
//! It is read-only afterwards, which is what makes the parallel move phase
//! safe without any locking: every worker re-derives its own pairing from
//! the shared plan.

use crate::config::RunConfig;
use crate::error::{Error, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One matched file, captured at scan time. Never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Absolute path at scan time
    pub original_path: PathBuf,

    /// File name without extension, the live-photo pairing key
    pub base_name: String,

    /// Lower-cased extension including the leading dot
    pub extension: String,

    /// Filesystem creation time in local time. Falls back to the
    /// modification time on filesystems that record no birth time.
    pub created: NaiveDateTime,
}

impl FileDescriptor {
    fn from_path(path: &Path) -> Result<Self> {
        let base_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();
        let created = creation_time(path)?;

        Ok(Self {
            original_path: path.to_path_buf(),
            base_name,
            extension,
            created,
        })
    }

    /// `YYYY-MM-DD` folder name for this descriptor's own timestamp
    pub fn date_folder(&self) -> String {
        date_folder_name(&self.created)
    }
}

/// `YYYY-MM-DD` folder name for a timestamp
pub fn date_folder_name(time: &NaiveDateTime) -> String {
    time.format("%Y-%m-%d").to_string()
}

fn creation_time(path: &Path) -> Result<NaiveDateTime> {
    let metadata = fs::metadata(path).map_err(|e| Error::Metadata {
        path: path.to_path_buf(),
        source: e,
    })?;
    let system_time = metadata.created().or_else(|_| {
        debug!(path = %path.display(), "no creation time on this filesystem, using modification time");
        metadata.modified()
    });
    let system_time = system_time.map_err(|e| Error::Metadata {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(DateTime::<Local>::from(system_time).naive_local())
}

/// The immutable set of file descriptors produced by one scan, consumed by
/// both directory provisioning and move execution.
#[derive(Debug, Default)]
pub struct RenamePlan {
    files: Vec<FileDescriptor>,
}

impl RenamePlan {
    /// Build one descriptor per listed path.
    ///
    /// A path that vanishes between listing and here is skipped with a
    /// warning; there is nothing left to move.
    pub fn build(paths: &[PathBuf]) -> Self {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            match FileDescriptor::from_path(path) {
                Ok(descriptor) => files.push(descriptor),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable file")
                }
            }
        }
        Self { files }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn files(&self) -> &[FileDescriptor] {
        &self.files
    }

    /// Distinct `YYYY-MM-DD` folder names across all descriptors, sorted.
    /// This set drives directory provisioning.
    pub fn distinct_dates(&self) -> Vec<String> {
        let mut dates: Vec<String> = self.files.iter().map(|f| f.date_folder()).collect();
        dates.sort();
        dates.dedup();
        dates
    }

    /// Find the live-photo companion for `descriptor`, if any.
    ///
    /// Only a video descriptor can have a companion. Candidates are every
    /// other descriptor in the plan sharing its base name whose extension
    /// is not a video extension. With exactly one candidate the pair is
    /// formed; with several, the lexicographically smallest original path
    /// wins and a warning is logged, since that shape of input is
    /// unexpected.
    pub fn companion_of<'a>(
        &'a self,
        descriptor: &FileDescriptor,
        config: &RunConfig,
    ) -> Option<&'a FileDescriptor> {
        if !config.is_video(&descriptor.extension) {
            return None;
        }

        let mut candidates: Vec<&FileDescriptor> = self
            .files
            .iter()
            .filter(|other| {
                other.original_path != descriptor.original_path
                    && other.base_name == descriptor.base_name
                    && !config.is_video(&other.extension)
            })
            .collect();

        if candidates.is_empty() {
            return None;
        }

        candidates.sort_by(|a, b| a.original_path.cmp(&b.original_path));
        if candidates.len() > 1 {
            warn!(
                video = %descriptor.original_path.display(),
                chosen = %candidates[0].original_path.display(),
                count = candidates.len(),
                "multiple live-photo companions share this base name, picking the smallest path"
            );
        }

        Some(candidates[0])
    }
}
