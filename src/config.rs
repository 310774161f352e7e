//! Run configuration and defaults resolution

use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Fraction of logical processors used for the worker pool
const WORKER_POOL_RATIO: f64 = 0.75;

/// Glob pattern matching the rename scheme's own output
/// (`YYYYMMDD_HHMMSS_<category>_<name>`), used to skip files produced by
/// earlier runs. Deliberately narrower than "any underscore" so that camera
/// names like `IMG_0001.heic` are still picked up.
pub const RENAMED_FILE_PATTERN: &str = "**/[0-9][0-9][0-9][0-9][0-9][0-9][0-9][0-9]_[0-9][0-9][0-9][0-9][0-9][0-9]_*";

/// Configuration for one rename run. Built once from the CLI arguments,
/// read-only for the duration of the run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Root directory that is scanned and receives the date folders
    pub root_dir: PathBuf,

    /// Category tag embedded in every renamed file
    pub category: String,

    /// Preview mode - log all decisions without touching the filesystem
    pub preview: bool,

    /// Number of worker threads (0 = auto)
    pub threads: usize,

    /// File extensions considered for renaming (lower-case, no dot)
    pub include_extensions: Vec<String>,

    /// Extensions treated as live-photo video candidates (lower-case, no dot)
    pub video_extensions: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::new(),
            category: String::new(),
            preview: false,
            threads: 0, // Auto-detect
            include_extensions: vec![
                "arw".into(),
                "heic".into(),
                "jpg".into(),
                "mov".into(),
                "mp4".into(),
                "png".into(),
            ],
            video_extensions: vec!["mov".into(), "mp4".into()],
        }
    }
}

impl RunConfig {
    /// Resolve CLI arguments into a run configuration.
    ///
    /// An empty or omitted input falls back to the current working
    /// directory; an empty or omitted category falls back to the name of
    /// the resolved directory. The input directory must exist.
    pub fn resolve(
        input: Option<PathBuf>,
        category: Option<String>,
        preview: bool,
    ) -> Result<Self> {
        let root_dir = match input {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => env::current_dir()?,
        };

        if !root_dir.is_dir() {
            return Err(Error::InputDir { path: root_dir });
        }
        let root_dir = root_dir.canonicalize()?;

        let category = match category {
            Some(c) if !c.is_empty() => c,
            _ => root_dir
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("photos")
                .to_string(),
        };

        Ok(Self {
            root_dir,
            category,
            preview,
            ..Self::default()
        })
    }

    /// Check if an extension (with or without leading dot) is a designated
    /// live-photo video extension
    pub fn is_video(&self, ext: &str) -> bool {
        let ext_lower = ext.trim_start_matches('.').to_lowercase();
        self.video_extensions.iter().any(|e| e == &ext_lower)
    }

    /// Include patterns handed to the file lister, one per extension
    pub fn include_patterns(&self) -> Vec<String> {
        self.include_extensions
            .iter()
            .map(|ext| format!("**/*.{ext}"))
            .collect()
    }

    /// Exclude patterns handed to the file lister (the re-run guard)
    pub fn exclude_patterns(&self) -> Vec<String> {
        vec![RENAMED_FILE_PATTERN.to_string()]
    }

    /// Bounded worker count for both parallel phases
    pub fn worker_threads(&self) -> usize {
        if self.threads > 0 {
            return self.threads;
        }
        let logical = num_cpus::get();
        ((logical as f64 * WORKER_POOL_RATIO).ceil() as usize).max(1)
    }
}
