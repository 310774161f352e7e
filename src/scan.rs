//! File listing with glob-based include/exclude filtering
//!
//! The lister is the discovery boundary of the tool: given a root directory
//! and two sets of glob patterns it returns the absolute paths of every
//! candidate file. Patterns are matched against the absolute path, so
//! `**/*.jpg` finds files at any depth while the exclusion guard can match
//! renamed files wherever an earlier run left them.

use crate::error::{Error, Result};
use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Extensions match case-insensitively; `*` stops at path separators while
/// `**` spans them.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| Error::Pattern {
                pattern: p.clone(),
                source: e,
            })
        })
        .collect()
}

/// List all files under `root` matching at least one include pattern and no
/// exclude pattern.
///
/// A missing or unreadable root is a fatal discovery error; nothing has been
/// mutated at that point. The returned order is unspecified.
pub fn list_files(
    root: &Path,
    include_patterns: &[String],
    exclude_patterns: &[String],
) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::InputDir {
            path: root.to_path_buf(),
        });
    }

    let include = compile_patterns(include_patterns)?;
    let exclude = compile_patterns(exclude_patterns)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();

        if !include
            .iter()
            .any(|p| p.matches_path_with(path, MATCH_OPTIONS))
        {
            trace!(path = %path.display(), "not a rename target");
            continue;
        }
        if exclude
            .iter()
            .any(|p| p.matches_path_with(path, MATCH_OPTIONS))
        {
            debug!(path = %path.display(), "already follows the rename scheme, skipping");
            continue;
        }

        files.push(path.to_path_buf());
    }

    debug!(count = files.len(), root = %root.display(), "listed candidate files");
    Ok(files)
}
