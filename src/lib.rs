//! Photo Renamer - a CLI tool that sorts photos and videos into date folders
//!
//! This library provides the headless core behind the `rename` and
//! `preview` commands:
//! - Glob-based discovery of candidate media files
//! - An immutable rename plan built from filesystem creation times
//! - Live-photo correlation (a video adopts its still's timestamp)
//! - Parallel date-folder provisioning and move execution with Rayon

pub mod cli;
pub mod config;
pub mod error;
pub mod plan;
pub mod process;
pub mod scan;

pub use cli::{Cli, Commands, RunArgs};
pub use config::RunConfig;
pub use error::{Error, Result};
pub use plan::{FileDescriptor, RenamePlan};
pub use process::{FileResult, ProcessingStats, ProcessingStatus, Processor};
