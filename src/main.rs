//! Photo Renamer - sort photos and videos into date folders
//!
//! Binary entry point: logging setup, argument dispatch and the end-of-run
//! summary. All real work happens in the library's [`Processor`].

use anyhow::Result;
use clap::Parser;
use photo_renamer::{Cli, Commands, FileResult, ProcessingStatus, Processor, RunConfig};
use tracing::{Level, error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (args, preview) = match &cli.command {
        Commands::Rename(args) => (args, false),
        Commands::Preview(args) => (args, true),
    };

    setup_logging(args.verbose);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        "photo renamer starting"
    );

    let config = RunConfig::resolve(args.input.clone(), args.category.clone(), preview)?;
    info!(
        root = %config.root_dir.display(),
        category = %config.category,
        preview,
        "configuration resolved"
    );

    let processor = Processor::new(config);
    match processor.run() {
        Ok(results) => {
            print_summary(&processor, &results, preview);
            if args.verbose {
                pause_for_ack();
            }
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "run failed");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Console log filter: INFO by default, DEBUG under `-v`, overridable with
/// `RUST_LOG`.
fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_summary(processor: &Processor, results: &[FileResult], preview: bool) {
    println!("{}", processor.stats().summary());

    let failed: Vec<&FileResult> = results
        .iter()
        .filter(|r| r.status == ProcessingStatus::Failed)
        .collect();
    if !failed.is_empty() {
        println!("\nFailed files:");
        for result in failed {
            let destination = result
                .destination
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            let message = result.error.as_deref().unwrap_or("unknown error");
            println!(
                "  {} -> {}: {}",
                result.source.display(),
                destination,
                message
            );
        }
    }

    if preview {
        println!("\nPreview only - no files were moved.");
    }
}

/// Terminal affordance only; the processor itself is headless.
fn pause_for_ack() {
    println!("Press Enter to close...");
    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line);
}
