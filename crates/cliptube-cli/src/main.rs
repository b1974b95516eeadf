//! Cliptube command-line interface.
//!
//! Discovers prefixed gaming recordings under the configured root, previews
//! the playlist plan, and uploads each recording to YouTube with resumable
//! chunked transfer. Exit codes: 0 on success or when nothing was found;
//! non-zero on authentication failure, a missing recordings root, or a run
//! ending with zero successful uploads after attempting some.

mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use cliptube_core::{
    LibraryScanner, PrivacyStatus, TokenStore, UploadOptions, UploadOrchestrator, UploaderConfig,
    VideoRecord, YouTubeClient, estimate_quota,
};

#[derive(Parser, Debug)]
#[command(name = "cliptube")]
#[command(about = "Uploads prefixed gaming recordings to YouTube with hierarchical playlists")]
struct Args {
    /// Preview discovery, titles, and playlist plans without uploading
    #[arg(long)]
    preview: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Recordings root (overrides RECORDINGS_PATH from the environment)
    #[arg(long, value_name = "DIR")]
    path: Option<PathBuf>,

    /// Visibility for uploaded videos: public, unlisted, or private
    #[arg(long, value_name = "VISIBILITY")]
    visibility: Option<String>,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    yes: bool,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    match real_main(&args) {
        Ok(code) => code,
        Err(e) => {
            output::print_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

fn real_main(args: &Args) -> anyhow::Result<ExitCode> {
    let mut config = UploaderConfig::from_env()?;
    if let Some(visibility) = &args.visibility {
        config.privacy = visibility.parse::<PrivacyStatus>()?;
    }
    if args.path.is_some() {
        config.recordings_path.clone_from(&args.path);
    }

    output::print_header(&config);

    let root = config.resolve_root(args.path.clone())?;
    debug!("Scanning {}", root.display());

    let scanner = LibraryScanner::new(root, config.category_folders.clone());
    let records = scanner.scan()?;

    if records.is_empty() {
        output::print_nothing_found();
        return Ok(ExitCode::SUCCESS);
    }

    output::print_preview(&records);
    output::print_quota(&estimate_quota(&records));

    if args.preview {
        // Exercise the stored credentials so a broken setup surfaces now
        // rather than at upload time. No network mutation happens here.
        match TokenStore::discover().access_token() {
            Ok(_) => output::print_auth_ok(),
            Err(e) => {
                output::print_error(&e.to_string());
                return Ok(ExitCode::FAILURE);
            }
        }
        println!("Preview mode: nothing was uploaded.");
        return Ok(ExitCode::SUCCESS);
    }

    let access_token = TokenStore::discover()
        .access_token()
        .context("authentication failed")?;
    let host = YouTubeClient::new(access_token).context("could not build API client")?;

    let orchestrator = UploadOrchestrator::new(UploadOptions::default());
    let cancel_token = orchestrator.cancellation_token();
    ctrlc::set_handler(move || {
        cancel_token.store(true, Ordering::SeqCst);
    })
    .context("could not install interrupt handler")?;

    let run_options = config.run_options();
    let progress = output::progress_callback();
    let privacy = config.privacy;
    let confirm = |records: &[VideoRecord]| {
        if args.yes {
            return true;
        }
        output::confirm_upload(records, privacy)
    };

    let summary = orchestrator.run(&host, &records, &run_options, confirm, Some(&progress));
    output::print_summary(&summary);

    Ok(if summary.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
