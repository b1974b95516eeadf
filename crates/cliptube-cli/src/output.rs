//! Colored console presentation and progress bars.

use std::io::{self, Write};
use std::sync::Mutex;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use cliptube_core::{
    PrivacyStatus, ProgressCallback, QuotaEstimate, RecordOutcome, RunSummary, UploadOutcome,
    UploadProgress, UploaderConfig, VideoRecord,
};

const RULE_WIDTH: usize = 70;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Print the startup banner.
pub fn print_header(config: &UploaderConfig) {
    println!("\n{}", rule().cyan());
    println!("{}", "Cliptube - Gaming Video Uploader".cyan().bold());
    println!("{}", rule().cyan());
    let path = config
        .recordings_path
        .as_ref()
        .map_or_else(|| "(not configured)".to_string(), |p| p.display().to_string());
    println!("{} {path}", "Recordings path:".yellow());
    println!(
        "{} {}",
        "Default visibility:".yellow(),
        config.privacy.to_string().to_uppercase()
    );
    println!("{}\n", rule().cyan());
}

/// Print an error line.
pub fn print_error(message: &str) {
    eprintln!("{} {message}", "error:".red().bold());
}

/// Informational message when the scan finds nothing.
pub fn print_nothing_found() {
    println!("{}", "No videos ready for upload.".yellow());
    println!(
        "{}",
        "Hint: eligible files carry a merged_/unmergable_/onlymic_/onlydesktop_ prefix.".yellow()
    );
}

/// Detailed preview of every discovered record with its playlist analysis.
pub fn print_preview(records: &[VideoRecord]) {
    println!(
        "{}",
        format!("{} video(s) ready for upload:", records.len())
            .green()
            .bold()
    );

    println!("\n{}", rule().cyan());
    println!("{}", "VIDEO OVERVIEW".cyan().bold());
    println!("{}", rule().cyan());

    for (index, record) in records.iter().enumerate() {
        let plan = &record.playlist_plan;
        println!(
            "\n{} {}",
            format!("{}.", index + 1).bold(),
            record.title.yellow().bold()
        );
        println!("   Path: {}", record.folder_lineage.join(" > "));
        println!("   Type: {} | Size: {:.2} MB", record.video_type, record.size_mb());
        println!(
            "   Recorded: {}",
            record.recorded_at.format("%d.%m.%Y - %H:%M Uhr")
        );
        println!(
            "   {} {}",
            "Primary playlist:".green(),
            plan.primary
        );
        let additional = plan.additional();
        if !additional.is_empty() {
            println!(
                "   {} {}",
                "Additional playlists:".cyan(),
                additional.join(", ")
            );
        }
    }
    println!("\n{}", "-".repeat(RULE_WIDTH).cyan());
}

/// Quota estimate block.
pub fn print_quota(estimate: &QuotaEstimate) {
    println!("\n{}", "API QUOTA ESTIMATE".blue().bold());
    println!(
        "{}",
        format!(
            "  Uploads: {} x 1600 = {} points",
            estimate.video_count, estimate.upload_points
        )
        .yellow()
    );
    println!(
        "{}",
        format!("  Playlist list (cached): {} point", estimate.playlist_list_points).yellow()
    );
    println!(
        "{}",
        format!(
            "  Playlist creation (worst case): {} points",
            estimate.playlist_create_points
        )
        .yellow()
    );
    println!(
        "{}",
        format!(
            "  Playlist memberships: {} points",
            estimate.playlist_insert_points
        )
        .yellow()
    );
    println!(
        "{}",
        format!("  Estimated total: {} points", estimate.total()).cyan()
    );

    if estimate.exceeds_default_quota() {
        println!(
            "{}",
            "  Warning: estimate exceeds the default daily quota (10,000 points)"
                .red()
                .bold()
        );
    } else {
        println!("{}", "  Within the default daily quota".green());
    }
    println!();
}

/// Report a successful credentials check (preview mode).
pub fn print_auth_ok() {
    println!("{}", "Stored credentials look valid.".green());
}

/// One-time confirmation gate for the whole batch.
pub fn confirm_upload(records: &[VideoRecord], privacy: PrivacyStatus) -> bool {
    println!(
        "{}",
        format!(
            "About to upload {} video(s) as {}.",
            records.len(),
            privacy.to_string().to_uppercase()
        )
        .yellow()
        .bold()
    );
    println!(
        "{}",
        "Files are renamed with an 'uploaded_' prefix after each upload.".yellow()
    );
    print!("Continue? (y/N): ");
    let _ = io::stdout().flush();

    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "j" | "ja")
}

/// Progress callback rendering one bar per uploading file.
pub fn progress_callback() -> ProgressCallback {
    let state: Mutex<Option<(String, ProgressBar)>> = Mutex::new(None);

    Box::new(move |progress: UploadProgress| {
        let Ok(mut guard) = state.lock() else {
            return;
        };

        let needs_new = guard
            .as_ref()
            .is_none_or(|(name, _)| *name != progress.file_name);
        if needs_new {
            if let Some((_, old_bar)) = guard.take() {
                old_bar.finish();
            }
            let bar = ProgressBar::new(progress.total_bytes);
            let style = ProgressStyle::with_template(
                "{msg} {bar:40.green} {bytes}/{total_bytes} ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar());
            bar.set_style(style);
            bar.set_message(progress.file_name.clone());
            *guard = Some((progress.file_name.clone(), bar));
        }

        if let Some((_, bar)) = guard.as_ref() {
            bar.set_position(progress.bytes_sent);
            if progress.bytes_sent >= progress.total_bytes {
                bar.finish();
            }
        }
    })
}

/// Final run summary.
pub fn print_summary(summary: &RunSummary) {
    println!("\n{}", rule().cyan());
    println!("{}", "UPLOAD SUMMARY".cyan().bold());
    println!("{}", rule().cyan());

    if summary.aborted {
        println!("{}", "Upload cancelled by user.".yellow());
        return;
    }
    if summary.interrupted {
        println!("{}", "Run interrupted - partial results below.".yellow());
    }
    if summary.quota_exhausted {
        println!(
            "{}",
            "API quota exhausted - remaining uploads were skipped. The quota resets daily."
                .red()
                .bold()
        );
    }

    println!(
        "{}",
        format!("Uploaded: {}/{}", summary.uploaded, summary.found).green()
    );
    println!("{}", format!("Failed: {}", summary.failed).red());

    let rate = if summary.attempted > 0 {
        summary.uploaded as f64 / summary.attempted as f64 * 100.0
    } else {
        0.0
    };
    println!("{}", format!("Success rate: {rate:.1}%").blue());

    println!("\n{}", "By type:".yellow());
    println!("  Merged: {}", summary.merged);
    println!("  Unmergable: {}", summary.unmergable);
    println!("  OnlyMic: {}", summary.mic_only);
    println!("  OnlyDesktop: {}", summary.desktop_only);

    if !summary.outcomes.is_empty() {
        println!("\n{}", "Records:".yellow());
        for outcome in &summary.outcomes {
            print_outcome(outcome);
        }
    }
}

fn print_outcome(record: &RecordOutcome) {
    match &record.outcome {
        UploadOutcome::Succeeded { video_id, .. } => {
            println!(
                "  {} {} ({video_id})",
                "ok".green().bold(),
                record.title
            );
        }
        UploadOutcome::Failed { reason } => {
            println!(
                "  {} {} - {reason}",
                "failed".red().bold(),
                record.title
            );
        }
    }
}
