//! Upload orchestration.
//!
//! Processes discovered records strictly sequentially: each record is
//! uploaded, filed into its target playlists, and renamed with the
//! processed marker before the next record starts. One record's failure
//! never aborts the batch; only an observed quota exhaustion stops the
//! remaining uploads, since they would deterministically fail the same way.
//!
//! The whole batch sits behind a single confirmation gate, and a shared
//! cancellation flag (set from a signal handler) causes a clean early exit
//! with a partial summary between records.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::api::{ApiError, VideoHost};
use crate::cache::PlaylistCache;
use crate::classify::{UPLOADED_PREFIX, VideoType};
use crate::error::{Error, Result};
use crate::metadata::{self, PrivacyStatus};
use crate::scan::VideoRecord;
use crate::transfer::{ProgressCallback, UploadEngine, UploadOptions};

/// Default pause between consecutive uploads, to avoid bursty API pressure.
pub const DEFAULT_UPLOAD_PAUSE: Duration = Duration::from_secs(10);

/// Configuration for one upload run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Visibility applied to every upload.
    pub privacy: PrivacyStatus,
    /// Pause between consecutive uploads.
    pub pause_between_uploads: Duration,
    /// Transfer engine options.
    pub upload: UploadOptions,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            privacy: PrivacyStatus::default(),
            pause_between_uploads: DEFAULT_UPLOAD_PAUSE,
            upload: UploadOptions::default(),
        }
    }
}

/// Per-record result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadOutcome {
    /// Upload confirmed; the record is done.
    Succeeded {
        /// Remote video id.
        video_id: String,
        /// New local path after the processed-marker rename, when the
        /// rename succeeded.
        renamed_to: Option<PathBuf>,
    },
    /// The record failed or was never attempted.
    Failed {
        /// Human-readable reason.
        reason: String,
    },
}

/// Outcome of one record, kept for the run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOutcome {
    /// File name of the record.
    pub file_name: String,
    /// Display title.
    pub title: String,
    /// What happened.
    pub outcome: UploadOutcome,
}

/// Aggregated result of an upload run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Records discovered by the scan.
    pub found: usize,
    /// Records whose upload actually started.
    pub attempted: usize,
    /// Successfully uploaded records.
    pub uploaded: usize,
    /// Failed or not-attempted records.
    pub failed: usize,
    /// Count of merged recordings found.
    pub merged: usize,
    /// Count of unmergable recordings found.
    pub unmergable: usize,
    /// Count of mic-only recordings found.
    pub mic_only: usize,
    /// Count of desktop-only recordings found.
    pub desktop_only: usize,
    /// The user declined the confirmation gate.
    pub aborted: bool,
    /// The run was interrupted between records.
    pub interrupted: bool,
    /// A quota-exhaustion signal was observed.
    pub quota_exhausted: bool,
    /// Per-record outcomes, in processing order.
    pub outcomes: Vec<RecordOutcome>,
}

impl RunSummary {
    fn for_records(records: &[VideoRecord]) -> Self {
        let mut summary = Self {
            found: records.len(),
            ..Self::default()
        };
        for record in records {
            match record.video_type {
                VideoType::Merged => summary.merged += 1,
                VideoType::Unmergable => summary.unmergable += 1,
                VideoType::MicOnly => summary.mic_only += 1,
                VideoType::DesktopOnly => summary.desktop_only += 1,
            }
        }
        summary
    }

    /// Whether the run counts as successful for the process exit code:
    /// not aborted, and not ending with zero successes after attempting
    /// at least one upload.
    #[must_use]
    pub const fn success(&self) -> bool {
        !self.aborted && (self.attempted == 0 || self.uploaded > 0)
    }

    /// One-line summary for logs.
    #[must_use]
    pub fn summary_line(&self) -> String {
        if self.aborted {
            "Run aborted before any upload".to_string()
        } else if self.interrupted {
            format!(
                "Run interrupted: {}/{} uploaded before exit",
                self.uploaded, self.found
            )
        } else {
            format!(
                "Run complete: {} uploaded, {} failed of {} found",
                self.uploaded, self.failed, self.found
            )
        }
    }
}

/// Rename a processed file with the uploaded marker.
///
/// A recognized type prefix is substituted; otherwise the marker is
/// prepended. Destination collisions get an incrementing numeric suffix
/// before the extension until a free name is found.
pub fn mark_processed(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::FileSystem {
            path: path.to_path_buf(),
            message: "file has no valid name".to_string(),
        })?;

    let base_name = match VideoType::from_name(file_name) {
        Some(video_type) => file_name.replacen(video_type.prefix(), UPLOADED_PREFIX, 1),
        None => format!("{UPLOADED_PREFIX}{file_name}"),
    };

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut candidate = parent.join(&base_name);
    let mut counter = 1u32;
    while candidate.exists() {
        let next_name = match base_name.rsplit_once('.') {
            Some((stem, extension)) => format!("{stem}_{counter}.{extension}"),
            None => format!("{base_name}_{counter}"),
        };
        candidate = parent.join(next_name);
        counter += 1;
    }

    fs::rename(path, &candidate).map_err(|e| Error::FileSystem {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    info!(
        "Renamed {} -> {}",
        path.display(),
        candidate.display()
    );
    Ok(candidate)
}

/// Orchestrator driving the per-record upload state machine.
pub struct UploadOrchestrator {
    cancelled: Arc<AtomicBool>,
    engine: UploadEngine,
}

impl Default for UploadOrchestrator {
    fn default() -> Self {
        Self::new(UploadOptions::default())
    }
}

impl UploadOrchestrator {
    /// Create an orchestrator with the given engine options.
    #[must_use]
    pub fn new(upload_options: UploadOptions) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            engine: UploadEngine::with_options(upload_options),
        }
    }

    /// Create an orchestrator with a shared cancellation flag.
    #[must_use]
    pub fn with_cancellation(upload_options: UploadOptions, cancelled: Arc<AtomicBool>) -> Self {
        Self {
            cancelled,
            engine: UploadEngine::with_options(upload_options),
        }
    }

    /// Request cancellation; honored between records.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Get the cancellation token, e.g. for a signal handler.
    #[must_use]
    pub fn cancellation_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Process every record: upload, playlist assignment, rename.
    ///
    /// `confirm` is the one-time gate for the whole batch; when it returns
    /// false the run aborts before any record is attempted.
    pub fn run<H, C>(
        &self,
        host: &H,
        records: &[VideoRecord],
        options: &RunOptions,
        confirm: C,
        progress: Option<&ProgressCallback>,
    ) -> RunSummary
    where
        H: VideoHost,
        C: FnOnce(&[VideoRecord]) -> bool,
    {
        let mut summary = RunSummary::for_records(records);
        if records.is_empty() {
            return summary;
        }

        if !confirm(records) {
            warn!("Upload declined by user");
            summary.aborted = true;
            return summary;
        }

        let mut cache = PlaylistCache::new();
        let total = records.len();

        for (index, record) in records.iter().enumerate() {
            if self.is_cancelled() {
                warn!("Run interrupted, stopping before record {}", index + 1);
                summary.interrupted = true;
                break;
            }

            if summary.quota_exhausted {
                summary.failed += 1;
                summary.outcomes.push(RecordOutcome {
                    file_name: record.file_name.clone(),
                    title: record.title.clone(),
                    outcome: UploadOutcome::Failed {
                        reason: "not attempted: quota exhausted".to_string(),
                    },
                });
                continue;
            }

            if summary.attempted > 0 && !options.pause_between_uploads.is_zero() {
                info!(
                    "Waiting {:?} before next upload",
                    options.pause_between_uploads
                );
                std::thread::sleep(options.pause_between_uploads);
            }

            info!(
                "Upload {}/{}: {} ({:.1} MB)",
                index + 1,
                total,
                record.title,
                record.size_mb()
            );

            summary.attempted += 1;
            let video_metadata = metadata::build_metadata(record, options.privacy);

            match self
                .engine
                .upload_file(host, &record.file_path, &video_metadata, progress)
            {
                Ok(video_id) => {
                    self.assign_playlists(host, &mut cache, record, &video_id, &mut summary);

                    let renamed_to = match mark_processed(&record.file_path) {
                        Ok(new_path) => Some(new_path),
                        Err(e) => {
                            // Local bookkeeping only: the upload still counts.
                            warn!("Could not rename {}: {e}", record.file_path.display());
                            None
                        }
                    };

                    summary.uploaded += 1;
                    summary.outcomes.push(RecordOutcome {
                        file_name: record.file_name.clone(),
                        title: record.title.clone(),
                        outcome: UploadOutcome::Succeeded {
                            video_id,
                            renamed_to,
                        },
                    });
                }
                Err(Error::QuotaExceeded) => {
                    error!(
                        "Quota exhausted uploading '{}'; remaining records will not be attempted",
                        record.title
                    );
                    summary.quota_exhausted = true;
                    summary.failed += 1;
                    summary.outcomes.push(RecordOutcome {
                        file_name: record.file_name.clone(),
                        title: record.title.clone(),
                        outcome: UploadOutcome::Failed {
                            reason: "quota exhausted".to_string(),
                        },
                    });
                }
                Err(e) => {
                    error!("Upload failed for '{}': {e}", record.title);
                    summary.failed += 1;
                    summary.outcomes.push(RecordOutcome {
                        file_name: record.file_name.clone(),
                        title: record.title.clone(),
                        outcome: UploadOutcome::Failed {
                            reason: e.to_string(),
                        },
                    });
                }
            }
        }

        info!("{}", summary.summary_line());
        summary
    }

    /// Associate an uploaded video with every target playlist. Failures are
    /// per-playlist: logged, never failing the record or blocking the rest.
    fn assign_playlists<H: VideoHost>(
        &self,
        host: &H,
        cache: &mut PlaylistCache,
        record: &VideoRecord,
        video_id: &str,
        summary: &mut RunSummary,
    ) {
        let targets = &record.playlist_plan.targets;
        info!(
            "Filing '{}' into {} playlist(s)",
            record.title,
            targets.len()
        );

        for name in targets {
            match cache.resolve_or_create(host, name) {
                Ok(playlist_id) => {
                    if let Err(e) = host.add_video_to_playlist(&playlist_id, video_id) {
                        warn!("Could not add '{}' to playlist '{name}': {e}", record.title);
                        if e == ApiError::QuotaExceeded {
                            summary.quota_exhausted = true;
                        }
                    }
                }
                Err(e) => {
                    warn!("Could not resolve playlist '{name}': {e}");
                    if e == ApiError::QuotaExceeded {
                        summary.quota_exhausted = true;
                    }
                }
            }
        }
    }
}
