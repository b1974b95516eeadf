//! API quota estimation.
//!
//! YouTube Data API operations cost quota points against a daily budget
//! (10 000 by default). Uploads dominate at 1600 points each, so a batch
//! can easily overrun the budget; the preview surfaces an estimate before
//! anything is spent.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::scan::VideoRecord;

/// Points per video upload.
pub const UPLOAD_COST: u64 = 1600;

/// Points for the one cached playlist list call.
pub const PLAYLIST_LIST_COST: u64 = 1;

/// Points per playlist creation.
pub const PLAYLIST_CREATE_COST: u64 = 50;

/// Points per playlist membership insert.
pub const PLAYLIST_INSERT_COST: u64 = 50;

/// Default daily quota budget.
pub const DEFAULT_DAILY_QUOTA: u64 = 10_000;

/// Estimated quota cost of an upload run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaEstimate {
    /// Number of video uploads.
    pub video_count: usize,
    /// Points for uploads.
    pub upload_points: u64,
    /// Points for the playlist list call.
    pub playlist_list_points: u64,
    /// Worst-case points for playlist creation (every distinct target new).
    pub playlist_create_points: u64,
    /// Points for playlist membership inserts.
    pub playlist_insert_points: u64,
}

impl QuotaEstimate {
    /// Total estimated points.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.upload_points
            + self.playlist_list_points
            + self.playlist_create_points
            + self.playlist_insert_points
    }

    /// Whether the estimate overruns the default daily budget.
    #[must_use]
    pub const fn exceeds_default_quota(&self) -> bool {
        self.total() > DEFAULT_DAILY_QUOTA
    }
}

/// Estimate the quota cost of uploading the given records.
///
/// Playlist creation is a worst case: every distinct target name counted as
/// new. Membership inserts use the actual per-record target counts.
#[must_use]
pub fn estimate(records: &[VideoRecord]) -> QuotaEstimate {
    let distinct_targets: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.playlist_plan.targets.iter().map(String::as_str))
        .collect();

    let memberships: u64 = records
        .iter()
        .map(|r| r.playlist_plan.targets.len() as u64)
        .sum();

    QuotaEstimate {
        video_count: records.len(),
        upload_points: records.len() as u64 * UPLOAD_COST,
        playlist_list_points: PLAYLIST_LIST_COST,
        playlist_create_points: distinct_targets.len() as u64 * PLAYLIST_CREATE_COST,
        playlist_insert_points: memberships * PLAYLIST_INSERT_COST,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::VideoType;
    use crate::playlist::PlaylistPlan;
    use chrono::Local;
    use std::path::PathBuf;

    fn record(lineage: &[&str]) -> VideoRecord {
        let lineage: Vec<String> = lineage.iter().map(|s| (*s).to_string()).collect();
        VideoRecord {
            file_path: PathBuf::from("/r/merged_X.mp4"),
            file_name: "merged_X.mp4".to_string(),
            title: "X".to_string(),
            video_type: VideoType::Merged,
            folder_lineage: lineage.clone(),
            playlist_plan: PlaylistPlan::from_lineage(&lineage).expect("lineage"),
            recorded_at: Local::now(),
            size_bytes: 1,
        }
    }

    #[test]
    fn test_empty_run_costs_almost_nothing() {
        let estimate = estimate(&[]);
        assert_eq!(estimate.video_count, 0);
        assert_eq!(estimate.total(), PLAYLIST_LIST_COST);
        assert!(!estimate.exceeds_default_quota());
    }

    #[test]
    fn test_single_record_estimate() {
        let records = vec![record(&["SPIEL AUFNAHMEN", "GameX"])];
        let estimate = estimate(&records);

        assert_eq!(estimate.upload_points, UPLOAD_COST);
        // Two distinct playlists, two memberships.
        assert_eq!(estimate.playlist_create_points, 2 * PLAYLIST_CREATE_COST);
        assert_eq!(estimate.playlist_insert_points, 2 * PLAYLIST_INSERT_COST);
    }

    #[test]
    fn test_shared_playlists_counted_once_for_creation() {
        let records = vec![
            record(&["SPIEL AUFNAHMEN", "GameX"]),
            record(&["SPIEL AUFNAHMEN", "GameX"]),
        ];
        let estimate = estimate(&records);

        // Creation is per distinct name; memberships per record.
        assert_eq!(estimate.playlist_create_points, 2 * PLAYLIST_CREATE_COST);
        assert_eq!(estimate.playlist_insert_points, 4 * PLAYLIST_INSERT_COST);
    }

    #[test]
    fn test_batch_overruns_default_quota() {
        let records: Vec<VideoRecord> = (0..7)
            .map(|_| record(&["SPIEL AUFNAHMEN", "GameX"]))
            .collect();
        let estimate = estimate(&records);
        assert!(estimate.exceeds_default_quota());
    }
}
