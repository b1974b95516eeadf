//! Recursive discovery of uploadable recordings.
//!
//! Walks the configured category folders under the recordings root,
//! classifying every entry on the way. Plain directories recurse and extend
//! the folder lineage; upload folders contribute their whole subtree with
//! the folder's prefix stripped from the lineage segment. Unreadable
//! directories are logged and treated as containing no videos - a single
//! bad directory never aborts the scan.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::classify::{self, VideoType};
use crate::error::{Error, Result};
use crate::playlist::PlaylistPlan;
use crate::title;

/// Category folders scanned as independent roots by default.
pub const DEFAULT_CATEGORY_FOLDERS: &[&str] =
    &["SPIEL AUFNAHMEN", "WITZIGE MOMENTE", "GESCHNITTE MOMENTE"];

/// One discovered recording, immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Absolute path; unique key for the run.
    pub file_path: PathBuf,
    /// File name including prefix and extension.
    pub file_name: String,
    /// Normalized display title.
    pub title: String,
    /// How the recording was produced.
    pub video_type: VideoType,
    /// Folder names from the category folder to the file's parent,
    /// prefix markers stripped.
    pub folder_lineage: Vec<String>,
    /// Playlists derived from the lineage.
    pub playlist_plan: PlaylistPlan,
    /// Best-effort original-capture timestamp.
    pub recorded_at: DateTime<Local>,
    /// File size in bytes.
    pub size_bytes: u64,
}

impl VideoRecord {
    /// File size in mebibytes, for display.
    #[must_use]
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Scanner over the recordings root.
pub struct LibraryScanner {
    root: PathBuf,
    category_folders: Vec<String>,
}

impl LibraryScanner {
    /// Create a scanner for a root and its category folders.
    #[must_use]
    pub fn new(root: PathBuf, category_folders: Vec<String>) -> Self {
        Self {
            root,
            category_folders,
        }
    }

    /// Create a scanner with the default category folders.
    #[must_use]
    pub fn with_default_categories(root: PathBuf) -> Self {
        Self::new(
            root,
            DEFAULT_CATEGORY_FOLDERS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        )
    }

    /// Discover every eligible recording under the root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordingsRootNotFound`] if the root directory does
    /// not exist. Everything below that is scan-local: unreadable entries
    /// are logged and skipped.
    pub fn scan(&self) -> Result<Vec<VideoRecord>> {
        if !self.root.is_dir() {
            return Err(Error::RecordingsRootNotFound(self.root.clone()));
        }

        let mut records = Vec::new();
        for category in &self.category_folders {
            let category_path = self.root.join(category);
            if !category_path.is_dir() {
                debug!("Category folder not present: {}", category_path.display());
                continue;
            }

            let before = records.len();
            self.scan_dir(&category_path, &[category.clone()], &mut records);
            info!(
                "Found {} video(s) in '{category}'",
                records.len() - before
            );
        }

        Ok(records)
    }

    fn scan_dir(&self, dir: &Path, lineage: &[String], records: &mut Vec<VideoRecord>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Skipping unreadable directory {}: {e}", dir.display());
                return;
            }
        };

        let mut entries: Vec<_> = entries
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {e}", dir.display());
                    None
                }
            })
            .collect();
        entries.sort_by_key(std::fs::DirEntry::file_name);

        for entry in entries {
            let path = entry.path();
            if path.is_file() {
                if let Some(video_type) = classify::classify_file(&path)
                    && let Some(record) = self.analyze_file(&path, video_type, lineage.to_vec())
                {
                    records.push(record);
                }
            } else if path.is_dir() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if let Some(folder_type) = classify::classify_dir(&name) {
                    self.scan_upload_folder(&path, &name, folder_type, lineage, records);
                } else {
                    let mut sub_lineage = lineage.to_vec();
                    sub_lineage.push(name);
                    self.scan_dir(&path, &sub_lineage, records);
                }
            }
        }
    }

    /// Enumerate an upload folder: every supported, unprocessed file in the
    /// whole subtree is eligible, typed by the folder unless the file
    /// carries its own prefix.
    fn scan_upload_folder(
        &self,
        folder: &Path,
        folder_name: &str,
        folder_type: VideoType,
        lineage: &[String],
        records: &mut Vec<VideoRecord>,
    ) {
        let clean_name = classify::strip_type_prefix(folder_name).to_string();
        let mut base_lineage = lineage.to_vec();
        base_lineage.push(clean_name);

        debug!(
            "Upload folder {} (type: {folder_type})",
            folder.display()
        );

        let mut found = Vec::new();
        for entry in WalkDir::new(folder) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(
                        "Skipping unreadable entry under {}: {e}",
                        folder.display()
                    );
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some(video_type) = classify::classify_contained_file(path, folder_type) else {
                continue;
            };

            let mut full_lineage = base_lineage.clone();
            if let Ok(relative) = path.strip_prefix(folder)
                && let Some(parent) = relative.parent()
            {
                for component in parent.components() {
                    full_lineage.push(component.as_os_str().to_string_lossy().into_owned());
                }
            }

            if let Some(record) = self.analyze_file(path, video_type, full_lineage) {
                found.push(record);
            }
        }

        found.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        records.extend(found);
    }

    fn analyze_file(
        &self,
        path: &Path,
        video_type: VideoType,
        lineage: Vec<String>,
    ) -> Option<VideoRecord> {
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        let size_bytes = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                warn!("Skipping {}: {e}", path.display());
                return None;
            }
        };

        let stem = path.file_stem()?.to_string_lossy().into_owned();
        let title = title::normalize_title(classify::strip_type_prefix(&stem));
        let playlist_plan = PlaylistPlan::from_lineage(&lineage)?;
        let recorded_at = capture_timestamp(path, &title);

        Some(VideoRecord {
            file_path: path.to_path_buf(),
            file_name,
            title,
            video_type,
            folder_lineage: lineage,
            playlist_plan,
            recorded_at,
            size_bytes,
        })
    }
}

/// Best-effort original-capture timestamp.
///
/// The capture tooling keeps the raw recording next to the merged one; when
/// a sibling original exists its mtime is the real capture time. Falls back
/// to the file's own mtime, then to now.
fn capture_timestamp(path: &Path, title: &str) -> DateTime<Local> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let underscored = title.replace(' ', "_");

    if let Some(parent) = path.parent() {
        let candidates = [
            format!("original_{underscored}.{extension}"),
            format!("{underscored}.{extension}"),
            format!("original {title}.{extension}"),
            format!("{title}.{extension}"),
        ];
        for candidate in candidates {
            let candidate_path = parent.join(&candidate);
            if candidate_path != path
                && candidate_path.is_file()
                && let Ok(meta) = fs::metadata(&candidate_path)
                && let Ok(modified) = meta.modified()
            {
                debug!("Using capture time of {}", candidate_path.display());
                return DateTime::from(modified);
            }
        }
    }

    fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::from)
        .unwrap_or_else(|_| Local::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(root: &Path, relative: &str, size: usize) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
        fs::write(&path, vec![0u8; size]).expect("write file");
    }

    fn scanner(root: &TempDir) -> LibraryScanner {
        LibraryScanner::with_default_categories(root.path().to_path_buf())
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let scanner = LibraryScanner::with_default_categories(PathBuf::from("/nonexistent/root"));
        assert!(matches!(
            scanner.scan(),
            Err(Error::RecordingsRootNotFound(_))
        ));
    }

    #[test]
    fn test_empty_root_finds_nothing() {
        let root = TempDir::new().expect("temp dir");
        let records = scanner(&root).scan().expect("scan");
        assert!(records.is_empty());
    }

    #[test]
    fn test_end_to_end_single_record() {
        let root = TempDir::new().expect("temp dir");
        write_file(
            root.path(),
            "SPIEL AUFNAHMEN/GameX/merged_Boss_Fight.mp4",
            10 * 1024 * 1024,
        );

        let records = scanner(&root).scan().expect("scan");
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.video_type, VideoType::Merged);
        assert_eq!(record.title, "Boss Fight");
        assert_eq!(record.folder_lineage, vec!["SPIEL AUFNAHMEN", "GameX"]);
        assert_eq!(record.playlist_plan.primary, "GameX");
        assert_eq!(
            record.playlist_plan.targets,
            vec!["GameX", "SPIEL AUFNAHMEN"]
        );
        assert_eq!(record.size_bytes, 10 * 1024 * 1024);
        assert_eq!(record.file_name, "merged_Boss_Fight.mp4");
    }

    #[test]
    fn test_processed_and_unsupported_files_skipped() {
        let root = TempDir::new().expect("temp dir");
        write_file(root.path(), "SPIEL AUFNAHMEN/GameX/uploaded_Boss.mp4", 10);
        write_file(root.path(), "SPIEL AUFNAHMEN/GameX/merged_notes.txt", 10);
        write_file(root.path(), "SPIEL AUFNAHMEN/GameX/Boss.mp4", 10);

        let records = scanner(&root).scan().expect("scan");
        assert!(records.is_empty());
    }

    #[test]
    fn test_folders_outside_categories_ignored() {
        let root = TempDir::new().expect("temp dir");
        write_file(root.path(), "Sonstiges/merged_Boss.mp4", 10);

        let records = scanner(&root).scan().expect("scan");
        assert!(records.is_empty());
    }

    #[test]
    fn test_deep_nesting_extends_lineage() {
        let root = TempDir::new().expect("temp dir");
        write_file(
            root.path(),
            "SPIEL AUFNAHMEN/GameX/BUG/merged_Glitch.mp4",
            10,
        );

        let records = scanner(&root).scan().expect("scan");
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].folder_lineage,
            vec!["SPIEL AUFNAHMEN", "GameX", "BUG"]
        );
        assert_eq!(records[0].playlist_plan.primary, "BUG");
    }

    #[test]
    fn test_upload_folder_subtree_is_upload_ready() {
        let root = TempDir::new().expect("temp dir");
        write_file(
            root.path(),
            "SPIEL AUFNAHMEN/GameX/unmergable_Raid Night/Clip_One.mp4",
            10,
        );
        write_file(
            root.path(),
            "SPIEL AUFNAHMEN/GameX/unmergable_Raid Night/extras/Clip_Two.mp4",
            10,
        );

        let records = scanner(&root).scan().expect("scan");
        assert_eq!(records.len(), 2);

        let one = records
            .iter()
            .find(|r| r.file_name == "Clip_One.mp4")
            .expect("Clip_One found");
        assert_eq!(one.video_type, VideoType::Unmergable);
        assert_eq!(
            one.folder_lineage,
            vec!["SPIEL AUFNAHMEN", "GameX", "Raid Night"]
        );
        assert_eq!(one.title, "Clip One");

        let two = records
            .iter()
            .find(|r| r.file_name == "Clip_Two.mp4")
            .expect("Clip_Two found");
        assert_eq!(
            two.folder_lineage,
            vec!["SPIEL AUFNAHMEN", "GameX", "Raid Night", "extras"]
        );
    }

    #[test]
    fn test_upload_folder_file_prefix_wins_over_folder_type() {
        let root = TempDir::new().expect("temp dir");
        write_file(
            root.path(),
            "SPIEL AUFNAHMEN/GameX/merged_Session/onlymic_Commentary.mp4",
            10,
        );

        let records = scanner(&root).scan().expect("scan");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].video_type, VideoType::MicOnly);
        assert_eq!(records[0].title, "Commentary");
    }

    #[test]
    fn test_processed_upload_folder_skipped() {
        let root = TempDir::new().expect("temp dir");
        write_file(
            root.path(),
            "SPIEL AUFNAHMEN/GameX/uploaded_merged_Session/Clip.mp4",
            10,
        );

        // The folder lost its upload prefix, so it is a plain directory and
        // the unprefixed file inside is not eligible.
        let records = scanner(&root).scan().expect("scan");
        assert!(records.is_empty());
    }

    #[test]
    fn test_processed_files_inside_upload_folder_skipped() {
        let root = TempDir::new().expect("temp dir");
        write_file(
            root.path(),
            "SPIEL AUFNAHMEN/GameX/merged_Session/uploaded_Clip.mp4",
            10,
        );

        let records = scanner(&root).scan().expect("scan");
        assert!(records.is_empty());
    }

    #[test]
    fn test_two_categories_scanned_independently() {
        let root = TempDir::new().expect("temp dir");
        write_file(root.path(), "SPIEL AUFNAHMEN/GameX/merged_A.mp4", 10);
        write_file(root.path(), "WITZIGE MOMENTE/merged_B.mp4", 10);

        let records = scanner(&root).scan().expect("scan");
        assert_eq!(records.len(), 2);

        let b = records
            .iter()
            .find(|r| r.file_name == "merged_B.mp4")
            .expect("record in second category");
        assert_eq!(b.folder_lineage, vec!["WITZIGE MOMENTE"]);
        assert_eq!(b.playlist_plan.primary, "WITZIGE MOMENTE");
    }

    #[test]
    fn test_capture_timestamp_prefers_sibling_original() {
        let root = TempDir::new().expect("temp dir");
        write_file(root.path(), "SPIEL AUFNAHMEN/GameX/merged_Boss.mp4", 10);
        write_file(root.path(), "SPIEL AUFNAHMEN/GameX/original_Boss.mp4", 10);

        let original = root.path().join("SPIEL AUFNAHMEN/GameX/original_Boss.mp4");
        let expected: DateTime<Local> = DateTime::from(
            fs::metadata(&original)
                .expect("stat original")
                .modified()
                .expect("mtime"),
        );

        let records = scanner(&root).scan().expect("scan");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].recorded_at, expected);
    }
}
