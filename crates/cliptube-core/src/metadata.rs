//! Video metadata synthesis.
//!
//! Builds the title, description, tags, and visibility settings sent with
//! each upload. Descriptions are assembled from fixed German template lines
//! keyed by the video type, plus conditional lines for the game, the most
//! specific subfolder, the capture timestamp, and the collection name.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::classify::VideoType;
use crate::error::Error;
use crate::scan::VideoRecord;

/// YouTube category id for gaming content.
pub const GAMING_CATEGORY_ID: &str = "20";

/// Default language for titles and audio.
pub const DEFAULT_LANGUAGE: &str = "de";

/// Visibility applied uniformly to every upload in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyStatus {
    /// Visible to everyone.
    Public,
    /// Reachable via link only.
    #[default]
    Unlisted,
    /// Visible to the owner only.
    Private,
}

impl PrivacyStatus {
    /// The wire value expected by the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Unlisted => "unlisted",
            Self::Private => "private",
        }
    }
}

impl std::fmt::Display for PrivacyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PrivacyStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "unlisted" => Ok(Self::Unlisted),
            "private" => Ok(Self::Private),
            other => Err(Error::Configuration(format!(
                "unknown visibility '{other}' (expected public, unlisted, or private)"
            ))),
        }
    }
}

/// Complete metadata for one upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Display title.
    pub title: String,
    /// Generated description.
    pub description: String,
    /// Tag list.
    pub tags: Vec<String>,
    /// Category id (always gaming).
    pub category_id: String,
    /// Default title/audio language.
    pub default_language: String,
    /// Visibility of the uploaded video.
    pub privacy: PrivacyStatus,
}

/// Build the metadata for a record with the run's uniform visibility.
#[must_use]
pub fn build_metadata(record: &VideoRecord, privacy: PrivacyStatus) -> VideoMetadata {
    VideoMetadata {
        title: record.title.clone(),
        description: build_description(record),
        tags: build_tags(record),
        category_id: GAMING_CATEGORY_ID.to_string(),
        default_language: DEFAULT_LANGUAGE.to_string(),
        privacy,
    }
}

fn build_description(record: &VideoRecord) -> String {
    let plan = &record.playlist_plan;
    let mut lines: Vec<String> = match record.video_type {
        VideoType::MicOnly => vec![
            format!("Mikrofon Audio: {}", record.title),
            "Nur Mikrofon-Aufnahme ohne Desktop-Audio".to_string(),
            String::new(),
        ],
        VideoType::DesktopOnly => vec![
            format!("Game/Desktop Audio: {}", record.title),
            "Nur Game-/Desktop-Audio ohne Mikrofon".to_string(),
            String::new(),
        ],
        VideoType::Merged | VideoType::Unmergable => {
            vec![format!("Gameplay Video: {}", record.title), String::new()]
        }
    };

    if let Some(game) = &plan.game_folder {
        lines.push(format!("Spiel: {game}"));
    }

    if let Some(category) = plan.sub_folders.last() {
        lines.push(format!("Kategorie: {category}"));
    }

    lines.push(
        match record.video_type {
            VideoType::Merged => "Status: Sound erfolgreich gemerged",
            VideoType::MicOnly => "Status: Nur Mikrofon-Audio extrahiert",
            VideoType::DesktopOnly => "Status: Nur Game/Desktop-Audio extrahiert",
            VideoType::Unmergable => "Status: Sound war nicht mergbar (Original-Audio)",
        }
        .to_string(),
    );

    lines.push(format!(
        "Aufgenommen am: {}",
        record.recorded_at.format("%d.%m.%Y - %H:%M Uhr")
    ));
    lines.push(String::new());

    if let Some(main) = &plan.main_folder {
        lines.push(format!(
            "Automatisch hochgeladen aus der Sammlung \"{main}\""
        ));
    }

    lines.join("\n")
}

fn build_tags(record: &VideoRecord) -> Vec<String> {
    let plan = &record.playlist_plan;
    let mut tags: Vec<String> = match record.video_type {
        VideoType::MicOnly => vec!["Audio", "Mikrofon", "Mic Only", "Voice", "Deutsch"],
        VideoType::DesktopOnly => vec![
            "Audio",
            "Game Audio",
            "Desktop Audio",
            "Sound Effects",
            "Gaming",
        ],
        VideoType::Merged | VideoType::Unmergable => {
            vec!["Gaming", "Gameplay", "Deutsch", "Let's Play"]
        }
    }
    .into_iter()
    .map(String::from)
    .collect();

    if let Some(game) = &plan.game_folder {
        tags.push(game.clone());
    }

    if let Some(main) = &plan.main_folder {
        tags.push(main.replace(' ', ""));
    }

    for sub in &plan.sub_folders {
        tags.push(sub.clone());
    }

    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::VideoRecord;
    use chrono::{Local, TimeZone};
    use std::path::PathBuf;

    fn record(video_type: VideoType, lineage: &[&str]) -> VideoRecord {
        let lineage: Vec<String> = lineage.iter().map(|s| (*s).to_string()).collect();
        VideoRecord {
            file_path: PathBuf::from("/recordings/merged_Boss_Fight.mp4"),
            file_name: "merged_Boss_Fight.mp4".to_string(),
            title: "Boss Fight".to_string(),
            video_type,
            folder_lineage: lineage.clone(),
            playlist_plan: crate::playlist::PlaylistPlan::from_lineage(&lineage)
                .expect("non-empty lineage"),
            recorded_at: Local
                .with_ymd_and_hms(2025, 7, 14, 21, 30, 0)
                .single()
                .expect("valid timestamp"),
            size_bytes: 10 * 1024 * 1024,
        }
    }

    #[test]
    fn test_privacy_from_str() {
        assert_eq!(
            "unlisted".parse::<PrivacyStatus>().expect("parse"),
            PrivacyStatus::Unlisted
        );
        assert_eq!(
            "PUBLIC".parse::<PrivacyStatus>().expect("parse"),
            PrivacyStatus::Public
        );
        assert!("friends-only".parse::<PrivacyStatus>().is_err());
    }

    #[test]
    fn test_metadata_fixed_fields() {
        let meta = build_metadata(
            &record(VideoType::Merged, &["SPIEL AUFNAHMEN", "GameX"]),
            PrivacyStatus::Unlisted,
        );
        assert_eq!(meta.category_id, GAMING_CATEGORY_ID);
        assert_eq!(meta.default_language, "de");
        assert_eq!(meta.privacy, PrivacyStatus::Unlisted);
        assert_eq!(meta.title, "Boss Fight");
    }

    #[test]
    fn test_description_merged() {
        let meta = build_metadata(
            &record(VideoType::Merged, &["SPIEL AUFNAHMEN", "GameX", "BUG"]),
            PrivacyStatus::Unlisted,
        );
        assert!(meta.description.starts_with("Gameplay Video: Boss Fight"));
        assert!(meta.description.contains("Spiel: GameX"));
        assert!(meta.description.contains("Kategorie: BUG"));
        assert!(meta.description.contains("Status: Sound erfolgreich gemerged"));
        assert!(meta.description.contains("Aufgenommen am: 14.07.2025 - 21:30 Uhr"));
        assert!(
            meta.description
                .contains("Automatisch hochgeladen aus der Sammlung \"SPIEL AUFNAHMEN\"")
        );
    }

    #[test]
    fn test_description_mic_only() {
        let meta = build_metadata(
            &record(VideoType::MicOnly, &["SPIEL AUFNAHMEN", "GameX"]),
            PrivacyStatus::Unlisted,
        );
        assert!(meta.description.starts_with("Mikrofon Audio: Boss Fight"));
        assert!(meta.description.contains("Nur Mikrofon-Aufnahme ohne Desktop-Audio"));
        assert!(meta.description.contains("Status: Nur Mikrofon-Audio extrahiert"));
    }

    #[test]
    fn test_description_desktop_only_and_unmergable_status() {
        let desktop = build_metadata(
            &record(VideoType::DesktopOnly, &["SPIEL AUFNAHMEN"]),
            PrivacyStatus::Unlisted,
        );
        assert!(desktop.description.contains("Status: Nur Game/Desktop-Audio extrahiert"));

        let unmergable = build_metadata(
            &record(VideoType::Unmergable, &["SPIEL AUFNAHMEN"]),
            PrivacyStatus::Unlisted,
        );
        assert!(
            unmergable
                .description
                .contains("Status: Sound war nicht mergbar (Original-Audio)")
        );
    }

    #[test]
    fn test_description_without_game_folder() {
        let meta = build_metadata(
            &record(VideoType::Merged, &["WITZIGE MOMENTE"]),
            PrivacyStatus::Unlisted,
        );
        assert!(!meta.description.contains("Spiel:"));
        assert!(!meta.description.contains("Kategorie:"));
        assert!(meta.description.contains("Sammlung \"WITZIGE MOMENTE\""));
    }

    #[test]
    fn test_tags_merged() {
        let meta = build_metadata(
            &record(VideoType::Merged, &["SPIEL AUFNAHMEN", "GameX", "BUG"]),
            PrivacyStatus::Unlisted,
        );
        assert!(meta.tags.contains(&"Gaming".to_string()));
        assert!(meta.tags.contains(&"Let's Play".to_string()));
        assert!(meta.tags.contains(&"GameX".to_string()));
        assert!(meta.tags.contains(&"BUG".to_string()));
        // Category folder joins with spaces removed.
        assert!(meta.tags.contains(&"SPIELAUFNAHMEN".to_string()));
    }

    #[test]
    fn test_tags_mic_only_base_set() {
        let meta = build_metadata(
            &record(VideoType::MicOnly, &["SPIEL AUFNAHMEN"]),
            PrivacyStatus::Unlisted,
        );
        assert!(meta.tags.contains(&"Mikrofon".to_string()));
        assert!(meta.tags.contains(&"Mic Only".to_string()));
        assert!(!meta.tags.contains(&"Gameplay".to_string()));
    }
}
