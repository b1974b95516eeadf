//! Playlist resolution from folder lineages.
//!
//! Every folder on the path from a category folder down to a recording is a
//! meaningful playlist of its own - a top-level collection like
//! "SPIEL AUFNAHMEN" is as valid a playlist as the specific game subfolder.
//! The plan therefore never drops a lineage segment; targets are ordered
//! most-specific first.

use serde::{Deserialize, Serialize};

/// Target playlists derived from a recording's folder lineage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistPlan {
    /// Top-level category folder, when present.
    pub main_folder: Option<String>,
    /// First subfolder under the category folder (the game).
    pub game_folder: Option<String>,
    /// Remaining lineage segments below the game folder.
    pub sub_folders: Vec<String>,
    /// The single most specific playlist the video is filed under.
    pub primary: String,
    /// Full lineage reversed: most specific first, category folder last.
    pub targets: Vec<String>,
}

impl PlaylistPlan {
    /// Derive the plan from an ordered folder lineage.
    ///
    /// Returns `None` for an empty lineage; otherwise `targets` is never
    /// empty and is fully determined by the lineage.
    #[must_use]
    pub fn from_lineage(lineage: &[String]) -> Option<Self> {
        let (first, rest) = lineage.split_first()?;

        let primary = match rest {
            [] => first.clone(),
            // With exactly one subfolder the game folder is the most
            // specific name; deeper lineages use the last segment.
            [game] => game.clone(),
            _ => lineage.last()?.clone(),
        };

        let mut targets: Vec<String> = lineage.to_vec();
        targets.reverse();

        Some(Self {
            main_folder: Some(first.clone()),
            game_folder: rest.first().cloned(),
            sub_folders: rest.get(1..).unwrap_or_default().to_vec(),
            primary,
            targets,
        })
    }

    /// Playlists beyond the primary one, still most-specific first.
    #[must_use]
    pub fn additional(&self) -> Vec<String> {
        self.targets
            .iter()
            .filter(|name| **name != self.primary)
            .cloned()
            .collect()
    }
}
