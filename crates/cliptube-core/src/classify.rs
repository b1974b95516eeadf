//! Path classification for recording files and upload folders.
//!
//! Decides whether a directory entry is an eligible, not-yet-uploaded
//! recording, an upload folder whose whole subtree is upload-ready, or a
//! plain directory that is only scanned for further nesting.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// File extensions accepted as uploadable recordings.
pub const SUPPORTED_FORMATS: &[&str] = &[
    ".mp4", ".avi", ".mov", ".mkv", ".webm", ".flv", ".aac", ".mp3", ".wav", ".m4a",
];

/// Prefix applied to a file after a confirmed successful upload.
pub const UPLOADED_PREFIX: &str = "uploaded_";

/// How a recording was produced, derived from its filename or containing
/// upload folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoType {
    /// Game and microphone audio merged into one track.
    Merged,
    /// Audio tracks could not be merged; original audio kept.
    Unmergable,
    /// Microphone track only.
    MicOnly,
    /// Game/desktop audio track only.
    DesktopOnly,
}

impl VideoType {
    /// All recognized type prefixes, in match order.
    pub const ALL: &'static [Self] = &[
        Self::Merged,
        Self::Unmergable,
        Self::MicOnly,
        Self::DesktopOnly,
    ];

    /// The filename prefix carried by recordings of this type.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Merged => "merged_",
            Self::Unmergable => "unmergable_",
            Self::MicOnly => "onlymic_",
            Self::DesktopOnly => "onlydesktop_",
        }
    }

    /// Detect the type from a file or folder name, if it carries a prefix.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| name.starts_with(t.prefix()))
    }
}

impl std::fmt::Display for VideoType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Merged => write!(f, "merged"),
            Self::Unmergable => write!(f, "unmergable"),
            Self::MicOnly => write!(f, "onlymic"),
            Self::DesktopOnly => write!(f, "onlydesktop"),
        }
    }
}

/// Check whether a path has one of the supported media extensions.
#[must_use]
pub fn is_supported_format(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            let dotted = format!(".{}", ext.to_lowercase());
            SUPPORTED_FORMATS.contains(&dotted.as_str())
        })
}

/// Check whether a file name carries the processed marker.
#[must_use]
pub fn is_processed(name: &str) -> bool {
    name.starts_with(UPLOADED_PREFIX)
}

/// Classify a standalone file: eligible only with a supported extension,
/// a recognized type prefix, and no processed marker.
///
/// Fails closed: anything not positively matched is excluded.
#[must_use]
pub fn classify_file(path: &Path) -> Option<VideoType> {
    if !is_supported_format(path) {
        return None;
    }
    let name = path.file_name().and_then(|n| n.to_str())?;
    if is_processed(name) {
        return None;
    }
    VideoType::from_name(name)
}

/// Classify a file found inside an upload folder.
///
/// Every supported, unprocessed file in the subtree is eligible. The folder's
/// type applies unless the file carries its own recognized prefix, which
/// wins. (Open question: whether the folder should override a conflicting
/// file prefix instead - the documented behavior is preserved here.)
#[must_use]
pub fn classify_contained_file(path: &Path, folder_type: VideoType) -> Option<VideoType> {
    if !is_supported_format(path) {
        return None;
    }
    let name = path.file_name().and_then(|n| n.to_str())?;
    if is_processed(name) {
        return None;
    }
    Some(VideoType::from_name(name).unwrap_or(folder_type))
}

/// Classify a directory name: an upload folder carries a type prefix and no
/// processed marker; anything else is a plain directory.
#[must_use]
pub fn classify_dir(name: &str) -> Option<VideoType> {
    if is_processed(name) {
        return None;
    }
    VideoType::from_name(name)
}

/// Strip a recognized type prefix from a name, for clean lineage segments.
#[must_use]
pub fn strip_type_prefix(name: &str) -> &str {
    for video_type in VideoType::ALL {
        if let Some(rest) = name.strip_prefix(video_type.prefix()) {
            return rest;
        }
    }
    name
}
