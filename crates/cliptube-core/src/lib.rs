//! `Cliptube` Core Library
//!
//! This crate provides the core functionality for the `Cliptube` uploader:
//! - Classification of recording files and upload folders by prefix
//! - Recursive discovery of uploadable recordings with folder lineage
//! - Title normalization, including best-effort umlaut repair
//! - Playlist resolution: every lineage folder becomes a playlist target
//! - Video metadata synthesis (description, tags, visibility)
//! - Resumable chunked uploads with quota-aware retry
//! - Sequential upload orchestration with playlist caching and renaming
//!
//! # Error Handling
//!
//! Run-fatal conditions (missing root, failed authentication) surface as
//! [`Error`]; per-record and per-playlist failures stay values inside the
//! run summary and never abort the batch. See the [`error`] module.
//!
//! ```rust,ignore
//! use cliptube_core::{LibraryScanner, UploadOrchestrator, UploaderConfig};
//!
//! let config = UploaderConfig::from_env()?;
//! let root = config.resolve_root(None)?;
//! let records = LibraryScanner::new(root, config.category_folders.clone()).scan()?;
//! ```

pub mod api;
pub mod auth;
pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod metadata;
pub mod playlist;
pub mod quota;
pub mod scan;
pub mod title;
pub mod transfer;
pub mod upload;

pub use api::{ApiError, ChunkOutcome, RemotePlaylist, UploadSession, VideoHost, YouTubeClient};
pub use auth::{CREDENTIALS_FILE, StoredToken, TOKEN_FILE, TokenStore};
pub use cache::PlaylistCache;
pub use classify::{
    SUPPORTED_FORMATS, UPLOADED_PREFIX, VideoType, classify_contained_file, classify_dir,
    classify_file, is_processed, is_supported_format, strip_type_prefix,
};
pub use config::{
    ENV_DEFAULT_VISIBILITY, ENV_RECORDINGS_PATH, ENV_UPLOAD_PAUSE_SECS, UploaderConfig,
};
pub use error::{Error, Result};
pub use metadata::{
    DEFAULT_LANGUAGE, GAMING_CATEGORY_ID, PrivacyStatus, VideoMetadata, build_metadata,
};
pub use playlist::PlaylistPlan;
pub use quota::{DEFAULT_DAILY_QUOTA, QuotaEstimate, estimate as estimate_quota};
pub use scan::{DEFAULT_CATEGORY_FOLDERS, LibraryScanner, VideoRecord};
pub use title::normalize_title;
pub use transfer::{
    DEFAULT_BACKOFF_BASE, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_RETRIES, ProgressCallback, UploadEngine,
    UploadOptions, UploadProgress, backoff_delay,
};
pub use upload::{
    DEFAULT_UPLOAD_PAUSE, RecordOutcome, RunOptions, RunSummary, UploadOrchestrator,
    UploadOutcome, mark_processed,
};
