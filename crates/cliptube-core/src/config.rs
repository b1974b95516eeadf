//! Run configuration.
//!
//! Settings come from the environment (usually via a `.env` file loaded by
//! the CLI) with sensible defaults; command-line flags override individual
//! values at the call site.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::metadata::PrivacyStatus;
use crate::scan::DEFAULT_CATEGORY_FOLDERS;
use crate::upload::{DEFAULT_UPLOAD_PAUSE, RunOptions};

/// Environment variable naming the recordings root.
pub const ENV_RECORDINGS_PATH: &str = "RECORDINGS_PATH";

/// Environment variable for the uniform upload visibility.
pub const ENV_DEFAULT_VISIBILITY: &str = "DEFAULT_VISIBILITY";

/// Environment variable for the pause between uploads, in seconds.
pub const ENV_UPLOAD_PAUSE_SECS: &str = "UPLOAD_PAUSE_SECS";

/// Application configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploaderConfig {
    /// Recordings root directory, when configured.
    pub recordings_path: Option<PathBuf>,
    /// Visibility applied to every upload.
    pub privacy: PrivacyStatus,
    /// Pause between consecutive uploads, in seconds.
    pub pause_secs: u64,
    /// Top-level category folders scanned under the root.
    pub category_folders: Vec<String>,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            recordings_path: None,
            privacy: PrivacyStatus::default(),
            pause_secs: DEFAULT_UPLOAD_PAUSE.as_secs(),
            category_folders: DEFAULT_CATEGORY_FOLDERS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

impl UploaderConfig {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_RECORDINGS_PATH) {
            config.recordings_path = Some(PathBuf::from(path));
        }

        if let Some(visibility) = lookup(ENV_DEFAULT_VISIBILITY) {
            config.privacy = visibility.parse()?;
        }

        if let Some(pause) = lookup(ENV_UPLOAD_PAUSE_SECS) {
            config.pause_secs = pause.parse().map_err(|_| {
                Error::Configuration(format!(
                    "{ENV_UPLOAD_PAUSE_SECS} must be a number of seconds, got '{pause}'"
                ))
            })?;
        }

        Ok(config)
    }

    /// Resolve the recordings root, honoring a command-line override.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no path is set anywhere, and
    /// [`Error::RecordingsRootNotFound`] when the path does not exist.
    pub fn resolve_root(&self, override_path: Option<PathBuf>) -> Result<PathBuf> {
        let root = override_path
            .or_else(|| self.recordings_path.clone())
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "no recordings path configured - set {ENV_RECORDINGS_PATH} or pass --path"
                ))
            })?;

        if !root.is_dir() {
            return Err(Error::RecordingsRootNotFound(root));
        }
        Ok(root)
    }

    /// Pause between uploads as a [`Duration`].
    #[must_use]
    pub const fn pause(&self) -> Duration {
        Duration::from_secs(self.pause_secs)
    }

    /// Orchestrator options derived from this configuration.
    #[must_use]
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            privacy: self.privacy,
            pause_between_uploads: self.pause(),
            ..RunOptions::default()
        }
    }
}
