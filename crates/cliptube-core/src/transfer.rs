//! Resumable chunked upload engine.
//!
//! Drives a [`VideoHost`](crate::api::VideoHost) upload session to
//! completion: the file is sent in fixed-size chunks, transient server
//! errors are retried with exponential backoff up to a small cap, and a
//! quota-exhaustion rejection fails immediately without retry since it
//! cannot succeed until the quota window resets.
//!
//! Progress observations are monotonically increasing byte counts and exist
//! for display only; they never influence control flow.

use std::cmp::min;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::api::{ApiError, ChunkOutcome, VideoHost};
use crate::error::{Error, Result};
use crate::metadata::VideoMetadata;

/// Default chunk size (5 MiB) - large enough for throughput, small enough
/// for regular progress updates.
pub const DEFAULT_CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// Minimum chunk size allowed (1 KiB).
pub const MIN_CHUNK_SIZE: usize = 1024;

/// Maximum chunk size allowed (64 MiB).
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Default number of retries per chunk for transient errors.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for exponential backoff.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(2);

/// Backoff before retry `attempt` (1-based): the base delay doubles with
/// each attempt.
#[must_use]
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.saturating_pow(attempt.saturating_sub(1))
}

/// Configuration options for the upload engine.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Size of each chunk in bytes.
    pub chunk_size: usize,
    /// Maximum retries per chunk on transient errors.
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries.
    pub backoff_base: Duration,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }
}

impl UploadOptions {
    /// Validate options and return an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size < MIN_CHUNK_SIZE {
            return Err(Error::Configuration(format!(
                "chunk_size must be at least {MIN_CHUNK_SIZE} bytes"
            )));
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(Error::Configuration(format!(
                "chunk_size must be at most {MAX_CHUNK_SIZE} bytes"
            )));
        }
        Ok(())
    }
}

/// Byte-progress observation emitted while a file uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadProgress {
    /// Name of the file being uploaded.
    pub file_name: String,
    /// Bytes the server has confirmed so far.
    pub bytes_sent: u64,
    /// Total size of the file.
    pub total_bytes: u64,
}

impl UploadProgress {
    /// Progress as a percentage (0.0 - 100.0).
    #[must_use]
    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 100.0;
        }
        (self.bytes_sent as f64 / self.total_bytes as f64) * 100.0
    }
}

/// Progress callback for upload operations.
pub type ProgressCallback = Box<dyn Fn(UploadProgress) + Send + Sync>;

/// Engine performing resumable chunked uploads.
pub struct UploadEngine {
    options: UploadOptions,
}

impl Default for UploadEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadEngine {
    /// Create an engine with default options.
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: UploadOptions::default(),
        }
    }

    /// Create an engine with explicit options.
    #[must_use]
    pub const fn with_options(options: UploadOptions) -> Self {
        Self { options }
    }

    /// Upload a file and return the remote video id.
    ///
    /// # Errors
    ///
    /// - [`Error::QuotaExceeded`] when the host reports quota exhaustion -
    ///   never retried.
    /// - [`Error::UploadFailed`] when the retry cap is exceeded or the host
    ///   rejects the upload for any other reason.
    pub fn upload_file<H: VideoHost>(
        &self,
        host: &H,
        path: &Path,
        metadata: &VideoMetadata,
        progress: Option<&ProgressCallback>,
    ) -> Result<String> {
        self.options.validate()?;

        let file_name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().to_string());

        let total_bytes = fs::metadata(path)
            .map_err(|e| Error::FileSystem {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
            .len();

        if total_bytes == 0 {
            return Err(Error::UploadFailed(format!("{file_name} is empty")));
        }

        let session = host
            .begin_upload(metadata, total_bytes)
            .map_err(map_api_error)?;

        let mut file = File::open(path).map_err(|e| Error::FileSystem {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        info!("Uploading {file_name} ({total_bytes} bytes)");

        let mut buffer = vec![0u8; self.options.chunk_size];
        let mut offset: u64 = 0;
        let mut reported: u64 = 0;

        while offset < total_bytes {
            let want = min(self.options.chunk_size as u64, total_bytes - offset) as usize;
            file.seek(SeekFrom::Start(offset)).map_err(Error::Io)?;
            file.read_exact(&mut buffer[..want]).map_err(Error::Io)?;

            let mut attempts: u32 = 0;
            loop {
                match host.upload_chunk(&session, offset, total_bytes, &buffer[..want]) {
                    Ok(ChunkOutcome::Progress(committed)) => {
                        if committed <= offset {
                            return Err(Error::UploadFailed(format!(
                                "{file_name}: server made no forward progress at offset {offset}"
                            )));
                        }
                        offset = min(committed, total_bytes);
                        if offset > reported {
                            reported = offset;
                            if let Some(callback) = progress {
                                callback(UploadProgress {
                                    file_name: file_name.clone(),
                                    bytes_sent: reported,
                                    total_bytes,
                                });
                            }
                        }
                        break;
                    }
                    Ok(ChunkOutcome::Complete(video_id)) => {
                        if let Some(callback) = progress {
                            callback(UploadProgress {
                                file_name: file_name.clone(),
                                bytes_sent: total_bytes,
                                total_bytes,
                            });
                        }
                        info!("Upload complete: {file_name} -> {video_id}");
                        return Ok(video_id);
                    }
                    Err(ApiError::Transient { status }) => {
                        attempts += 1;
                        if attempts > self.options.max_retries {
                            return Err(Error::UploadFailed(format!(
                                "{file_name}: giving up after {} retries (HTTP {status})",
                                self.options.max_retries
                            )));
                        }
                        let delay = backoff_delay(self.options.backoff_base, attempts);
                        warn!(
                            "Transient error (HTTP {status}) at offset {offset}, retry {attempts}/{} in {delay:?}",
                            self.options.max_retries
                        );
                        std::thread::sleep(delay);
                    }
                    Err(ApiError::QuotaExceeded) => {
                        warn!("Quota exhausted while uploading {file_name}");
                        return Err(Error::QuotaExceeded);
                    }
                    Err(e) => {
                        return Err(Error::UploadFailed(format!("{file_name}: {e}")));
                    }
                }
            }
            debug!("{file_name}: {offset}/{total_bytes} bytes committed");
        }

        Err(Error::UploadFailed(format!(
            "{file_name}: server never acknowledged completion"
        )))
    }
}

fn map_api_error(error: ApiError) -> Error {
    match error {
        ApiError::QuotaExceeded => Error::QuotaExceeded,
        other => Error::Api(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockVideoHost, UploadSession};
    use crate::metadata::{PrivacyStatus, VideoMetadata};
    use std::fs;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;
    use tempfile::TempDir;

    fn test_metadata() -> VideoMetadata {
        VideoMetadata {
            title: "Boss Fight".to_string(),
            description: "Gameplay Video: Boss Fight".to_string(),
            tags: vec!["Gaming".to_string()],
            category_id: "20".to_string(),
            default_language: "de".to_string(),
            privacy: PrivacyStatus::Unlisted,
        }
    }

    fn test_file(dir: &TempDir, name: &str, size: usize) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, vec![0x41u8; size]).expect("write test file");
        path
    }

    fn small_options() -> UploadOptions {
        UploadOptions {
            chunk_size: MIN_CHUNK_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: Duration::from_millis(1),
        }
    }

    fn expect_session(mock: &mut MockVideoHost) {
        mock.expect_begin_upload().returning(|_, _| {
            Ok(UploadSession {
                upload_url: "https://upload.example/session".to_string(),
            })
        });
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let base = Duration::from_secs(2);
        assert_eq!(backoff_delay(base, 1), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(4));
        assert_eq!(backoff_delay(base, 3), Duration::from_secs(8));
    }

    #[test]
    fn test_options_validate() {
        assert!(UploadOptions::default().validate().is_ok());

        let mut options = UploadOptions::default();
        options.chunk_size = MIN_CHUNK_SIZE - 1;
        assert!(options.validate().is_err());

        options.chunk_size = MAX_CHUNK_SIZE + 1;
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_upload_single_chunk_success() {
        let dir = TempDir::new().expect("temp dir");
        let path = test_file(&dir, "clip.mp4", 100);

        let mut mock = MockVideoHost::new();
        expect_session(&mut mock);
        mock.expect_upload_chunk()
            .times(1)
            .returning(|_, _, _, _| Ok(ChunkOutcome::Complete("vid123".to_string())));

        let engine = UploadEngine::with_options(small_options());
        let id = engine
            .upload_file(&mock, &path, &test_metadata(), None)
            .expect("upload succeeds");
        assert_eq!(id, "vid123");
    }

    #[test]
    fn test_upload_multiple_chunks_with_monotonic_progress() {
        let dir = TempDir::new().expect("temp dir");
        let path = test_file(&dir, "clip.mp4", MIN_CHUNK_SIZE * 3);
        let total = (MIN_CHUNK_SIZE * 3) as u64;

        let mut mock = MockVideoHost::new();
        expect_session(&mut mock);
        mock.expect_upload_chunk()
            .times(3)
            .returning(move |_, offset, _, chunk| {
                let committed = offset + chunk.len() as u64;
                if committed == total {
                    Ok(ChunkOutcome::Complete("vid456".to_string()))
                } else {
                    Ok(ChunkOutcome::Progress(committed))
                }
            });

        let observed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&observed);
        let callback: ProgressCallback = Box::new(move |p| {
            sink.lock().expect("progress lock").push(p.bytes_sent);
        });

        let engine = UploadEngine::with_options(small_options());
        let id = engine
            .upload_file(&mock, &path, &test_metadata(), Some(&callback))
            .expect("upload succeeds");
        assert_eq!(id, "vid456");

        let observed = observed.lock().expect("progress lock");
        assert!(!observed.is_empty());
        assert!(observed.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*observed.last().expect("final progress"), total);
    }

    #[test]
    fn test_transient_errors_retried_then_success() {
        let dir = TempDir::new().expect("temp dir");
        let path = test_file(&dir, "clip.mp4", 100);

        let mut mock = MockVideoHost::new();
        expect_session(&mut mock);

        let mut seq = mockall::Sequence::new();
        mock.expect_upload_chunk()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Err(ApiError::Transient { status: 503 }));
        mock.expect_upload_chunk()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Ok(ChunkOutcome::Complete("vid789".to_string())));

        let engine = UploadEngine::with_options(small_options());
        let started = Instant::now();
        let id = engine
            .upload_file(&mock, &path, &test_metadata(), None)
            .expect("upload succeeds after retries");
        assert_eq!(id, "vid789");

        // Two backoff waits: 1ms + 2ms.
        assert!(started.elapsed() >= Duration::from_millis(3));
    }

    #[test]
    fn test_retry_cap_converts_to_fatal() {
        let dir = TempDir::new().expect("temp dir");
        let path = test_file(&dir, "clip.mp4", 100);

        let mut mock = MockVideoHost::new();
        expect_session(&mut mock);
        // Initial attempt plus max_retries retries.
        mock.expect_upload_chunk()
            .times(1 + DEFAULT_MAX_RETRIES as usize)
            .returning(|_, _, _, _| Err(ApiError::Transient { status: 500 }));

        let engine = UploadEngine::with_options(small_options());
        let err = engine
            .upload_file(&mock, &path, &test_metadata(), None)
            .expect_err("upload must fail");
        assert!(matches!(err, Error::UploadFailed(_)));
    }

    #[test]
    fn test_quota_exhaustion_fails_immediately() {
        let dir = TempDir::new().expect("temp dir");
        let path = test_file(&dir, "clip.mp4", 100);

        let mut mock = MockVideoHost::new();
        expect_session(&mut mock);
        mock.expect_upload_chunk()
            .times(1)
            .returning(|_, _, _, _| Err(ApiError::QuotaExceeded));

        let engine = UploadEngine::with_options(small_options());
        let err = engine
            .upload_file(&mock, &path, &test_metadata(), None)
            .expect_err("upload must fail");
        assert!(matches!(err, Error::QuotaExceeded));
    }

    #[test]
    fn test_quota_exhaustion_at_session_start() {
        let dir = TempDir::new().expect("temp dir");
        let path = test_file(&dir, "clip.mp4", 100);

        let mut mock = MockVideoHost::new();
        mock.expect_begin_upload()
            .times(1)
            .returning(|_, _| Err(ApiError::QuotaExceeded));

        let engine = UploadEngine::with_options(small_options());
        let err = engine
            .upload_file(&mock, &path, &test_metadata(), None)
            .expect_err("upload must fail");
        assert!(matches!(err, Error::QuotaExceeded));
    }

    #[test]
    fn test_other_errors_are_fatal_without_retry() {
        let dir = TempDir::new().expect("temp dir");
        let path = test_file(&dir, "clip.mp4", 100);

        let mut mock = MockVideoHost::new();
        expect_session(&mut mock);
        mock.expect_upload_chunk()
            .times(1)
            .returning(|_, _, _, _| Err(ApiError::Protocol("HTTP 400: bad".to_string())));

        let engine = UploadEngine::with_options(small_options());
        let err = engine
            .upload_file(&mock, &path, &test_metadata(), None)
            .expect_err("upload must fail");
        assert!(matches!(err, Error::UploadFailed(_)));
    }

    #[test]
    fn test_missing_file_is_filesystem_error() {
        let mock = MockVideoHost::new();
        let engine = UploadEngine::new();
        let err = engine
            .upload_file(
                &mock,
                Path::new("/nonexistent/clip.mp4"),
                &test_metadata(),
                None,
            )
            .expect_err("upload must fail");
        assert!(matches!(err, Error::FileSystem { .. }));
    }

    #[test]
    fn test_no_forward_progress_is_fatal() {
        let dir = TempDir::new().expect("temp dir");
        let path = test_file(&dir, "clip.mp4", 100);

        let mut mock = MockVideoHost::new();
        expect_session(&mut mock);
        mock.expect_upload_chunk()
            .times(1)
            .returning(|_, offset, _, _| Ok(ChunkOutcome::Progress(offset)));

        let engine = UploadEngine::with_options(small_options());
        let err = engine
            .upload_file(&mock, &path, &test_metadata(), None)
            .expect_err("upload must fail");
        assert!(matches!(err, Error::UploadFailed(_)));
    }

    #[test]
    fn test_progress_percent() {
        let progress = UploadProgress {
            file_name: "clip.mp4".to_string(),
            bytes_sent: 250,
            total_bytes: 1000,
        };
        assert!((progress.percent() - 25.0).abs() < 0.01);

        let empty = UploadProgress {
            file_name: "clip.mp4".to_string(),
            bytes_sent: 0,
            total_bytes: 0,
        };
        assert!((empty.percent() - 100.0).abs() < 0.01);
    }
}
