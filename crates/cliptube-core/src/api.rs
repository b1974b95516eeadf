//! Remote video-host interface.
//!
//! The [`VideoHost`] trait is the seam between the upload pipeline and the
//! network: the transfer engine and orchestrator only ever talk to this
//! trait, so tests drive them with a mock host. [`YouTubeClient`] is the
//! real implementation speaking the YouTube Data API v3 resumable-upload
//! protocol over a blocking HTTP client.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::metadata::VideoMetadata;

/// Base URL for resumable video uploads.
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/youtube/v3/videos";

/// Base URL for metadata endpoints (playlists, playlist items).
const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Request timeout for individual API calls. Chunk uploads move megabytes,
/// so this is generous.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Errors from the remote host, classified for retry policy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Server-side transient failure (5xx class); the same request may
    /// succeed on retry.
    #[error("transient server error (HTTP {status})")]
    Transient {
        /// HTTP status code.
        status: u16,
    },

    /// Daily API quota exhausted. Retrying cannot succeed until the quota
    /// window resets.
    #[error("API quota exceeded")]
    QuotaExceeded,

    /// Credentials rejected.
    #[error("authentication rejected (HTTP {status})")]
    Auth {
        /// HTTP status code.
        status: u16,
    },

    /// Transport-level failure without an HTTP status.
    #[error("network error: {0}")]
    Network(String),

    /// Anything else the API returned that we cannot act on.
    #[error("unexpected API response: {0}")]
    Protocol(String),
}

/// An open resumable upload session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    /// Session-scoped URL all chunks are sent to.
    pub upload_url: String,
}

/// Outcome of sending one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// The server confirmed bytes up to (exclusive) this offset.
    Progress(u64),
    /// The upload is complete; the value is the remote video id.
    Complete(String),
}

/// A playlist known to the remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePlaylist {
    /// Remote playlist id.
    pub id: String,
    /// Display title.
    pub title: String,
}

/// Remote host operations used by the upload pipeline.
#[cfg_attr(test, mockall::automock)]
pub trait VideoHost: Send + Sync {
    /// Open a resumable upload session for a video with the given metadata.
    fn begin_upload(
        &self,
        metadata: &VideoMetadata,
        total_bytes: u64,
    ) -> Result<UploadSession, ApiError>;

    /// Send one chunk of the video starting at `offset`.
    fn upload_chunk(
        &self,
        session: &UploadSession,
        offset: u64,
        total_bytes: u64,
        chunk: &[u8],
    ) -> Result<ChunkOutcome, ApiError>;

    /// List every playlist owned by the authenticated channel.
    fn list_playlists(&self) -> Result<Vec<RemotePlaylist>, ApiError>;

    /// Create a playlist and return its id.
    fn create_playlist(&self, name: &str) -> Result<String, ApiError>;

    /// Insert a video into a playlist.
    fn add_video_to_playlist(&self, playlist_id: &str, video_id: &str) -> Result<(), ApiError>;
}

/// Map an HTTP error status (plus response body) onto the retry taxonomy.
fn classify_status(status: u16, body: &str) -> ApiError {
    match status {
        500 | 502 | 503 | 504 => ApiError::Transient { status },
        401 => ApiError::Auth { status },
        403 if body.contains("quotaExceeded") => ApiError::QuotaExceeded,
        _ => {
            let snippet: String = body.chars().take(200).collect();
            ApiError::Protocol(format!("HTTP {status}: {snippet}"))
        }
    }
}

/// Parse the committed end offset out of a 308 `Range` header
/// (`bytes=0-12345` means 12346 bytes are durable).
fn parse_committed_range(range: &str) -> Option<u64> {
    let (_, end) = range.rsplit_once('-')?;
    end.trim().parse::<u64>().ok().map(|e| e + 1)
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistSnippet {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistResource {
    id: String,
    snippet: PlaylistSnippet,
}

#[derive(Debug, Deserialize)]
struct PlaylistListResponse {
    #[serde(default)]
    items: Vec<PlaylistResource>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

/// Blocking YouTube Data API v3 client.
pub struct YouTubeClient {
    http: reqwest::blocking::Client,
    access_token: String,
}

impl YouTubeClient {
    /// Create a client with a ready-to-use OAuth access token.
    pub fn new(access_token: String) -> Result<Self, ApiError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self { http, access_token })
    }

    fn send(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<reqwest::blocking::Response, ApiError> {
        request
            .bearer_auth(&self.access_token)
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    fn check(
        &self,
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let code = status.as_u16();
        let body = response.text().unwrap_or_default();
        Err(classify_status(code, &body))
    }
}

impl VideoHost for YouTubeClient {
    fn begin_upload(
        &self,
        metadata: &VideoMetadata,
        total_bytes: u64,
    ) -> Result<UploadSession, ApiError> {
        let body = json!({
            "snippet": {
                "title": metadata.title,
                "description": metadata.description,
                "tags": metadata.tags,
                "categoryId": metadata.category_id,
                "defaultLanguage": metadata.default_language,
                "defaultAudioLanguage": metadata.default_language,
            },
            "status": {
                "privacyStatus": metadata.privacy.as_str(),
                "selfDeclaredMadeForKids": false,
                "embeddable": true,
                "license": "youtube",
                "publicStatsViewable": true,
            },
        });

        let request = self
            .http
            .post(format!(
                "{UPLOAD_URL}?uploadType=resumable&part=snippet,status"
            ))
            .header("X-Upload-Content-Length", total_bytes)
            .header("X-Upload-Content-Type", "video/*")
            .json(&body);

        let response = self.check(self.send(request)?)?;
        let upload_url = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| {
                ApiError::Protocol("resumable session response had no Location header".to_string())
            })?;

        debug!("Opened resumable upload session ({total_bytes} bytes)");
        Ok(UploadSession { upload_url })
    }

    fn upload_chunk(
        &self,
        session: &UploadSession,
        offset: u64,
        total_bytes: u64,
        chunk: &[u8],
    ) -> Result<ChunkOutcome, ApiError> {
        let end = offset + chunk.len() as u64 - 1;
        let request = self
            .http
            .put(&session.upload_url)
            .header(
                reqwest::header::CONTENT_RANGE,
                format!("bytes {offset}-{end}/{total_bytes}"),
            )
            .body(chunk.to_vec());

        let response = self.send(request)?;
        let status = response.status().as_u16();

        // 308 Resume Incomplete: the Range header carries the durable bytes.
        if status == 308 {
            let committed = response
                .headers()
                .get(reqwest::header::RANGE)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_committed_range)
                .unwrap_or(offset + chunk.len() as u64);
            return Ok(ChunkOutcome::Progress(committed));
        }

        let response = self.check(response)?;
        let parsed: IdResponse = response
            .json()
            .map_err(|e| ApiError::Protocol(format!("final upload response: {e}")))?;
        Ok(ChunkOutcome::Complete(parsed.id))
    }

    fn list_playlists(&self) -> Result<Vec<RemotePlaylist>, ApiError> {
        let mut playlists = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.http.get(format!("{API_BASE}/playlists")).query(&[
                ("part", "snippet"),
                ("mine", "true"),
                ("maxResults", "50"),
            ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = self.check(self.send(request)?)?;
            let parsed: PlaylistListResponse = response
                .json()
                .map_err(|e| ApiError::Protocol(format!("playlist list response: {e}")))?;

            playlists.extend(parsed.items.into_iter().map(|item| RemotePlaylist {
                id: item.id,
                title: item.snippet.title,
            }));

            match parsed.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(playlists)
    }

    fn create_playlist(&self, name: &str) -> Result<String, ApiError> {
        let body = json!({
            "snippet": {
                "title": name,
                "description": format!("Automatisch erstellte Playlist für {name} Videos"),
                "defaultLanguage": "de",
            },
            "status": {
                "privacyStatus": "unlisted",
            },
        });

        let request = self
            .http
            .post(format!("{API_BASE}/playlists"))
            .query(&[("part", "snippet,status")])
            .json(&body);

        let response = self.check(self.send(request)?)?;
        let parsed: IdResponse = response
            .json()
            .map_err(|e| ApiError::Protocol(format!("playlist create response: {e}")))?;
        Ok(parsed.id)
    }

    fn add_video_to_playlist(&self, playlist_id: &str, video_id: &str) -> Result<(), ApiError> {
        let body = json!({
            "snippet": {
                "playlistId": playlist_id,
                "resourceId": {
                    "kind": "youtube#video",
                    "videoId": video_id,
                },
            },
        });

        let request = self
            .http
            .post(format!("{API_BASE}/playlistItems"))
            .query(&[("part", "snippet")])
            .json(&body);

        self.check(self.send(request)?)?;
        Ok(())
    }
}
