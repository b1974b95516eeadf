//! OAuth token storage and refresh.
//!
//! The interactive consent flow happens outside this crate; what lands here
//! is the `token.json` the OAuth tooling writes (access token, refresh
//! token, expiry). An expired access token is refreshed against the token
//! endpoint using the client secrets from `credentials.json`. Both files
//! are looked up in the working directory first, then in the user config
//! directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// File holding the authorized-user token.
pub const TOKEN_FILE: &str = "token.json";

/// File holding the OAuth client secrets.
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// Default Google OAuth token endpoint.
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Leeway before the nominal expiry at which a token counts as expired.
const EXPIRY_LEEWAY_SECS: i64 = 60;

/// Stored authorized-user token, in the shape the OAuth tooling writes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredToken {
    /// Current access token.
    pub token: String,
    /// Refresh token, when granted.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Token endpoint.
    #[serde(default)]
    pub token_uri: Option<String>,
    /// OAuth client id.
    #[serde(default)]
    pub client_id: Option<String>,
    /// OAuth client secret.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Granted scopes.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Access token expiry, RFC 3339.
    #[serde(default)]
    pub expiry: Option<String>,
}

impl StoredToken {
    /// Load a token from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::FileSystem {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Persist the token to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| Error::FileSystem {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Whether the access token is past (or within a minute of) its expiry.
    /// A token without a recorded expiry is used as-is.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        let Some(expiry) = &self.expiry else {
            return false;
        };
        DateTime::parse_from_rfc3339(expiry).is_ok_and(|expires_at| {
            expires_at.with_timezone(&Utc)
                <= Utc::now() + ChronoDuration::seconds(EXPIRY_LEEWAY_SECS)
        })
    }
}

#[derive(Debug, Deserialize)]
struct ClientSecrets {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InstalledCredentials {
    installed: ClientSecrets,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Token storage rooted in a directory holding `token.json` and
/// `credentials.json`.
pub struct TokenStore {
    dir: PathBuf,
}

impl TokenStore {
    /// Create a store over an explicit directory.
    #[must_use]
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Locate the store: the working directory when it holds a token file,
    /// otherwise the per-user config directory.
    #[must_use]
    pub fn discover() -> Self {
        let cwd = PathBuf::from(".");
        if cwd.join(TOKEN_FILE).is_file() {
            return Self::new(cwd);
        }
        let config_dir = dirs::config_dir()
            .map_or(cwd, |base| base.join("cliptube"));
        Self::new(config_dir)
    }

    /// Path of the token file.
    #[must_use]
    pub fn token_path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }

    /// Obtain a ready-to-use access token, refreshing it when expired.
    ///
    /// # Errors
    ///
    /// [`Error::Authentication`] when no token is stored, or the token is
    /// expired and cannot be refreshed.
    pub fn access_token(&self) -> Result<String> {
        let token_path = self.token_path();
        if !token_path.is_file() {
            return Err(Error::Authentication(format!(
                "{} not found in {} - authorize the channel first",
                TOKEN_FILE,
                self.dir.display()
            )));
        }

        let token = StoredToken::load(&token_path)?;
        if !token.is_expired() {
            debug!("Stored access token still valid");
            return Ok(token.token);
        }

        info!("Access token expired, refreshing");
        let refreshed = self.refresh(&token)?;
        refreshed.save(&token_path)?;
        Ok(refreshed.token)
    }

    fn refresh(&self, token: &StoredToken) -> Result<StoredToken> {
        let refresh_token = token.refresh_token.clone().ok_or_else(|| {
            Error::Authentication(
                "access token expired and no refresh token stored".to_string(),
            )
        })?;

        let (client_id, client_secret, token_uri) = self.client_secrets(token)?;

        let http = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| Error::Authentication(e.to_string()))?;

        let response = http
            .post(&token_uri)
            .form(&[
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .map_err(|e| Error::Authentication(format!("token refresh failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::Authentication(format!(
                "token refresh rejected (HTTP {status})"
            )));
        }

        let parsed: RefreshResponse = response
            .json()
            .map_err(|e| Error::Authentication(format!("token refresh response: {e}")))?;

        let expiry = parsed
            .expires_in
            .map(|secs| (Utc::now() + ChronoDuration::seconds(secs)).to_rfc3339());

        Ok(StoredToken {
            token: parsed.access_token,
            refresh_token: Some(refresh_token),
            token_uri: Some(token_uri),
            client_id: Some(client_id),
            client_secret: Some(client_secret),
            scopes: token.scopes.clone(),
            expiry,
        })
    }

    /// Client id/secret/endpoint from the token itself, falling back to
    /// `credentials.json`.
    fn client_secrets(&self, token: &StoredToken) -> Result<(String, String, String)> {
        if let (Some(id), Some(secret)) = (&token.client_id, &token.client_secret) {
            let uri = token
                .token_uri
                .clone()
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());
            return Ok((id.clone(), secret.clone(), uri));
        }

        let credentials_path = self.dir.join(CREDENTIALS_FILE);
        if !credentials_path.is_file() {
            return Err(Error::Authentication(format!(
                "{} not found in {} - download the OAuth client secrets",
                CREDENTIALS_FILE,
                self.dir.display()
            )));
        }

        let content = fs::read_to_string(&credentials_path).map_err(|e| Error::FileSystem {
            path: credentials_path.clone(),
            message: e.to_string(),
        })?;
        let credentials: InstalledCredentials = serde_json::from_str(&content)?;
        Ok((
            credentials.installed.client_id,
            credentials.installed.client_secret,
            credentials
                .installed
                .token_uri
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
        ))
    }
}
