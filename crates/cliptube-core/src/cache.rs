//! Run-scoped playlist cache.
//!
//! Playlist name -> id lookups cost API quota, so the full playlist list is
//! fetched once per run and memoized. Entries are written once per name;
//! the cache lives only for the run and is owned by the single processing
//! thread, so no locking is involved.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::api::{ApiError, VideoHost};

/// Process-lifetime memoization of playlist name -> remote id.
#[derive(Debug, Default)]
pub struct PlaylistCache {
    entries: HashMap<String, String>,
    loaded: bool,
}

impl PlaylistCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached playlists.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a playlist id, creating the playlist remotely on a miss.
    ///
    /// The first call bulk-loads the channel's playlists; a load failure is
    /// tolerated (the cache then starts empty and fills through creation).
    pub fn resolve_or_create<H: VideoHost>(
        &mut self,
        host: &H,
        name: &str,
    ) -> Result<String, ApiError> {
        self.ensure_loaded(host);

        if let Some(id) = self.entries.get(name) {
            debug!("Playlist '{name}' resolved from cache");
            return Ok(id.clone());
        }

        let id = host.create_playlist(name)?;
        debug!("Created playlist '{name}' ({id})");
        self.entries.insert(name.to_string(), id.clone());
        Ok(id)
    }

    fn ensure_loaded<H: VideoHost>(&mut self, host: &H) {
        if self.loaded {
            return;
        }
        // Mark loaded either way so a failing list call is not repeated.
        self.loaded = true;

        match host.list_playlists() {
            Ok(playlists) => {
                for playlist in playlists {
                    self.entries.entry(playlist.title).or_insert(playlist.id);
                }
                debug!("Playlist cache loaded with {} entries", self.entries.len());
            }
            Err(e) => {
                warn!("Could not preload playlist cache: {e}");
            }
        }
    }
}
