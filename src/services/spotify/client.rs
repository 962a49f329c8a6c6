use std::time::Duration;

use reqwest::StatusCode;

use crate::config::SpotifyCredentials;
use crate::error::ReconcileError;
use crate::ledger::FeedItem;
use crate::ports::feed::LikedTracksFeed;
use crate::services::spotify::auth::{SERVICE, access_token, invalidate_cached_token};
use crate::services::spotify::types::{SavedTracksPage, SpotifyTrack};

const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
/// Largest page `/me/tracks` will return.
const MAX_PAGE_SIZE: u32 = 50;

/// The user's Spotify "Liked Songs", read through the Web API.
pub struct SpotifyLikedTracks {
    client: reqwest::Client,
    credentials: SpotifyCredentials,
}

impl SpotifyLikedTracks {
    pub fn new(credentials: SpotifyCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
        }
    }
}

#[async_trait::async_trait]
impl LikedTracksFeed for SpotifyLikedTracks {
    #[tracing::instrument(skip(self))]
    async fn recent_liked_tracks(&self, limit: u32) -> Result<Vec<FeedItem>, ReconcileError> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let token = access_token(&self.client, &self.credentials).await?;
        let remote_error = |error_message: String| ReconcileError::Remote {
            service: SERVICE.to_string(),
            operation: "fetch liked tracks".to_string(),
            error_message,
        };

        let response = self
            .client
            .get(format!("{}/me/tracks", SPOTIFY_API_URL))
            .query(&[("limit", limit)])
            .bearer_auth(&token)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| remote_error(format!("Failed to send http request: {}", e)))?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            invalidate_cached_token(&self.credentials.token_cache);
            return Err(ReconcileError::RemoteAuth {
                service: SERVICE.to_string(),
                reason: format!("{} while fetching liked tracks", status),
            });
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error text".to_string());
            return Err(remote_error(format!("{}: {}", status, body)));
        }

        let page: SavedTracksPage = response
            .json()
            .await
            .map_err(|e| remote_error(format!("Failed to parse response: {}", e)))?;
        tracing::debug!("Fetched {} liked tracks", page.items.len());

        Ok(page
            .items
            .into_iter()
            .map(|saved| feed_item(saved.track))
            .collect())
    }
}

/// The first credited artist is the one recorded in the ledger.
fn feed_item(track: SpotifyTrack) -> FeedItem {
    FeedItem {
        title: track.name,
        artist: track
            .artists
            .into_iter()
            .next()
            .map(|artist| artist.name)
            .unwrap_or_default(),
        album: track.album.name,
        uri: track.uri,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_maps_to_feed_items() {
        let page: SavedTracksPage = serde_json::from_str(
            r#"{
                "href": "https://api.spotify.com/v1/me/tracks?offset=0&limit=2",
                "items": [
                    {
                        "added_at": "2024-03-01T10:00:00Z",
                        "track": {
                            "name": "Everything In Its Right Place",
                            "uri": "spotify:track:2kRFrWaLWiKq48YYVdGcm8",
                            "artists": [{"name": "Radiohead"}, {"name": "Guest"}],
                            "album": {"name": "Kid A"}
                        }
                    },
                    {
                        "added_at": "2024-02-28T10:00:00Z",
                        "track": {
                            "name": "Untitled",
                            "uri": "spotify:track:abc",
                            "artists": [],
                            "album": {"name": ""}
                        }
                    }
                ]
            }"#,
        )
        .unwrap();

        let items: Vec<FeedItem> = page.items.into_iter().map(|s| feed_item(s.track)).collect();

        assert_eq!(items[0].title, "Everything In Its Right Place");
        assert_eq!(items[0].artist, "Radiohead");
        assert_eq!(items[0].album, "Kid A");
        assert_eq!(
            items[0].link().as_deref(),
            Some("https://open.spotify.com/track/2kRFrWaLWiKq48YYVdGcm8")
        );
        assert_eq!(items[1].artist, "");
    }
}
