use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::config::SpotifyCredentials;
use crate::error::ReconcileError;
use crate::services::spotify::types::{CachedToken, SpotifyTokenResponse};

const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub(crate) const SERVICE: &str = "Spotify";

/// Tokens this close to expiry are treated as expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum RefreshTokenError {
    #[error("Invalid refresh token: {reason}")]
    InvalidRefreshToken { reason: String },
    #[error("Token endpoint answered {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Failed to parse response: {0}")]
    FailedToParseResponse(reqwest::Error),
}

impl From<RefreshTokenError> for ReconcileError {
    fn from(error: RefreshTokenError) -> Self {
        match error {
            RefreshTokenError::InvalidRefreshToken { reason } => ReconcileError::RemoteAuth {
                service: SERVICE.to_string(),
                reason,
            },
            other => ReconcileError::Remote {
                service: SERVICE.to_string(),
                operation: "refresh access token".to_string(),
                error_message: other.to_string(),
            },
        }
    }
}

/// Refresh an access token using a refresh token
pub async fn refresh_access_token(
    client: &reqwest::Client,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<SpotifyTokenResponse, RefreshTokenError> {
    let mut params = HashMap::new();
    params.insert("grant_type", "refresh_token");
    params.insert("refresh_token", refresh_token);
    params.insert("client_id", client_id);

    let response = client
        .post(SPOTIFY_TOKEN_URL)
        .form(&params)
        .basic_auth(client_id, Some(client_secret))
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .map_err(RefreshTokenError::FailedToSendRequest)?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no response body>".to_string());
        return Err(rejected_refresh(status, body));
    }

    response
        .json()
        .await
        .map_err(RefreshTokenError::FailedToParseResponse)
}

/// Only 400 (`invalid_grant` and friends) and 401 mean the credentials were refused.
/// Rate limits and server errors leave the refresh token and the cache alone.
fn rejected_refresh(status: reqwest::StatusCode, body: String) -> RefreshTokenError {
    match status {
        reqwest::StatusCode::BAD_REQUEST | reqwest::StatusCode::UNAUTHORIZED => {
            RefreshTokenError::InvalidRefreshToken { reason: body }
        }
        _ => RefreshTokenError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        },
    }
}

pub fn load_cached_token(path: &Path, now: i64) -> Option<CachedToken> {
    let contents = std::fs::read_to_string(path).ok()?;
    let token: CachedToken = match serde_json::from_str(&contents) {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!("Ignoring unreadable token cache {}: {}", path.display(), e);
            return None;
        }
    };
    (token.expires_at - EXPIRY_MARGIN_SECS > now).then_some(token)
}

pub fn store_cached_token(path: &Path, token: &CachedToken) {
    let result = path
        .parent()
        .map_or(Ok(()), std::fs::create_dir_all)
        .and_then(|_| {
            let contents = serde_json::to_string(token).map_err(std::io::Error::other)?;
            std::fs::write(path, contents)
        });
    if let Err(e) = result {
        tracing::warn!("Failed to write token cache {}: {}", path.display(), e);
    }
}

/// Remove the token cache so the next run starts from the refresh token.
pub fn invalidate_cached_token(path: &Path) {
    if path.exists() {
        match std::fs::remove_file(path) {
            Ok(()) => println!(
                "Removed {}. Please re-run to re-authenticate with Spotify.",
                path.display()
            ),
            Err(e) => tracing::warn!("Failed to remove token cache {}: {}", path.display(), e),
        }
    } else {
        println!(
            "No token cache found to remove. Please check your credentials and re-authenticate."
        );
    }
}

/// A usable access token: cached if still fresh, otherwise refreshed and cached.
pub async fn access_token(
    client: &reqwest::Client,
    credentials: &SpotifyCredentials,
) -> Result<String, ReconcileError> {
    let now = chrono::Utc::now().timestamp();
    if let Some(cached) = load_cached_token(&credentials.token_cache, now) {
        tracing::debug!("Using cached Spotify access token");
        return Ok(cached.access_token);
    }

    tracing::debug!("Refreshing Spotify access token");
    let response = match refresh_access_token(
        client,
        &credentials.client_id,
        &credentials.client_secret,
        &credentials.refresh_token,
    )
    .await
    {
        Ok(response) => response,
        Err(e) => {
            let error = ReconcileError::from(e);
            if matches!(error, ReconcileError::RemoteAuth { .. }) {
                invalidate_cached_token(&credentials.token_cache);
            }
            return Err(error);
        }
    };

    let token = CachedToken {
        access_token: response.access_token,
        expires_at: now + response.expires_in as i64,
    };
    store_cached_token(&credentials.token_cache, &token);
    Ok(token.access_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_round_trip_and_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("token.json");
        let token = CachedToken {
            access_token: "abc".into(),
            expires_at: 10_000,
        };

        store_cached_token(&path, &token);

        assert_eq!(load_cached_token(&path, 5_000), Some(token));
        // Inside the expiry margin.
        assert_eq!(load_cached_token(&path, 9_950), None);
        assert_eq!(load_cached_token(&path, 20_000), None);
    }

    #[test]
    fn test_corrupt_cache_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(load_cached_token(&path, 0), None);
    }

    #[test]
    fn test_invalidate_removes_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "{}").unwrap();

        invalidate_cached_token(&path);
        assert!(!path.exists());

        // Missing file is fine.
        invalidate_cached_token(&path);
    }

    #[test]
    fn test_rejected_refresh_is_auth_error() {
        let error = ReconcileError::from(RefreshTokenError::InvalidRefreshToken {
            reason: "invalid_grant".into(),
        });
        assert!(matches!(error, ReconcileError::RemoteAuth { .. }));
        assert!(error.is_fatal());
    }

    #[test]
    fn test_only_refused_credentials_are_auth_errors() {
        for status in [reqwest::StatusCode::BAD_REQUEST, reqwest::StatusCode::UNAUTHORIZED] {
            let error = ReconcileError::from(rejected_refresh(status, "invalid_grant".into()));
            assert!(matches!(error, ReconcileError::RemoteAuth { .. }));
        }

        for status in [
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            reqwest::StatusCode::SERVICE_UNAVAILABLE,
        ] {
            let error = ReconcileError::from(rejected_refresh(status, "try later".into()));
            match error {
                ReconcileError::Remote { error_message, .. } => {
                    assert!(error_message.contains(&status.as_u16().to_string()));
                }
                other => panic!("expected a remote error, got {other:?}"),
            }
        }
    }
}
