//! Liked-tracks feed backed by the Spotify Web API.

pub mod auth;
pub mod client;
pub mod types;
