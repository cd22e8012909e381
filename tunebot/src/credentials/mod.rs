//! Streaming-provider credentials.
//!
//! - [`CredentialClient`]: issues short-lived access tokens (client-credentials flow)
//! - [`SpotifyCredentialClient`]: `reqwest` implementation against the Spotify accounts service
//! - [`TokenCache`]: the last issued token and its absolute expiry

mod cache;
mod client;
mod error;
mod spotify;

pub use cache::TokenCache;
pub use client::{ClientCredentials, CredentialClient};
pub use error::CredentialError;
pub use spotify::{SPOTIFY_TOKEN_URL, SpotifyCredentialClient};
