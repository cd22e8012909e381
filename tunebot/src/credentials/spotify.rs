//! Spotify accounts service client.
//!
//! Implements the client-credentials flow:
//! `POST /api/token` with HTTP basic auth and `grant_type=client_credentials`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::{ClientCredentials, CredentialClient, CredentialError};

/// Token endpoint of the Spotify accounts service.
pub const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Request timeout for the token endpoint.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Spotify client-credentials token issuer.
pub struct SpotifyCredentialClient {
    client_id: String,
    client_secret: String,
    token_url: String,
    client: Client,
}

impl SpotifyCredentialClient {
    /// Create a client for the given id/secret pair.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self::with_token_url(client_id, client_secret, SPOTIFY_TOKEN_URL)
    }

    /// Create a client against a custom token endpoint.
    pub fn with_token_url(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|error| {
                warn!(error = %error, "Failed to build HTTP client; falling back to reqwest defaults");
                Client::new()
            });

        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: token_url.into(),
            client,
        }
    }
}

#[async_trait]
impl CredentialClient for SpotifyCredentialClient {
    fn provider_id(&self) -> &'static str {
        "spotify"
    }

    async fn request_client_credentials(&self) -> Result<ClientCredentials, CredentialError> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(CredentialError::MissingCredentials);
        }

        debug!(url = %self.token_url, "Requesting client credentials");

        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let message = body
                .get("error_description")
                .or_else(|| body.get("error"))
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error")
                .to_string();
            return Err(CredentialError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let credentials: ClientCredentials = serde_json::from_str(&body)
            .map_err(|e| CredentialError::InvalidResponse(e.to_string()))?;

        if credentials.access_token.is_empty() {
            return Err(CredentialError::InvalidResponse(
                "empty access_token".to_string(),
            ));
        }

        debug!(
            expires_in = credentials.expires_in,
            "Received client credentials"
        );
        Ok(credentials)
    }
}
