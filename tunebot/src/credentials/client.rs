//! Credential client trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::CredentialError;

/// Tokens issued by a client-credentials grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCredentials {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime of the token in whole seconds.
    pub expires_in: u64,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Issues short-lived access tokens for a streaming provider.
///
/// Implementations are expected to bound their own request latency; callers
/// do not retry.
#[async_trait]
pub trait CredentialClient: Send + Sync {
    /// Provider identifier (e.g., "spotify").
    fn provider_id(&self) -> &'static str;

    /// Perform one client-credentials request.
    async fn request_client_credentials(&self) -> Result<ClientCredentials, CredentialError>;
}
