//! Credential error types.

use thiserror::Error;

/// Errors that can occur while obtaining provider credentials.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Network error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider rejected the request.
    #[error("Provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    /// The provider answered with something we could not understand.
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// No client id/secret configured.
    #[error("No credentials configured")]
    MissingCredentials,
}

impl CredentialError {
    /// Check if this error is transient and may be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Provider { status, .. } => *status == 429 || *status >= 500,
            Self::InvalidResponse(_) | Self::MissingCredentials => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let rate_limited = CredentialError::Provider {
            status: 429,
            message: "slow down".to_string(),
        };
        let unauthorized = CredentialError::Provider {
            status: 401,
            message: "invalid_client".to_string(),
        };
        assert!(rate_limited.is_transient());
        assert!(!unauthorized.is_transient());
        assert!(!CredentialError::MissingCredentials.is_transient());
    }
}
