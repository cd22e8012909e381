//! Cached access token.

use std::time::Duration;

use tokio::time::Instant;

/// Last issued access token and the instant it stops being valid.
///
/// A cache that was never filled has no expiry and is never fresh.
#[derive(Debug, Clone, Default)]
pub struct TokenCache {
    token: Option<String>,
    expires_at: Option<Instant>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the cached token is still valid at `now`.
    #[inline]
    pub fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at > now)
    }

    /// Store a newly issued token valid for `lifetime` from `now`.
    ///
    /// Returns `false` and leaves the cache untouched when the expiry
    /// cannot be represented as an `Instant`.
    #[must_use]
    pub fn store(&mut self, token: String, lifetime: Duration, now: Instant) -> bool {
        let Some(expires_at) = now.checked_add(lifetime) else {
            return false;
        };
        self.token = Some(token);
        self.expires_at = Some(expires_at);
        true
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }
}
