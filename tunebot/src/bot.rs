//! The bot coordinator.
//!
//! [`Bot`] owns the long-lived subsystems (session registry, playlist store,
//! now-playing display, idle-voice monitor), the single background scheduler
//! and the cached streaming-provider token. It is constructed once per
//! process and shared as `Arc<Bot>`.
//!
//! # Startup
//!
//! Subsystems are built from plain data first, then the coordinator is
//! allocated, then each subsystem receives a `Weak<Bot>` through its `init`
//! call (player manager, now-playing handler, idle monitor, in that order).
//! The gateway connection is created by the host afterwards and attached
//! with [`Bot::attach_gateway`].
//!
//! # Shutdown
//!
//! `Running -> ShuttingDown -> Terminated`. Only the first [`Bot::shutdown`]
//! call does anything; it returns [`ShutdownOutcome::Terminated`] and the host
//! is expected to exit the process with the returned code.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::audio::{AloneInVoiceHandler, NowplayingHandler, PlayerManager};
use crate::config::BotConfig;
use crate::credentials::{CredentialClient, CredentialError, SpotifyCredentialClient, TokenCache};
use crate::gateway::{ConnectionStatus, DisplaySurface, Gateway, Room, RoomId};
use crate::playlist::PlaylistLoader;
use crate::scheduler::BackgroundScheduler;
use crate::waiter::EventWaiter;

/// Exit code reported after a clean shutdown.
pub const EXIT_SUCCESS: i32 = 0;

/// Lifecycle of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    Running = 0,
    ShuttingDown = 1,
    Terminated = 2,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Running,
            1 => Self::ShuttingDown,
            _ => Self::Terminated,
        }
    }
}

/// Result of a [`Bot::shutdown`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// This call performed the shutdown; the host should exit with `exit_code`.
    Terminated {
        exit_code: i32,
        /// Rooms whose voice connection and session were released.
        rooms_visited: usize,
        /// Scheduled tasks dropped before they started.
        abandoned_tasks: usize,
    },
    /// Another call already started the shutdown.
    AlreadyShuttingDown,
}

/// Central coordination object.
pub struct Bot {
    config: Arc<BotConfig>,
    waiter: Arc<EventWaiter>,
    scheduler: Arc<BackgroundScheduler>,
    players: PlayerManager,
    playlists: PlaylistLoader,
    nowplaying: NowplayingHandler,
    alone_in_voice: AloneInVoiceHandler,
    /// Present only when both halves of the credential pair are configured.
    credential_client: Option<Arc<dyn CredentialClient>>,
    token_cache: Mutex<TokenCache>,
    state: AtomicU8,
    /// Owned by the platform connection, not by the bot.
    gateway: RwLock<Option<Weak<dyn Gateway>>>,
    display_surface: Mutex<Option<Weak<dyn DisplaySurface>>>,
    /// Cancelled once the first shutdown has completed.
    terminated: CancellationToken,
}

impl Bot {
    /// Build the coordinator with the Spotify credential client.
    pub fn new(config: BotConfig, waiter: Arc<EventWaiter>) -> Arc<Self> {
        Self::with_credential_factory(config, waiter, |client_id, client_secret| {
            Arc::new(SpotifyCredentialClient::new(client_id, client_secret)) as Arc<dyn CredentialClient>
        })
    }

    /// Build the coordinator, creating the credential client through `factory`.
    ///
    /// `factory` is only called when both the client id and the client secret
    /// are non-empty.
    pub fn with_credential_factory<F>(
        config: BotConfig,
        waiter: Arc<EventWaiter>,
        factory: F,
    ) -> Arc<Self>
    where
        F: FnOnce(&str, &str) -> Arc<dyn CredentialClient>,
    {
        info!(bot_name = %config.bot_name, "Initializing bot");
        let config = Arc::new(config);

        let playlists = PlaylistLoader::new(config.playlists_folder.clone());
        let scheduler = Arc::new(BackgroundScheduler::new("bot"));
        let players = PlayerManager::new();
        let nowplaying = NowplayingHandler::new();
        let alone_in_voice = AloneInVoiceHandler::new();

        let credential_client = if config.has_spotify_credentials() {
            Some(factory(
                &config.spotify_client_id,
                &config.spotify_client_secret,
            ))
        } else {
            info!("No streaming-provider credentials configured; token refresh disabled");
            None
        };

        let bot = Arc::new(Self {
            config,
            waiter,
            scheduler,
            players,
            playlists,
            nowplaying,
            alone_in_voice,
            credential_client,
            token_cache: Mutex::new(TokenCache::new()),
            state: AtomicU8::new(LifecycleState::Running as u8),
            gateway: RwLock::new(None),
            display_surface: Mutex::new(None),
            terminated: CancellationToken::new(),
        });

        bot.players.init(&bot);
        bot.nowplaying.init(&bot);
        bot.alone_in_voice.init(&bot);

        info!("Bot initialized");
        bot
    }

    // ========== Accessors ==========

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn waiter(&self) -> &Arc<EventWaiter> {
        &self.waiter
    }

    pub fn scheduler(&self) -> &Arc<BackgroundScheduler> {
        &self.scheduler
    }

    pub fn player_manager(&self) -> &PlayerManager {
        &self.players
    }

    pub fn playlist_loader(&self) -> &PlaylistLoader {
        &self.playlists
    }

    pub fn nowplaying_handler(&self) -> &NowplayingHandler {
        &self.nowplaying
    }

    pub fn alone_in_voice_handler(&self) -> &AloneInVoiceHandler {
        &self.alone_in_voice
    }

    pub fn credential_client(&self) -> Option<&Arc<dyn CredentialClient>> {
        self.credential_client.as_ref()
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_shutting_down(&self) -> bool {
        self.state() != LifecycleState::Running
    }

    // ========== Late-bound handles ==========

    /// Attach the live platform connection.
    pub fn attach_gateway(&self, gateway: &Arc<dyn Gateway>) {
        *self.gateway.write() = Some(Arc::downgrade(gateway));
        info!("Gateway attached");
    }

    pub fn detach_gateway(&self) {
        *self.gateway.write() = None;
        info!("Gateway detached");
    }

    /// The attached gateway, if it is still alive.
    pub fn gateway(&self) -> Option<Arc<dyn Gateway>> {
        self.gateway.read().as_ref().and_then(Weak::upgrade)
    }

    /// Attach a local display surface to dispose on shutdown.
    pub fn attach_display_surface(&self, surface: &Arc<dyn DisplaySurface>) {
        *self.display_surface.lock() = Some(Arc::downgrade(surface));
    }

    // ========== Credentials ==========

    /// Make sure the cached provider token is valid, fetching a new one if not.
    ///
    /// No-op without a credential client or while the cached token is fresh.
    /// On failure the previous cache is left as it was. Concurrent callers
    /// racing an expired cache may each issue a request.
    pub async fn ensure_fresh_token(&self) -> Result<(), CredentialError> {
        let Some(client) = &self.credential_client else {
            return Ok(());
        };

        if self.token_cache.lock().is_fresh(Instant::now()) {
            return Ok(());
        }

        debug!(provider = client.provider_id(), "Refreshing access token");
        let credentials = client.request_client_credentials().await?;
        let lifetime = Duration::from_secs(credentials.expires_in);

        let stored = self
            .token_cache
            .lock()
            .store(credentials.access_token, lifetime, Instant::now());
        if !stored {
            return Err(CredentialError::InvalidResponse(format!(
                "token lifetime of {}s is out of range",
                credentials.expires_in
            )));
        }
        info!(
            provider = client.provider_id(),
            expires_in_secs = credentials.expires_in,
            "Access token refreshed"
        );
        Ok(())
    }

    /// Current provider access token, if one was ever fetched.
    pub fn access_token(&self) -> Option<String> {
        self.token_cache.lock().token().map(str::to_string)
    }

    /// Instant the cached token expires, if one was ever fetched.
    pub fn token_expires_at(&self) -> Option<Instant> {
        self.token_cache.lock().expires_at()
    }

    // ========== Presence and voice ==========

    /// Bring the displayed activity back to the configured one.
    ///
    /// Returns whether an update was sent.
    pub fn sync_presence(&self) -> bool {
        let Some(gateway) = self.gateway() else {
            return false;
        };

        let desired = self.config.activity();
        if gateway.current_activity() == desired {
            return false;
        }

        debug!(activity = ?desired, "Updating presence");
        gateway.set_activity(desired);
        true
    }

    /// Leave the voice channel of a room in the background.
    ///
    /// Returns whether a close was scheduled; a room unknown to the gateway is
    /// silently ignored.
    pub fn close_voice_connection(&self, room_id: RoomId) -> bool {
        let Some(room) = self
            .gateway()
            .and_then(|gateway| gateway.find_room(room_id))
        else {
            debug!(room_id = %room_id, "Room not found; nothing to close");
            return false;
        };

        self.scheduler.submit(async move {
            if let Err(e) = room.close_audio_connection().await {
                warn!(room_id = %room.id(), error = %e, "Failed to close voice connection");
            }
        })
    }

    // ========== Shutdown ==========

    /// Shut everything down. Only the first call has any effect.
    pub async fn shutdown(&self) -> ShutdownOutcome {
        if self
            .state
            .compare_exchange(
                LifecycleState::Running as u8,
                LifecycleState::ShuttingDown as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            debug!("Shutdown already in progress");
            return ShutdownOutcome::AlreadyShuttingDown;
        }

        info!("Shutting down bot");
        let abandoned_tasks = self.scheduler.shutdown_now();

        let mut rooms_visited = 0;
        match self.gateway() {
            Some(gateway) if gateway.status() != ConnectionStatus::ShuttingDown => {
                let mut seen = HashSet::new();
                for room in gateway.rooms() {
                    if !seen.insert(room.id()) {
                        continue;
                    }
                    self.release_room(room.as_ref()).await;
                    rooms_visited += 1;
                }

                if let Err(e) = gateway.disconnect().await {
                    warn!(error = %e, "Failed to disconnect from gateway");
                }
            }
            Some(_) => debug!("Gateway already shutting down; skipping room release"),
            None => debug!("No gateway attached"),
        }

        // Sessions whose room is gone can only be torn down locally.
        for room_id in self.players.room_ids() {
            if let Some(session) = self.players.remove(room_id) {
                debug!(room_id = %room_id, "Destroying orphaned session");
                session.stop_and_clear();
                session.destroy_pipeline();
            }
        }

        let surface = self.display_surface.lock().take().and_then(|w| w.upgrade());
        if let Some(surface) = surface {
            surface.dispose().await;
        }

        self.state
            .store(LifecycleState::Terminated as u8, Ordering::SeqCst);
        self.terminated.cancel();

        info!(rooms_visited, abandoned_tasks, "Bot shut down");
        ShutdownOutcome::Terminated {
            exit_code: EXIT_SUCCESS,
            rooms_visited,
            abandoned_tasks,
        }
    }

    /// Release one room's voice connection and session. Failures are logged.
    async fn release_room(&self, room: &dyn Room) {
        let room_id = room.id();

        if let Err(e) = room.close_audio_connection().await {
            warn!(room_id = %room_id, error = %e, "Failed to close voice connection");
        }

        if let Some(session) = self.players.session_for(room_id) {
            session.stop_and_clear();
            session.destroy_pipeline();
            if let Err(e) = self.nowplaying.push_update(room_id, &session, true).await {
                warn!(room_id = %room_id, error = %e, "Failed to push final now-playing update");
            }
            self.players.remove(room_id);
        }
    }

    /// Resolves once the first shutdown has completed.
    pub async fn terminated(&self) {
        self.terminated.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BotConfig {
        BotConfig {
            token: "token".to_string(),
            update_interval_secs: 0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_no_credentials_means_no_client() {
        let mut created = 0;
        let bot = Bot::with_credential_factory(config(), Arc::new(EventWaiter::new()), |id, secret| {
            created += 1;
            Arc::new(SpotifyCredentialClient::new(id, secret)) as Arc<dyn CredentialClient>
        });

        assert_eq!(created, 0);
        assert!(bot.credential_client().is_none());
        assert!(bot.ensure_fresh_token().await.is_ok());
        assert!(bot.access_token().is_none());
    }

    #[tokio::test]
    async fn test_lifecycle_transitions() {
        let bot = Bot::new(config(), Arc::new(EventWaiter::new()));
        assert_eq!(bot.state(), LifecycleState::Running);

        let outcome = bot.shutdown().await;
        assert_eq!(
            outcome,
            ShutdownOutcome::Terminated {
                exit_code: EXIT_SUCCESS,
                rooms_visited: 0,
                abandoned_tasks: 0,
            }
        );
        assert_eq!(bot.state(), LifecycleState::Terminated);
        assert!(bot.scheduler().is_shutdown());

        assert_eq!(bot.shutdown().await, ShutdownOutcome::AlreadyShuttingDown);
        bot.terminated().await;
    }

    #[tokio::test]
    async fn test_presence_and_voice_without_gateway() {
        let bot = Bot::new(config(), Arc::new(EventWaiter::new()));
        assert!(bot.gateway().is_none());
        assert!(!bot.sync_presence());
        assert!(!bot.close_voice_connection(RoomId(1)));
        assert_eq!(bot.scheduler().submitted_count(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_destroys_sessions_without_gateway() {
        let bot = Bot::new(config(), Arc::new(EventWaiter::new()));
        let session = bot.player_manager().set_up_handler(RoomId(9));

        bot.shutdown().await;

        assert!(session.is_destroyed());
        assert_eq!(bot.player_manager().count(), 0);
    }
}
