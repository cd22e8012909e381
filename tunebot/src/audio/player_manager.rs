//! Registry of playback sessions, one per room.

use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::bot::Bot;
use crate::gateway::RoomId;

use super::AudioHandler;

/// Owns every room's [`AudioHandler`].
#[derive(Default)]
pub struct PlayerManager {
    sessions: DashMap<RoomId, Arc<AudioHandler>>,
    bot: OnceLock<Weak<Bot>>,
}

impl PlayerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire the back-reference to the coordinator. Only the first call counts.
    pub fn init(&self, bot: &Arc<Bot>) {
        if self.bot.set(Arc::downgrade(bot)).is_err() {
            warn!("PlayerManager already initialized");
            return;
        }
        info!("Player manager initialized");
    }

    fn max_track_duration(&self) -> Option<Duration> {
        let bot = self.bot.get()?.upgrade()?;
        match bot.config().max_track_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Get the session for a room, creating it if needed.
    pub fn set_up_handler(&self, room_id: RoomId) -> Arc<AudioHandler> {
        self.sessions
            .entry(room_id)
            .or_insert_with(|| {
                debug!(room_id = %room_id, "Creating audio handler");
                Arc::new(AudioHandler::new(room_id, self.max_track_duration()))
            })
            .clone()
    }

    pub fn session_for(&self, room_id: RoomId) -> Option<Arc<AudioHandler>> {
        self.sessions.get(&room_id).map(|s| s.value().clone())
    }

    pub fn has_handler(&self, room_id: RoomId) -> bool {
        self.sessions.contains_key(&room_id)
    }

    /// Drop a room's session, returning it.
    pub fn remove(&self, room_id: RoomId) -> Option<Arc<AudioHandler>> {
        self.sessions.remove(&room_id).map(|(_, session)| session)
    }

    pub fn room_ids(&self) -> Vec<RoomId> {
        self.sessions.iter().map(|entry| *entry.key()).collect()
    }

    pub fn sessions(&self) -> Vec<Arc<AudioHandler>> {
        self.sessions.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    /// Number of rooms with music currently playing.
    pub fn playing_count(&self) -> usize {
        self.sessions
            .iter()
            .filter(|entry| entry.value().is_music_playing())
            .count()
    }
}
