//! Stops playback in rooms whose voice channel has been empty for too long.

use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::bot::Bot;
use crate::gateway::RoomId;

/// How often abandoned rooms are checked.
const CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Idle-voice monitor.
#[derive(Default)]
pub struct AloneInVoiceHandler {
    /// Rooms without listeners, and since when.
    alone_since: DashMap<RoomId, Instant>,
    bot: OnceLock<Weak<Bot>>,
}

impl AloneInVoiceHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire the back-reference and start the periodic check when enabled.
    pub fn init(&self, bot: &Arc<Bot>) {
        if self.bot.set(Arc::downgrade(bot)).is_err() {
            warn!("AloneInVoiceHandler already initialized");
            return;
        }

        let Some(timeout) = Self::timeout_of(bot) else {
            info!("Idle voice monitor disabled");
            return;
        };

        let weak = Arc::downgrade(bot);
        bot.scheduler()
            .schedule_with_fixed_delay(Duration::ZERO, CHECK_INTERVAL, move || {
                let weak = weak.clone();
                async move {
                    if let Some(bot) = weak.upgrade() {
                        bot.alone_in_voice_handler().check();
                    }
                }
            });
        info!(timeout_secs = timeout.as_secs(), "Idle voice monitor scheduled");
    }

    fn timeout_of(bot: &Bot) -> Option<Duration> {
        match bot.config().alone_time_until_stop {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    fn bot(&self) -> Option<Arc<Bot>> {
        self.bot.get()?.upgrade()
    }

    /// Stop playback in every room that has been alone past the timeout.
    ///
    /// Returns the rooms that were stopped.
    pub fn check(&self) -> Vec<RoomId> {
        let Some(bot) = self.bot() else {
            return Vec::new();
        };
        let Some(timeout) = Self::timeout_of(&bot) else {
            return Vec::new();
        };

        let now = Instant::now();
        let expired: Vec<RoomId> = self
            .alone_since
            .iter()
            .filter(|entry| now.duration_since(*entry.value()) > timeout)
            .map(|entry| *entry.key())
            .collect();

        let mut stopped = Vec::with_capacity(expired.len());
        for room_id in expired {
            self.alone_since.remove(&room_id);

            let room_exists = bot
                .gateway()
                .is_some_and(|gateway| gateway.find_room(room_id).is_some());
            if !room_exists {
                debug!(room_id = %room_id, "Room vanished while alone; forgetting it");
                continue;
            }

            if let Some(session) = bot.player_manager().session_for(room_id) {
                session.stop_and_clear();
            }
            bot.close_voice_connection(room_id);

            info!(room_id = %room_id, "Stopped playback in abandoned voice channel");
            stopped.push(room_id);
        }
        stopped
    }

    /// Re-evaluate a room after its voice occupancy changed.
    pub fn on_voice_update(&self, room_id: RoomId) {
        let Some(bot) = self.bot() else {
            return;
        };
        if Self::timeout_of(&bot).is_none() {
            return;
        }
        if !bot.player_manager().has_handler(room_id) {
            return;
        }

        let Some(room) = bot.gateway().and_then(|gateway| gateway.find_room(room_id)) else {
            self.alone_since.remove(&room_id);
            return;
        };

        let alone = room.listener_count() == Some(0);
        let tracked = self.alone_since.contains_key(&room_id);

        if !alone && tracked {
            debug!(room_id = %room_id, "Listeners returned");
            self.alone_since.remove(&room_id);
        } else if alone && !tracked {
            debug!(room_id = %room_id, "Voice channel is now empty");
            self.alone_since.insert(room_id, Instant::now());
        }
    }

    pub fn is_alone(&self, room_id: RoomId) -> bool {
        self.alone_since.contains_key(&room_id)
    }

    /// Number of rooms currently tracked as empty.
    pub fn tracked_count(&self) -> usize {
        self.alone_since.len()
    }
}
