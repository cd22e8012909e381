//! Mirrors current playback into each room's topic and the bot's presence.

use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::Result;
use crate::bot::Bot;
use crate::gateway::{Activity, RoomId};

use super::{AudioHandler, Track};

const STOPPED_TOPIC: &str = "\u{23f9} Playback stopped";

/// Display updater for now-playing information.
#[derive(Default)]
pub struct NowplayingHandler {
    /// Last topic text pushed per room.
    last_topics: DashMap<RoomId, String>,
    bot: OnceLock<Weak<Bot>>,
}

impl NowplayingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire the back-reference and start the periodic refresh.
    pub fn init(&self, bot: &Arc<Bot>) {
        if self.bot.set(Arc::downgrade(bot)).is_err() {
            warn!("NowplayingHandler already initialized");
            return;
        }

        let interval = bot.config().update_interval_secs;
        if interval == 0 {
            info!("Now-playing refresh disabled");
            return;
        }

        let weak = Arc::downgrade(bot);
        bot.scheduler().schedule_with_fixed_delay(
            Duration::ZERO,
            Duration::from_secs(interval),
            move || {
                let weak = weak.clone();
                async move {
                    if let Some(bot) = weak.upgrade() {
                        bot.nowplaying_handler().update_all().await;
                    }
                }
            },
        );
        info!(interval_secs = interval, "Now-playing refresh scheduled");
    }

    fn bot(&self) -> Option<Arc<Bot>> {
        self.bot.get()?.upgrade()
    }

    /// Render the topic text for a session.
    pub fn topic_for(session: &AudioHandler, is_final: bool) -> String {
        if is_final || session.is_destroyed() {
            return STOPPED_TOPIC.to_string();
        }

        match session.now_playing() {
            Some(track) => {
                let glyph = if session.is_paused() {
                    "\u{23f8}"
                } else {
                    "\u{25b6}"
                };
                format!("{} {} - {}", glyph, track.title, track.author)
            }
            None => STOPPED_TOPIC.to_string(),
        }
    }

    /// Push the session's state into the room topic.
    ///
    /// Skips the request when the text matches what was last pushed, except
    /// for final updates, which are always sent. Returns whether a request
    /// was made.
    pub async fn push_update(
        &self,
        room_id: RoomId,
        session: &AudioHandler,
        is_final: bool,
    ) -> Result<bool> {
        let Some(bot) = self.bot() else {
            return Ok(false);
        };
        let Some(gateway) = bot.gateway() else {
            return Ok(false);
        };
        let Some(room) = gateway.find_room(room_id) else {
            self.last_topics.remove(&room_id);
            return Ok(false);
        };

        let topic = Self::topic_for(session, is_final);
        if !is_final
            && self
                .last_topics
                .get(&room_id)
                .is_some_and(|last| *last == topic)
        {
            return Ok(false);
        }

        room.set_topic(&topic).await?;
        debug!(room_id = %room_id, topic = %topic, is_final, "Pushed now-playing topic");

        if is_final {
            self.last_topics.remove(&room_id);
        } else {
            self.last_topics.insert(room_id, topic);
        }
        Ok(true)
    }

    /// Refresh the topic of every room with a session.
    pub async fn update_all(&self) {
        let Some(bot) = self.bot() else {
            return;
        };

        for session in bot.player_manager().sessions() {
            let room_id = session.room_id();
            if let Err(e) = self.push_update(room_id, &session, false).await {
                warn!(room_id = %room_id, error = %e, "Failed to update now-playing topic");
            }
        }
    }

    /// React to the current track changing in some room.
    pub fn on_track_update(&self, track: Option<&Track>) {
        let Some(bot) = self.bot() else {
            return;
        };
        if !bot.config().song_in_status {
            return;
        }

        match (track, bot.gateway()) {
            (Some(track), Some(gateway)) if bot.player_manager().playing_count() <= 1 => {
                gateway.set_activity(Some(Activity::listening(track.title.clone())));
            }
            _ => {
                bot.sync_presence();
            }
        }
    }

    /// Forget the cached topic of a room.
    pub fn forget(&self, room_id: RoomId) {
        self.last_topics.remove(&room_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_for_states() {
        let session = AudioHandler::new(RoomId(1), None);
        assert_eq!(NowplayingHandler::topic_for(&session, false), STOPPED_TOPIC);

        session
            .enqueue(Track::new("Song", "Band", "uri", Duration::from_secs(5)))
            .unwrap();
        assert_eq!(
            NowplayingHandler::topic_for(&session, false),
            "\u{25b6} Song - Band"
        );

        session.set_paused(true);
        assert_eq!(
            NowplayingHandler::topic_for(&session, false),
            "\u{23f8} Song - Band"
        );

        assert_eq!(NowplayingHandler::topic_for(&session, true), STOPPED_TOPIC);
    }

    #[tokio::test]
    async fn test_push_update_without_bot_is_noop() {
        let handler = NowplayingHandler::new();
        let session = AudioHandler::new(RoomId(1), None);
        assert!(!handler.push_update(RoomId(1), &session, true).await.unwrap());
    }
}
