//! Per-room playback session.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::gateway::RoomId;
use crate::{Error, Result};

/// Metadata of a playable track. Decoding happens elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub author: String,
    pub uri: String,
    pub duration: Duration,
}

impl Track {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        uri: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            uri: uri.into(),
            duration,
        }
    }
}

#[derive(Debug, Default)]
struct PlayerState {
    current: Option<Track>,
    queue: VecDeque<Track>,
    paused: bool,
    destroyed: bool,
}

/// One audio pipeline bound to one room.
#[derive(Debug)]
pub struct AudioHandler {
    room_id: RoomId,
    /// Longest track accepted, `None` for unlimited.
    max_track_duration: Option<Duration>,
    state: Mutex<PlayerState>,
}

impl AudioHandler {
    pub fn new(room_id: RoomId, max_track_duration: Option<Duration>) -> Self {
        Self {
            room_id,
            max_track_duration,
            state: Mutex::new(PlayerState::default()),
        }
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Add a track. Starts it immediately when nothing is playing.
    ///
    /// Returns the queue position, 0 meaning "now playing".
    pub fn enqueue(&self, track: Track) -> Result<usize> {
        if let Some(max) = self.max_track_duration {
            if track.duration > max {
                return Err(Error::Other(format!(
                    "Track '{}' is longer than the allowed maximum of {}s",
                    track.title,
                    max.as_secs()
                )));
            }
        }

        let mut state = self.state.lock();
        if state.destroyed {
            return Err(Error::Other(format!(
                "Audio pipeline for room {} was destroyed",
                self.room_id
            )));
        }

        if state.current.is_none() {
            debug!(room_id = %self.room_id, track = %track.title, "Starting playback");
            state.current = Some(track);
            return Ok(0);
        }

        state.queue.push_back(track);
        Ok(state.queue.len())
    }

    /// Advance to the next queued track.
    pub fn play_next(&self) -> Option<Track> {
        let mut state = self.state.lock();
        if state.destroyed {
            return None;
        }
        state.current = state.queue.pop_front();
        state.paused = false;
        state.current.clone()
    }

    pub fn now_playing(&self) -> Option<Track> {
        self.state.lock().current.clone()
    }

    pub fn set_paused(&self, paused: bool) {
        self.state.lock().paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    pub fn queue_len(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Whether a track is loaded and not paused.
    pub fn is_music_playing(&self) -> bool {
        let state = self.state.lock();
        state.current.is_some() && !state.paused
    }

    /// Stop the current track and drop everything queued.
    pub fn stop_and_clear(&self) {
        let mut state = self.state.lock();
        state.queue.clear();
        state.current = None;
        state.paused = false;
        debug!(room_id = %self.room_id, "Playback stopped and queue cleared");
    }

    /// Tear down the pipeline. Calling it again has no effect.
    pub fn destroy_pipeline(&self) {
        let mut state = self.state.lock();
        if state.destroyed {
            return;
        }
        state.destroyed = true;
        state.current = None;
        state.queue.clear();
        debug!(room_id = %self.room_id, "Audio pipeline destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.lock().destroyed
    }
}
