//! Playback sessions and the subsystems that watch them.
//!
//! - [`PlayerManager`]: session registry, one [`AudioHandler`] per room
//! - [`NowplayingHandler`]: mirrors playback into room topics and presence
//! - [`AloneInVoiceHandler`]: stops playback in abandoned voice channels
//!
//! Each subsystem is built without the coordinator and wired to it through
//! a separate `init` call once the coordinator is fully allocated.

mod alone_in_voice;
mod handler;
mod nowplaying;
mod player_manager;

pub use alone_in_voice::AloneInVoiceHandler;
pub use handler::{AudioHandler, Track};
pub use nowplaying::NowplayingHandler;
pub use player_manager::PlayerManager;
