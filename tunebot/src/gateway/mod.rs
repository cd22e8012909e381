//! Narrow view of the chat-platform connection.
//!
//! The bot never talks the platform's wire protocol itself. A host-side
//! adapter implements [`Gateway`] and [`Room`] and is attached to the
//! coordinator once the connection exists.

mod activity;
mod events;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

pub use activity::{Activity, ActivityKind, NO_ACTIVITY, OnlineStatus};
pub use events::GatewayEvent;

/// Identifier of a room (guild) on the chat platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RoomId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// State of the platform connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Reconnecting,
    /// The connection is tearing itself down; room state may already be gone.
    ShuttingDown,
    Shutdown,
}

/// A live room as seen through the gateway.
#[async_trait]
pub trait Room: Send + Sync {
    fn id(&self) -> RoomId;

    fn name(&self) -> String;

    /// Number of listening (non-bot, non-deafened) members in the voice channel
    /// the bot is connected to, or `None` if the bot is not connected in this room.
    fn listener_count(&self) -> Option<usize>;

    /// Ask the platform's audio layer to leave the voice channel.
    ///
    /// May block on network I/O.
    async fn close_audio_connection(&self) -> Result<()>;

    /// Set the topic of the room's music text channel.
    async fn set_topic(&self, topic: &str) -> Result<()>;
}

/// The live connection to the chat platform.
#[async_trait]
pub trait Gateway: Send + Sync {
    fn status(&self) -> ConnectionStatus;

    /// Every room currently known to the connection.
    fn rooms(&self) -> Vec<Arc<dyn Room>>;

    fn find_room(&self, id: RoomId) -> Option<Arc<dyn Room>>;

    /// Activity currently shown for the bot account.
    fn current_activity(&self) -> Option<Activity>;

    /// Queue a presence update; `None` clears the activity.
    fn set_activity(&self, activity: Option<Activity>);

    /// Log out and close the connection.
    async fn disconnect(&self) -> Result<()>;
}

/// Optional local control surface (e.g. a console window) owned by the host.
#[async_trait]
pub trait DisplaySurface: Send + Sync {
    async fn dispose(&self);
}
