//! Events delivered by the chat-platform connection.

use super::RoomId;

/// Events the gateway delivers to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// The connection finished its handshake and the room cache is populated.
    Ready,
    /// Somebody joined, left or (un)deafened in a room's voice channel.
    VoiceStateUpdate { room_id: RoomId },
    /// The bot lost access to a room (kicked, room deleted).
    RoomRemoved { room_id: RoomId },
    /// A chat message was posted in a room.
    Message {
        room_id: RoomId,
        author_id: u64,
        content: String,
    },
    /// The platform closed the connection for good.
    Disconnected,
    /// The host asked the bot to stop (signal, supervisor).
    ShutdownRequested,
}

impl GatewayEvent {
    /// Room the event refers to, if any.
    pub fn room_id(&self) -> Option<RoomId> {
        match self {
            Self::VoiceStateUpdate { room_id }
            | Self::RoomRemoved { room_id }
            | Self::Message { room_id, .. } => Some(*room_id),
            Self::Ready | Self::Disconnected | Self::ShutdownRequested => None,
        }
    }

    /// Get a description of the event for logging.
    pub fn description(&self) -> String {
        match self {
            Self::Ready => "Gateway ready".to_string(),
            Self::VoiceStateUpdate { room_id } => format!("Voice state updated in {}", room_id),
            Self::RoomRemoved { room_id } => format!("Room removed: {}", room_id),
            Self::Message {
                room_id, author_id, ..
            } => format!("Message from {} in {}", author_id, room_id),
            Self::Disconnected => "Gateway disconnected".to_string(),
            Self::ShutdownRequested => "Shutdown requested".to_string(),
        }
    }
}
