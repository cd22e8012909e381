//! Routes gateway events to the coordinator and its subsystems.

use std::sync::Arc;

use tracing::{debug, info};

use crate::bot::{Bot, ShutdownOutcome};
use crate::gateway::GatewayEvent;

/// Event listener registered with the gateway.
pub struct Listener {
    bot: Arc<Bot>,
}

impl Listener {
    pub fn new(bot: Arc<Bot>) -> Self {
        Self { bot }
    }

    /// Handle one event.
    ///
    /// Returns the shutdown outcome when the event triggered a shutdown.
    pub async fn on_event(&self, event: GatewayEvent) -> Option<ShutdownOutcome> {
        self.bot.waiter().dispatch(&event);

        match event {
            GatewayEvent::Ready => {
                let rooms = self
                    .bot
                    .gateway()
                    .map(|gateway| gateway.rooms().len())
                    .unwrap_or(0);
                info!(rooms, "Gateway ready");
                self.bot.sync_presence();
                None
            }
            GatewayEvent::VoiceStateUpdate { room_id } => {
                self.bot.alone_in_voice_handler().on_voice_update(room_id);
                None
            }
            GatewayEvent::RoomRemoved { room_id } => {
                if let Some(session) = self.bot.player_manager().remove(room_id) {
                    debug!(room_id = %room_id, "Dropping session of removed room");
                    session.stop_and_clear();
                    session.destroy_pipeline();
                }
                self.bot.nowplaying_handler().forget(room_id);
                None
            }
            GatewayEvent::Message {
                author_id, content, ..
            } => {
                if self.bot.config().is_shutdown_command(author_id, &content) {
                    info!(author_id, "Shutdown requested by owner");
                    return Some(self.bot.shutdown().await);
                }
                None
            }
            GatewayEvent::Disconnected | GatewayEvent::ShutdownRequested => {
                Some(self.bot.shutdown().await)
            }
        }
    }
}
