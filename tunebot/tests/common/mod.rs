//! Hand-written fakes of the platform connection and the credential provider.
//!
//! Every fake records the calls it receives so tests can assert on them.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use tunebot::Bot;
use tunebot::config::BotConfig;
use tunebot::credentials::{ClientCredentials, CredentialClient, CredentialError};
use tunebot::gateway::{Activity, ConnectionStatus, DisplaySurface, Gateway, Room, RoomId};
use tunebot::waiter::EventWaiter;
use tunebot::{Error, Result};

pub struct FakeRoom {
    id: RoomId,
    listeners: Mutex<Option<usize>>,
    fail_close: AtomicBool,
    pub close_calls: AtomicUsize,
    pub topics: Mutex<Vec<String>>,
}

impl FakeRoom {
    pub fn new(id: u64) -> Arc<Self> {
        Arc::new(Self {
            id: RoomId(id),
            listeners: Mutex::new(Some(1)),
            fail_close: AtomicBool::new(false),
            close_calls: AtomicUsize::new(0),
            topics: Mutex::new(Vec::new()),
        })
    }

    /// A room whose voice close always fails.
    pub fn failing(id: u64) -> Arc<Self> {
        let room = Self::new(id);
        room.fail_close.store(true, Ordering::SeqCst);
        room
    }

    pub fn set_listeners(&self, count: Option<usize>) {
        *self.listeners.lock() = count;
    }

    pub fn closes(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn topics(&self) -> Vec<String> {
        self.topics.lock().clone()
    }
}

#[async_trait]
impl Room for FakeRoom {
    fn id(&self) -> RoomId {
        self.id
    }

    fn name(&self) -> String {
        format!("room-{}", self.id)
    }

    fn listener_count(&self) -> Option<usize> {
        *self.listeners.lock()
    }

    async fn close_audio_connection(&self) -> Result<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(Error::gateway(format!("voice close failed in {}", self.id)));
        }
        Ok(())
    }

    async fn set_topic(&self, topic: &str) -> Result<()> {
        self.topics.lock().push(topic.to_string());
        Ok(())
    }
}

pub struct FakeGateway {
    rooms: Mutex<Vec<Arc<FakeRoom>>>,
    status: Mutex<ConnectionStatus>,
    activity: Mutex<Option<Activity>>,
    fail_disconnect: AtomicBool,
    pub set_activity_calls: AtomicUsize,
    pub disconnect_calls: AtomicUsize,
}

impl FakeGateway {
    pub fn new(rooms: Vec<Arc<FakeRoom>>) -> Arc<Self> {
        Arc::new(Self {
            rooms: Mutex::new(rooms),
            status: Mutex::new(ConnectionStatus::Connected),
            activity: Mutex::new(None),
            fail_disconnect: AtomicBool::new(false),
            set_activity_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
        })
    }

    pub fn set_status(&self, status: ConnectionStatus) {
        *self.status.lock() = status;
    }

    pub fn show_activity(&self, activity: Option<Activity>) {
        *self.activity.lock() = activity;
    }

    pub fn shown_activity(&self) -> Option<Activity> {
        self.activity.lock().clone()
    }

    pub fn fail_disconnect(&self) {
        self.fail_disconnect.store(true, Ordering::SeqCst);
    }

    pub fn remove_room(&self, id: u64) {
        self.rooms.lock().retain(|room| room.id != RoomId(id));
    }

    pub fn activity_updates(&self) -> usize {
        self.set_activity_calls.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    fn status(&self) -> ConnectionStatus {
        *self.status.lock()
    }

    fn rooms(&self) -> Vec<Arc<dyn Room>> {
        self.rooms
            .lock()
            .iter()
            .map(|room| room.clone() as Arc<dyn Room>)
            .collect()
    }

    fn find_room(&self, id: RoomId) -> Option<Arc<dyn Room>> {
        self.rooms
            .lock()
            .iter()
            .find(|room| room.id == id)
            .map(|room| room.clone() as Arc<dyn Room>)
    }

    fn current_activity(&self) -> Option<Activity> {
        self.activity.lock().clone()
    }

    fn set_activity(&self, activity: Option<Activity>) {
        self.set_activity_calls.fetch_add(1, Ordering::SeqCst);
        *self.activity.lock() = activity;
    }

    async fn disconnect(&self) -> Result<()> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.set_status(ConnectionStatus::Shutdown);
        if self.fail_disconnect.load(Ordering::SeqCst) {
            return Err(Error::gateway("logout rejected"));
        }
        Ok(())
    }
}

/// Credential client answering from a scripted queue.
#[derive(Default)]
pub struct FakeCredentialClient {
    responses: Mutex<VecDeque<std::result::Result<ClientCredentials, CredentialError>>>,
    pub calls: AtomicUsize,
}

impl FakeCredentialClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_token(&self, token: &str, expires_in: u64) {
        self.responses.lock().push_back(Ok(ClientCredentials {
            access_token: token.to_string(),
            token_type: "Bearer".to_string(),
            expires_in,
        }));
    }

    pub fn push_error(&self, status: u16) {
        self.responses.lock().push_back(Err(CredentialError::Provider {
            status,
            message: "scripted failure".to_string(),
        }));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialClient for FakeCredentialClient {
    fn provider_id(&self) -> &'static str {
        "fake"
    }

    async fn request_client_credentials(
        &self,
    ) -> std::result::Result<ClientCredentials, CredentialError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(CredentialError::InvalidResponse("no scripted response".into())))
    }
}

#[derive(Default)]
pub struct FakeSurface {
    pub dispose_calls: AtomicUsize,
}

impl FakeSurface {
    pub fn disposals(&self) -> usize {
        self.dispose_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DisplaySurface for FakeSurface {
    async fn dispose(&self) {
        self.dispose_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Config with every periodic task disabled.
pub fn test_config() -> BotConfig {
    BotConfig {
        token: "test-token".to_string(),
        owner_id: 1000,
        prefix: "!".to_string(),
        update_interval_secs: 0,
        alone_time_until_stop: 0,
        ..Default::default()
    }
}

/// Build a bot whose credential client (if any) is `client`.
pub fn bot_with_client(config: BotConfig, client: Arc<FakeCredentialClient>) -> Arc<Bot> {
    Bot::with_credential_factory(config, Arc::new(EventWaiter::new()), move |_, _| {
        client as Arc<dyn CredentialClient>
    })
}

pub fn bot(config: BotConfig) -> Arc<Bot> {
    Bot::new(config, Arc::new(EventWaiter::new()))
}

pub fn attach(bot: &Bot, gateway: &Arc<FakeGateway>) {
    let gateway: Arc<dyn Gateway> = gateway.clone();
    bot.attach_gateway(&gateway);
}

/// Yield until `condition` holds, giving spawned tasks a chance to run.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not reached");
}
