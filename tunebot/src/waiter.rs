//! Shared facility for awaiting a future gateway event.
//!
//! Interactive flows (e.g. "pick a search result") register a predicate and
//! wait for the first matching event; the listener feeds every event through
//! [`EventWaiter::dispatch`].

use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::trace;

use crate::gateway::GatewayEvent;

type Predicate = Box<dyn Fn(&GatewayEvent) -> bool + Send + Sync>;

struct Waiting {
    predicate: Predicate,
    sender: oneshot::Sender<GatewayEvent>,
}

/// Registry of one-shot event waiters.
#[derive(Default)]
pub struct EventWaiter {
    waiting: Mutex<Vec<Waiting>>,
}

impl EventWaiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the first event matching `predicate`, or `None` after `timeout`.
    pub async fn wait_for<P>(&self, predicate: P, timeout: Duration) -> Option<GatewayEvent>
    where
        P: Fn(&GatewayEvent) -> bool + Send + Sync + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        self.waiting.lock().push(Waiting {
            predicate: Box::new(predicate),
            sender,
        });

        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(event)) => Some(event),
            // Timed out, or the waiter was dropped. The stale entry is pruned
            // on the next dispatch.
            _ => None,
        }
    }

    /// Hand an event to every waiter whose predicate matches it.
    ///
    /// Returns the number of waiters completed.
    pub fn dispatch(&self, event: &GatewayEvent) -> usize {
        let mut waiting = self.waiting.lock();
        let mut completed = 0;

        waiting.retain_mut(|w| {
            if w.sender.is_closed() {
                return false;
            }
            if !(w.predicate)(event) {
                return true;
            }
            // Sending consumes the sender, so swap in a closed placeholder.
            let (placeholder, _) = oneshot::channel();
            let sender = std::mem::replace(&mut w.sender, placeholder);
            if sender.send(event.clone()).is_ok() {
                completed += 1;
            }
            false
        });

        if completed > 0 {
            trace!(completed, event = %event.description(), "Completed event waiters");
        }
        completed
    }

    /// Number of live waiters.
    pub fn pending(&self) -> usize {
        let mut waiting = self.waiting.lock();
        waiting.retain(|w| !w.sender.is_closed());
        waiting.len()
    }
}
