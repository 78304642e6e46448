//! Fan-out of run updates to WebSocket clients.
//!
//! The [`ChangeBus`] is synchronous and in-process; dashboards connect and
//! disconnect at will. [`EventBroadcaster::bridge`] turns each bus publish
//! into a `run_updated` message on a bounded tokio broadcast channel that
//! every open `/ws` connection reads from.

use tokio::sync::broadcast;

use crate::models::{WsEvent, WsEventMessage};

use super::change_bus::{ChangeBus, SubscriptionId};

/// Messages a slow client may fall behind by before it starts skipping.
const RUN_FEED_BACKLOG: usize = 1000;

/// Sender half of the run update feed; clones share one channel.
#[derive(Clone)]
pub struct EventBroadcaster {
    feed: broadcast::Sender<WsEventMessage>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self::with_capacity(RUN_FEED_BACKLOG)
    }

    pub fn with_capacity(backlog: usize) -> Self {
        let (feed, _) = broadcast::channel(backlog);
        Self { feed }
    }

    /// A receiver for messages sent from now on; nothing is replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<WsEventMessage> {
        self.feed.subscribe()
    }

    /// Push one message to every open connection and return how many got it.
    pub fn send(&self, message: WsEventMessage) -> usize {
        // Zero dashboards connected
        self.feed.send(message).unwrap_or(0)
    }

    /// Forward every run change published on `bus` as a `run_updated` event.
    pub fn bridge(&self, bus: &ChangeBus) -> SubscriptionId {
        let feed = self.clone();
        bus.subscribe(move |run_id| {
            feed.send(WsEventMessage::new(WsEvent::run_updated(run_id)));
        })
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
