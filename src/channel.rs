//! Broadcast channel – fire-and-forget trigger events between peers.
//!
//! ## Delivery contract
//!
//! Best-effort, unordered, unacknowledged. No retry and no replay: a peer that
//! connects after an event was published never sees it (the committed zone
//! state is the durable record). The publisher may receive its own event, so
//! handlers must not assume an event came from someone else.
//!
//! ## Layers
//!
//! ```text
//! BroadcastChannel  (named, JSON-typed)
//!   └── Transport   (emit / on / off over raw bytes)
//!         └── LocalHub / LocalTransport  (in-process peers)
//! ```

use crate::error::{Result, TripwireError};
use crate::protocol::{channels, TriggerEvent};
use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Raw inbound message stream for one channel.
pub type Inbound = mpsc::UnboundedReceiver<Bytes>;

/// Identifies one `on` registration so only its owner can remove it.
pub type ListenerId = u64;

/// A live registration returned by [`Transport::on`].
pub struct Listener {
    pub id: ListenerId,
    pub inbound: Inbound,
}

/// The host's generic message transport.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn emit(&self, channel: &str, payload: Bytes) -> Result<()>;

    /// Start listening on `channel`. A second call replaces the first listener.
    fn on(&self, channel: &str) -> Result<Listener>;

    /// Remove listener `id`. A no-op when it has already been replaced.
    fn off(&self, channel: &str, id: ListenerId);
}

pub type PeerId = String;

struct Registration {
    id: ListenerId,
    tx: mpsc::UnboundedSender<Bytes>,
}

#[derive(Default)]
struct HubState {
    listeners: HashMap<String, HashMap<PeerId, Registration>>,
    next_id: ListenerId,
    closed: bool,
}

/// In-process message hub shared by every [`LocalTransport`] of a session.
#[derive(Default)]
pub struct LocalHub {
    state: Mutex<HubState>,
}

impl LocalHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A transport endpoint for `peer`.
    pub fn connect(self: &Arc<Self>, peer: impl Into<PeerId>) -> LocalTransport {
        LocalTransport {
            hub: self.clone(),
            peer: peer.into(),
        }
    }

    pub fn listener_count(&self, channel: &str) -> usize {
        self.state
            .lock()
            .listeners
            .get(channel)
            .map_or(0, |l| l.len())
    }

    /// Drop every listener and refuse further traffic. Listener tasks see
    /// their streams end.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.listeners.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn deliver(&self, channel: &str, payload: &Bytes) -> Result<usize> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(closed(channel));
        }
        let Some(peers) = state.listeners.get_mut(channel) else {
            return Ok(0);
        };
        // Closed receivers are pruned; delivery to them is simply lost.
        peers.retain(|_, reg| reg.tx.send(payload.clone()).is_ok());
        Ok(peers.len())
    }
}

fn closed(channel: &str) -> TripwireError {
    TripwireError::Transport {
        channel: channel.to_string(),
        reason: "hub is shut down".into(),
    }
}

/// One peer's connection to a [`LocalHub`]. Delivers to every listener on
/// the channel, the sender included.
#[derive(Clone)]
pub struct LocalTransport {
    hub: Arc<LocalHub>,
    peer: PeerId,
}

impl LocalTransport {
    pub fn peer(&self) -> &str {
        &self.peer
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn emit(&self, channel: &str, payload: Bytes) -> Result<()> {
        let delivered = self.hub.deliver(channel, &payload)?;
        debug!(
            "[tripwire] {} emitted {} bytes on {} to {} listener(s)",
            self.peer,
            payload.len(),
            channel,
            delivered
        );
        Ok(())
    }

    fn on(&self, channel: &str) -> Result<Listener> {
        let mut state = self.hub.state.lock();
        if state.closed {
            return Err(closed(channel));
        }
        state.next_id += 1;
        let id = state.next_id;
        let (tx, inbound) = mpsc::unbounded_channel();
        state
            .listeners
            .entry(channel.to_string())
            .or_default()
            .insert(self.peer.clone(), Registration { id, tx });
        Ok(Listener { id, inbound })
    }

    fn off(&self, channel: &str, id: ListenerId) {
        let mut state = self.hub.state.lock();
        if let Some(peers) = state.listeners.get_mut(channel) {
            if peers.get(&self.peer).is_some_and(|reg| reg.id == id) {
                peers.remove(&self.peer);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Typed channel
// ---------------------------------------------------------------------------

/// Receives decoded trigger events, one at a time, in arrival order.
#[async_trait]
pub trait TriggerHandler: Send + Sync {
    async fn handle(&self, event: TriggerEvent) -> Result<()>;
}

/// Named channel carrying [`TriggerEvent`]s.
#[derive(Clone)]
pub struct BroadcastChannel {
    name: String,
    transport: Arc<dyn Transport>,
}

impl BroadcastChannel {
    /// Channel on the module-scoped name.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::named(channels::TRIGGER, transport)
    }

    pub fn named(name: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            name: name.into(),
            transport,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Serialise and emit `event`.
    ///
    /// Errors are logged and swallowed; a failed publish never breaks the
    /// mover's pipeline.
    pub async fn publish(&self, event: &TriggerEvent) {
        debug!("[tripwire] Emitting to {}", self.name);
        if let Err(e) = self.try_publish(event).await {
            warn!("[tripwire] Failed to publish to {}: {}", self.name, e);
        }
    }

    async fn try_publish(&self, event: &TriggerEvent) -> Result<()> {
        let payload = event.encode()?;
        self.transport.emit(&self.name, Bytes::from(payload)).await
    }

    /// Start delivering events to `handler` on a background task.
    ///
    /// Undecodable payloads and handler errors are logged; neither stops the
    /// loop.
    pub fn subscribe(&self, handler: Arc<dyn TriggerHandler>) -> Result<Subscription> {
        let Listener { id, mut inbound } = self.transport.on(&self.name)?;
        let name = self.name.clone();

        let task = tokio::spawn(async move {
            while let Some(payload) = inbound.recv().await {
                debug!("[tripwire] Emission received on {}", name);
                let event = match TriggerEvent::decode(&payload) {
                    Ok(event) => event,
                    Err(e) => {
                        warn!("[tripwire] Bad JSON on {}: {}", name, TripwireError::from(e));
                        continue;
                    }
                };
                if let Err(e) = handler.handle(event).await {
                    log::error!("[tripwire] {}", e);
                }
            }
            debug!("[tripwire] Listener on {} exited", name);
        });

        Ok(Subscription {
            name: self.name.clone(),
            listener: id,
            transport: self.transport.clone(),
            task: Some(task),
        })
    }
}

/// Live listener registration. Dropping it unsubscribes.
pub struct Subscription {
    name: String,
    listener: ListenerId,
    transport: Arc<dyn Transport>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Remove this subscription's listener and stop the delivery task. A
    /// newer registration by the same peer is left in place.
    pub fn unsubscribe(&mut self) {
        if let Some(task) = self.task.take() {
            self.transport.off(&self.name, self.listener);
            task.abort();
            debug!("[tripwire] Unsubscribed from {}", self.name);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
