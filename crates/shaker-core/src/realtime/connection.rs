//! WebSocket push channel for a single project.
//!
//! Key concepts:
//! - At most one channel is live per manager. `connect` replaces whatever was
//!   open before, `disconnect` closes it.
//! - Every `connect`/`disconnect` bumps a generation counter. A channel task
//!   only touches shared state (connected flag, reconnects) while its
//!   generation is current, so a stale socket or a pending reconnect can never
//!   resurrect a channel the caller closed.
//! - After any close the task waits `reconnect_delay` and retries, forever,
//!   until the generation changes.
//! - Inbound text frames are parsed into [`PushEvent`]s and handed to the
//!   listeners registered for that kind, synchronously and in registration
//!   order. Frames that fail to parse are logged and dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::config::CoreConfig;
use crate::events::{PushEvent, PushEventKind};

pub type Listener = Arc<dyn Fn(&PushEvent) + Send + Sync>;

/// Handle returned by [`ConnectionManager::on`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct ChannelSlot {
    generation: u64,
    project_id: Option<String>,
    /// Present only while a socket is open for the current generation
    outbound: Option<mpsc::UnboundedSender<String>>,
}

struct Inner {
    config: CoreConfig,
    slot: Mutex<ChannelSlot>,
    connected: watch::Sender<bool>,
    listeners: RwLock<HashMap<PushEventKind, Vec<(ListenerId, Listener)>>>,
    next_listener: AtomicU64,
}

/// Push channel manager. Clones share the same channel and listeners.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    pub fn new(config: CoreConfig) -> Self {
        let (connected, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                config,
                slot: Mutex::new(ChannelSlot::default()),
                connected,
                listeners: RwLock::new(HashMap::new()),
                next_listener: AtomicU64::new(1),
            }),
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.inner.config
    }

    /// Opens the channel for `project_id`, replacing any live one.
    ///
    /// A blank id is logged and ignored. Must be called from within a Tokio
    /// runtime; the socket is driven by a spawned task.
    pub fn connect(&self, project_id: &str) {
        let project_id = project_id.trim();
        if project_id.is_empty() {
            tracing::error!("Project ID is required for push channel connection");
            return;
        }

        let url = match self.inner.config.ws_url(project_id) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Cannot build push channel URL: {}", e);
                return;
            }
        };

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!("Push channel needs a Tokio runtime: {}", e);
                return;
            }
        };

        let generation = {
            let mut slot = self.inner.slot.lock();
            slot.generation += 1;
            slot.project_id = Some(project_id.to_string());
            // Dropping the old sender makes a live channel close itself
            slot.outbound = None;
            self.inner.connected.send_replace(false);
            slot.generation
        };

        tracing::debug!("Opening push channel {} (generation {})", url, generation);
        runtime.spawn(run_channel(self.inner.clone(), generation, url));
    }

    /// Closes the channel and cancels any pending reconnect. Idempotent.
    pub fn disconnect(&self) {
        let was_open = {
            let mut slot = self.inner.slot.lock();
            slot.generation += 1;
            slot.project_id = None;
            self.inner.connected.send_replace(false);
            slot.outbound.take().is_some()
        };

        if was_open {
            tracing::info!("Push channel disconnected");
        }
    }

    /// Serialises `data` and sends it if the channel is open. Dropped silently
    /// otherwise.
    pub fn send<T: Serialize + ?Sized>(&self, data: &T) {
        let text = match serde_json::to_string(data) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Failed to serialise outbound message: {}", e);
                return;
            }
        };

        let slot = self.inner.slot.lock();
        match slot.outbound.as_ref() {
            Some(tx) if self.is_connected() => {
                if tx.send(text).is_err() {
                    tracing::debug!("Push channel closing; outbound message dropped");
                }
            }
            _ => tracing::debug!("Push channel not connected; outbound message dropped"),
        }
    }

    /// Registers `callback` for events of `kind`. Listeners run on the channel
    /// task and must not block.
    pub fn on<F>(&self, kind: PushEventKind, callback: F) -> ListenerId
    where
        F: Fn(&PushEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.inner.next_listener.fetch_add(1, Ordering::Relaxed));
        self.inner
            .listeners
            .write()
            .entry(kind)
            .or_default()
            .push((id, Arc::new(callback)));
        id
    }

    /// Unregisters a listener. Unknown ids are ignored.
    pub fn off(&self, kind: PushEventKind, id: ListenerId) {
        let mut listeners = self.inner.listeners.write();
        if let Some(entries) = listeners.get_mut(&kind) {
            entries.retain(|(existing, _)| *existing != id);
            if entries.is_empty() {
                listeners.remove(&kind);
            }
        }
    }

    pub fn listener_count(&self, kind: PushEventKind) -> usize {
        self.inner
            .listeners
            .read()
            .get(&kind)
            .map_or(0, Vec::len)
    }

    pub fn is_connected(&self) -> bool {
        *self.inner.connected.borrow()
    }

    pub fn connection_state(&self) -> watch::Receiver<bool> {
        self.inner.connected.subscribe()
    }

    /// Project of the most recent `connect`, until `disconnect`.
    pub fn project_id(&self) -> Option<String> {
        self.inner.slot.lock().project_id.clone()
    }
}

impl Inner {
    fn is_current(&self, generation: u64) -> bool {
        self.slot.lock().generation == generation
    }

    /// Publishes an opened socket. Returns `None` if the channel was superseded
    /// while the handshake was in flight.
    fn opened(&self, generation: u64) -> Option<mpsc::UnboundedReceiver<String>> {
        let mut slot = self.slot.lock();
        if slot.generation != generation {
            return None;
        }
        let (tx, rx) = mpsc::unbounded_channel();
        slot.outbound = Some(tx);
        self.connected.send_replace(true);
        Some(rx)
    }

    /// Clears the connected flag after a close. Returns whether this
    /// generation is still current and should retry.
    fn closed(&self, generation: u64) -> bool {
        let mut slot = self.slot.lock();
        if slot.generation != generation {
            return false;
        }
        slot.outbound = None;
        self.connected.send_replace(false);
        true
    }

    fn should_retry(&self, generation: u64) -> bool {
        self.is_current(generation) && !*self.connected.borrow()
    }

    fn dispatch(&self, text: &str) {
        let event = match PushEvent::parse(text) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!("Failed to parse push event: {}", e);
                return;
            }
        };

        let snapshot: Vec<Listener> = self
            .listeners
            .read()
            .get(&event.kind())
            .map(|entries| entries.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default();

        for listener in snapshot {
            listener(&event);
        }
    }
}

async fn run_channel(inner: Arc<Inner>, generation: u64, url: Url) {
    loop {
        open_once(&inner, generation, &url).await;

        if !inner.closed(generation) {
            return;
        }

        let delay = inner.config.reconnect_delay;
        tracing::debug!("Push channel closed; reconnecting in {:?}", delay);
        tokio::time::sleep(delay).await;

        if !inner.should_retry(generation) {
            return;
        }
    }
}

/// Opens one socket and pumps it until it closes or is superseded.
async fn open_once(inner: &Inner, generation: u64, url: &Url) {
    let ws = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((ws, _)) => ws,
        Err(e) => {
            tracing::warn!("Push channel connect to {} failed: {}", url, e);
            return;
        }
    };

    let Some(mut outbound) = inner.opened(generation) else {
        let mut ws = ws;
        let _ = ws.close(None).await;
        return;
    };
    tracing::info!("Push channel connected: {}", url);

    let (mut sink, mut stream) = ws.split();
    loop {
        tokio::select! {
            next = outbound.recv() => match next {
                Some(text) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        tracing::warn!("Push channel send failed: {}", e);
                        break;
                    }
                }
                None => {
                    // Sender dropped by disconnect/connect
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => inner.dispatch(&text),
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!("Push channel closed by server: {:?}", frame);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("Push channel error: {}", e);
                    break;
                }
                None => break,
            },
        }
    }
}
