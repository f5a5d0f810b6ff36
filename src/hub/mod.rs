//! Broadcast router - connection registry and snapshot fan-out
//!
//! The hub owns the set of live connections. The simulation hands it one
//! encoded snapshot per tick; the hub posts it to every connection's egress
//! queue. A connection whose queue is full gets evicted on the spot, so a
//! stalled viewer can never hold up the tick loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::Notify;
use tracing::{debug, warn};

/// Connection identifier, allocated per WebSocket upgrade
pub type ConnId = u64;

/// Egress queue capacity, in messages
pub const EGRESS_CAPACITY: usize = 256;

/// Sender side of one connection's egress queue, plus its close signal.
///
/// Clones are held by the hub registry and by the player this connection
/// controls; the writer task holds the receiver.
#[derive(Clone)]
pub struct ConnHandle {
    id: ConnId,
    tx: mpsc::Sender<String>,
    shutdown: Arc<AtomicBool>,
    shutdown_signal: Arc<Notify>,
}

impl ConnHandle {
    /// Create a handle and the matching egress receiver for the writer task
    pub fn new(id: ConnId) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(EGRESS_CAPACITY);
        let handle = Self {
            id,
            tx,
            shutdown: Arc::new(AtomicBool::new(false)),
            shutdown_signal: Arc::new(Notify::new()),
        };
        (handle, rx)
    }

    pub fn id(&self) -> ConnId {
        self.id
    }

    /// Post one encoded message onto the egress queue without blocking
    pub fn try_send(&self, message: String) -> Result<(), TrySendError<String>> {
        self.tx.try_send(message)
    }

    /// Signal the writer task to send a close frame and exit
    pub fn close(&self) {
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            self.shutdown_signal.notify_one();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Resolve once `close` has been called
    pub async fn closed(&self) {
        if self.is_closed() {
            return;
        }
        self.shutdown_signal.notified().await;
    }
}

/// Cloneable handle for talking to the hub task
#[derive(Clone)]
pub struct HubHandle {
    register_tx: mpsc::Sender<ConnHandle>,
    unregister_tx: mpsc::Sender<ConnId>,
    broadcast_tx: mpsc::Sender<String>,
    next_conn_id: Arc<AtomicU64>,
    connections: Arc<AtomicUsize>,
}

impl HubHandle {
    /// Allocate an id for a newly upgraded connection
    pub fn next_conn_id(&self) -> ConnId {
        self.next_conn_id.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn register(&self, handle: ConnHandle) {
        let _ = self.register_tx.send(handle).await;
    }

    pub async fn unregister(&self, conn_id: ConnId) {
        let _ = self.unregister_tx.send(conn_id).await;
    }

    /// Queue a message for fan-out to every registered connection
    pub async fn broadcast(&self, message: String) {
        let _ = self.broadcast_tx.send(message).await;
    }

    /// Number of currently registered connections
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }
}

/// The hub task state. Single owner of the connection registry; all access
/// goes through the three channels.
pub struct Hub {
    register_rx: mpsc::Receiver<ConnHandle>,
    unregister_rx: mpsc::Receiver<ConnId>,
    broadcast_rx: mpsc::Receiver<String>,
    conns: HashMap<ConnId, ConnHandle>,
    connections: Arc<AtomicUsize>,
}

impl Hub {
    pub fn new() -> (Self, HubHandle) {
        let (register_tx, register_rx) = mpsc::channel(64);
        let (unregister_tx, unregister_rx) = mpsc::channel(64);
        let (broadcast_tx, broadcast_rx) = mpsc::channel(16);
        let connections = Arc::new(AtomicUsize::new(0));

        let hub = Self {
            register_rx,
            unregister_rx,
            broadcast_rx,
            conns: HashMap::new(),
            connections: connections.clone(),
        };
        let handle = HubHandle {
            register_tx,
            unregister_tx,
            broadcast_tx,
            next_conn_id: Arc::new(AtomicU64::new(1)),
            connections,
        };
        (hub, handle)
    }

    /// Run the hub loop until every handle is dropped
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(handle) = self.register_rx.recv() => self.handle_register(handle),
                Some(conn_id) = self.unregister_rx.recv() => self.handle_unregister(conn_id),
                Some(message) = self.broadcast_rx.recv() => self.handle_broadcast(message),
                else => break,
            }
        }
    }

    fn handle_register(&mut self, handle: ConnHandle) {
        debug!(conn_id = handle.id(), "connection registered");
        self.conns.insert(handle.id(), handle);
        self.connections.store(self.conns.len(), Ordering::Relaxed);
    }

    fn handle_unregister(&mut self, conn_id: ConnId) {
        if let Some(handle) = self.conns.remove(&conn_id) {
            handle.close();
            debug!(conn_id, "connection unregistered");
            self.connections.store(self.conns.len(), Ordering::Relaxed);
        }
    }

    fn handle_broadcast(&mut self, message: String) {
        let mut evicted: Vec<ConnId> = Vec::new();
        for (conn_id, handle) in &self.conns {
            if let Err(e) = handle.try_send(message.clone()) {
                match e {
                    TrySendError::Full(_) => {
                        warn!(conn_id, "egress queue full, dropping connection");
                    }
                    TrySendError::Closed(_) => {
                        debug!(conn_id, "egress queue closed, dropping connection");
                    }
                }
                evicted.push(*conn_id);
            }
        }
        for conn_id in evicted {
            if let Some(handle) = self.conns.remove(&conn_id) {
                handle.close();
            }
        }
        self.connections.store(self.conns.len(), Ordering::Relaxed);
    }
}
