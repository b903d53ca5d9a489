//! Room-per-member real-time delivery.
//!
//! A session authenticates with the same access token used for the API
//! and joins exactly one room, keyed by its own member id. Publishing
//! never blocks: a session whose buffer is full or whose receiver is
//! gone simply misses the event. Stored notifications remain the
//! durable record.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use serde::Serialize;
use taskhub_auth::AuthConfig;
use taskhub_auth::token::validate_access_token;
use taskhub_core::error::TaskhubResult;
use taskhub_core::models::notification::Notification;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info};
use uuid::Uuid;

/// Payload pushed to connected sessions.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RealtimeEvent {
    Notification(Notification),
}

/// Fire-and-forget delivery to every live session of a member.
pub trait RealtimePublisher: Send + Sync {
    fn publish(&self, recipient_id: Uuid, event: RealtimeEvent);
}

struct Subscriber {
    session_id: u64,
    tx: mpsc::Sender<RealtimeEvent>,
}

/// In-process hub holding one room per connected member.
pub struct RoomHub {
    rooms: DashMap<Uuid, Vec<Subscriber>>,
    auth: AuthConfig,
    buffer: usize,
    next_session_id: AtomicU64,
}

impl RoomHub {
    pub fn new(auth: AuthConfig, buffer: usize) -> Arc<Self> {
        Arc::new(Self {
            rooms: DashMap::new(),
            auth,
            buffer: buffer.max(1),
            next_session_id: AtomicU64::new(1),
        })
    }

    /// Authenticate `token` and join the caller's own room.
    ///
    /// An invalid or expired token fails before any room is touched.
    pub fn connect(self: &Arc<Self>, token: &str) -> TaskhubResult<RealtimeSession> {
        let claims = validate_access_token(token, &self.auth)?;
        let actor = claims.actor()?;

        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.buffer);
        self.rooms
            .entry(actor.id)
            .or_default()
            .push(Subscriber { session_id, tx });

        info!(member_id = %actor.id, session_id, "real-time session joined");
        Ok(RealtimeSession {
            member_id: actor.id,
            tenant_id: actor.tenant_id,
            session_id,
            rx,
            hub: Arc::downgrade(self),
        })
    }

    /// Live sessions in `member_id`'s room.
    pub fn session_count(&self, member_id: Uuid) -> usize {
        self.rooms.get(&member_id).map(|room| room.len()).unwrap_or(0)
    }

    fn leave(&self, member_id: Uuid, session_id: u64) {
        if let Some(mut room) = self.rooms.get_mut(&member_id) {
            room.retain(|s| s.session_id != session_id);
        }
        self.rooms.remove_if(&member_id, |_, room| room.is_empty());
        debug!(member_id = %member_id, session_id, "real-time session left");
    }
}

impl RealtimePublisher for RoomHub {
    fn publish(&self, recipient_id: Uuid, event: RealtimeEvent) {
        let Some(room) = self.rooms.get(&recipient_id) else {
            debug!(recipient_id = %recipient_id, "no live session; event dropped");
            return;
        };

        for subscriber in room.iter() {
            match subscriber.tx.try_send(event.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => debug!(
                    recipient_id = %recipient_id,
                    session_id = subscriber.session_id,
                    "session buffer full; event dropped"
                ),
                Err(TrySendError::Closed(_)) => debug!(
                    recipient_id = %recipient_id,
                    session_id = subscriber.session_id,
                    "session closed; event dropped"
                ),
            }
        }
    }
}

/// One connected client. Dropping it leaves the room.
#[derive(Debug)]
pub struct RealtimeSession {
    member_id: Uuid,
    tenant_id: Uuid,
    session_id: u64,
    rx: mpsc::Receiver<RealtimeEvent>,
    hub: Weak<RoomHub>,
}

impl RealtimeSession {
    pub fn member_id(&self) -> Uuid {
        self.member_id
    }

    pub fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }

    /// Next event, in publish order. `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<RealtimeEvent> {
        self.rx.recv().await
    }

    /// Next event if one is already buffered.
    pub fn try_recv(&mut self) -> Option<RealtimeEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for RealtimeSession {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.leave(self.member_id, self.session_id);
        }
    }
}
