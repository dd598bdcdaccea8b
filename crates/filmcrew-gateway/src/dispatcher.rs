use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast, mpsc};
use uuid::Uuid;

use filmcrew_types::events::GatewayEvent;

use crate::typing::TypingTracker;

/// Manages all connected clients and routes events to them.
///
/// Presence updates go over the broadcast channel to every client;
/// conversation-scoped events (messages, read receipts, typing, unread
/// counts) go over per-user targeted channels, which is also where
/// participant-only visibility is enforced.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// Broadcast channel for global events
    broadcast_tx: broadcast::Sender<GatewayEvent>,

    /// Track online users: user_id -> display_name
    online_users: RwLock<HashMap<Uuid, String>>,

    /// Per-user targeted send channels: user_id -> (conn_id, sender)
    user_channels: RwLock<HashMap<Uuid, (Uuid, mpsc::UnboundedSender<GatewayEvent>)>>,

    typing: TypingTracker,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(1024);
        Self {
            inner: Arc::new(DispatcherInner {
                broadcast_tx,
                online_users: RwLock::new(HashMap::new()),
                user_channels: RwLock::new(HashMap::new()),
                typing: TypingTracker::new(),
            }),
        }
    }

    /// Subscribe to global events. Returns a broadcast receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Broadcast an event to all connected clients.
    pub fn broadcast(&self, event: GatewayEvent) {
        let _ = self.inner.broadcast_tx.send(event);
    }

    /// Register a per-user targeted channel. Returns (conn_id, receiver).
    /// A reconnect takes the slot over from any previous connection.
    pub async fn register_user_channel(
        &self,
        user_id: Uuid,
    ) -> (Uuid, mpsc::UnboundedReceiver<GatewayEvent>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .user_channels
            .write()
            .await
            .insert(user_id, (conn_id, tx));
        (conn_id, rx)
    }

    /// Unregister a per-user targeted channel, but only if conn_id matches.
    pub async fn unregister_user_channel(&self, user_id: Uuid, conn_id: Uuid) {
        let mut channels = self.inner.user_channels.write().await;
        if let Some((stored_conn_id, _)) = channels.get(&user_id) {
            if *stored_conn_id == conn_id {
                channels.remove(&user_id);
            }
        }
    }

    /// Send a targeted event to a specific user. Dropped silently when the
    /// user has no live connection.
    pub async fn send_to_user(&self, user_id: Uuid, event: GatewayEvent) {
        let channels = self.inner.user_channels.read().await;
        if let Some((_, tx)) = channels.get(&user_id) {
            let _ = tx.send(event);
        }
    }

    /// Register a user as online.
    pub async fn user_online(&self, user_id: Uuid, display_name: String) {
        self.inner
            .online_users
            .write()
            .await
            .insert(user_id, display_name.clone());

        self.broadcast(GatewayEvent::PresenceUpdate {
            user_id,
            display_name,
            online: true,
        });
    }

    /// Register a user as offline. Only cleans up if conn_id matches.
    pub async fn user_offline(&self, user_id: Uuid, conn_id: Uuid) {
        // Only clean up if this connection still owns the user channel
        let is_current = {
            let channels = self.inner.user_channels.read().await;
            channels
                .get(&user_id)
                .map_or(false, |(cid, _)| *cid == conn_id)
        };

        if !is_current {
            // A newer connection has taken over — don't touch anything
            return;
        }

        let display_name = self
            .inner
            .online_users
            .write()
            .await
            .remove(&user_id)
            .unwrap_or_default();

        // The typist vanished mid-keystroke; tell the other side now rather
        // than leaving it to the timeout.
        for (conversation_id, other) in self.inner.typing.clear_user(user_id) {
            self.send_to_user(
                other,
                GatewayEvent::TypingStop {
                    conversation_id,
                    user_id,
                },
            )
            .await;
        }

        self.unregister_user_channel(user_id, conn_id).await;

        self.broadcast(GatewayEvent::PresenceUpdate {
            user_id,
            display_name,
            online: false,
        });
    }

    /// Get list of online users.
    pub async fn online_users(&self) -> Vec<(Uuid, String)> {
        self.inner
            .online_users
            .read()
            .await
            .iter()
            .map(|(id, name)| (*id, name.clone()))
            .collect()
    }

    pub async fn online_user_ids(&self) -> Vec<Uuid> {
        self.inner.online_users.read().await.keys().copied().collect()
    }

    /// Relay a typing keep-alive: `TypingStart` to the other participant on
    /// every keystroke, `TypingStop` when the dead-man's-switch expires.
    pub async fn typing(&self, conversation_id: Uuid, typist: Uuid, other: Uuid) {
        self.send_to_user(
            other,
            GatewayEvent::TypingStart {
                conversation_id,
                user_id: typist,
            },
        )
        .await;

        let dispatcher = self.clone();
        self.inner
            .typing
            .refresh(conversation_id, typist, other, move || async move {
                dispatcher
                    .send_to_user(
                        other,
                        GatewayEvent::TypingStop {
                            conversation_id,
                            user_id: typist,
                        },
                    )
                    .await;
            });
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stale_connection_does_not_clobber_a_takeover() {
        let dispatcher = Dispatcher::new();
        let user = Uuid::new_v4();

        let (old_conn, _old_rx) = dispatcher.register_user_channel(user).await;
        dispatcher.user_online(user, "ava".into()).await;

        // Reconnect takes the slot over.
        let (_new_conn, mut new_rx) = dispatcher.register_user_channel(user).await;

        // The old connection tearing down must not remove the new channel
        // or mark the user offline.
        dispatcher.user_offline(user, old_conn).await;

        dispatcher
            .send_to_user(user, GatewayEvent::UnreadCount { total: 3 })
            .await;
        assert!(matches!(
            new_rx.try_recv(),
            Ok(GatewayEvent::UnreadCount { total: 3 })
        ));
        assert_eq!(dispatcher.online_user_ids().await, vec![user]);
    }

    #[tokio::test(start_paused = true)]
    async fn typing_relays_start_then_stop_to_the_other_participant() {
        let dispatcher = Dispatcher::new();
        let (typist, other, conv) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        let (_conn, mut rx) = dispatcher.register_user_channel(other).await;

        dispatcher.typing(conv, typist, other).await;
        assert!(matches!(
            rx.try_recv(),
            Ok(GatewayEvent::TypingStart { .. })
        ));

        tokio::time::sleep(crate::typing::TYPING_TIMEOUT + std::time::Duration::from_millis(100))
            .await;
        assert!(matches!(rx.try_recv(), Ok(GatewayEvent::TypingStop { .. })));
    }
}
