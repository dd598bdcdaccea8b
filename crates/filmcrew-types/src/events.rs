use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events sent over the WebSocket gateway.
///
/// Message and typing events are delivered only to the participants of the
/// conversation they belong to; presence updates are broadcast to everyone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Server confirms successful authentication
    Ready { user_id: Uuid, display_name: String },

    /// A new message was posted. This event is the only path by which a new
    /// row reaches a live client's message list; the HTTP response to the
    /// send call is delivery confirmation, not a second source of the row.
    MessageCreate {
        id: Uuid,
        conversation_id: Uuid,
        sender_id: Uuid,
        body: String,
        created_at: DateTime<Utc>,
    },

    /// The other participant marked these messages as read
    MessagesRead {
        conversation_id: Uuid,
        reader_id: Uuid,
        message_ids: Vec<Uuid>,
    },

    /// A user is typing in a conversation. Re-sent on every keystroke the
    /// sender makes, so receipt of any one of these keeps the indicator
    /// alive on the other side.
    TypingStart { conversation_id: Uuid, user_id: Uuid },

    /// No typing keep-alive arrived within the timeout, or the typist
    /// disconnected
    TypingStop { conversation_id: Uuid, user_id: Uuid },

    /// Fresh total of unread messages for the receiving user
    UnreadCount { total: i64 },

    /// A user came online or went offline
    PresenceUpdate {
        user_id: Uuid,
        display_name: String,
        online: bool,
    },
}

/// Commands sent FROM client TO server over WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayCommand {
    /// Authenticate the WebSocket connection
    Identify { token: String },

    /// Indicate typing in a conversation. Clients send this on every
    /// keystroke; the server relays it and arms the expiry timer.
    Typing { conversation_id: Uuid },
}
