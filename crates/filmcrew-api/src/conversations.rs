use std::cmp::Ordering;
use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;
use uuid::Uuid;

use filmcrew_db::models::{ConversationRow, MessageRow, ProfileRow};
use filmcrew_types::api::{
    Claims, MarkReadResponse, MessageListResponse, SendMessageRequest, StartConversationRequest,
    StartConversationResponse, UnreadCountResponse,
};
use filmcrew_types::events::GatewayEvent;
use filmcrew_types::models::{ConversationPreview, Message};

use crate::auth::AppState;
use crate::convert;
use crate::error::{ApiError, ApiResult};

/// POST /conversations — the find-or-create keyed by the unordered user
/// pair. Messaging someone twice always lands in the same thread.
pub async fn start_conversation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<StartConversationRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.other_user_id == claims.sub {
        return Err(ApiError::invalid("cannot start a conversation with yourself"));
    }

    let me = claims.sub.to_string();
    let other = req.other_user_id.to_string();
    state.db.get_profile(&other)?.ok_or(ApiError::NotFound)?;

    let (row, created) =
        state
            .db
            .find_or_create_conversation(&Uuid::new_v4().to_string(), &me, &other)?;

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((
        status,
        Json(StartConversationResponse {
            conversation: convert::conversation(&row),
            created,
        }),
    ))
}

/// GET /conversations — ordered inbox previews.
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<ConversationPreview>>> {
    let viewer = claims.sub.to_string();

    // Two reads feed one assembly pass; run the blocking work off the
    // async runtime.
    let db = state.db.clone();
    let uid = viewer.clone();
    let (pairs, newest_first) = tokio::task::spawn_blocking(move || {
        let pairs = db.conversations_for_user(&uid)?;
        let ids: Vec<String> = pairs.iter().map(|(conv, _)| conv.id.clone()).collect();
        let newest_first = db.messages_for_conversations(&ids)?;
        Ok::<_, anyhow::Error>((pairs, newest_first))
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(e.into())
    })??;

    Ok(Json(build_previews(&viewer, pairs, newest_first)))
}

/// One pass over the newest-first batch builds both maps: the first message
/// seen per conversation is its latest, and unread increments for messages
/// addressed to the viewer with no read timestamp. Previews then sort by
/// latest-message recency; conversations with no messages keep their
/// incoming relative order at the tail.
pub(crate) fn build_previews(
    viewer_id: &str,
    pairs: Vec<(ConversationRow, ProfileRow)>,
    newest_first: Vec<MessageRow>,
) -> Vec<ConversationPreview> {
    let mut latest: HashMap<String, MessageRow> = HashMap::new();
    let mut unread: HashMap<String, i64> = HashMap::new();

    for message in newest_first {
        if message.sender_id != viewer_id && message.read_at.is_none() {
            *unread.entry(message.conversation_id.clone()).or_default() += 1;
        }
        latest.entry(message.conversation_id.clone()).or_insert(message);
    }

    let mut previews: Vec<ConversationPreview> = pairs
        .into_iter()
        .map(|(conv, other)| ConversationPreview {
            conversation_id: convert::parse_id(&conv.id, "conversation"),
            other: convert::profile(other),
            last_message: latest.remove(&conv.id).map(convert::message),
            unread_count: unread.get(&conv.id).copied().unwrap_or(0),
        })
        .collect();

    previews.sort_by(|a, b| match (&a.last_message, &b.last_message) {
        (Some(x), Some(y)) => y.created_at.cmp(&x.created_at),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    previews
}

/// GET /conversations/{id}/messages — full history, oldest first.
/// Non-participants see a missing resource, not a denied one.
pub async fn get_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(conversation_id): Path<Uuid>,
) -> ApiResult<Json<MessageListResponse>> {
    let cid = conversation_id.to_string();
    if !state.db.is_participant(&cid, &claims.sub.to_string())? {
        return Err(ApiError::NotFound);
    }

    let db = state.db.clone();
    let rows = tokio::task::spawn_blocking(move || db.messages_for_conversation(&cid))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })??;

    Ok(Json(MessageListResponse {
        messages: rows.into_iter().map(convert::message).collect(),
    }))
}

/// POST /conversations/{id}/messages — insert the trimmed body, then emit
/// `MessageCreate` to both participants. The gateway event is the sole
/// writer of new rows into live message lists; this response only confirms
/// delivery, so either arrival order is fine.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(conversation_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let body = req.body.trim();
    if body.is_empty() {
        return Err(ApiError::invalid("message body cannot be empty"));
    }

    let me = claims.sub.to_string();
    let conv = state
        .db
        .get_conversation(&conversation_id.to_string())?
        .ok_or(ApiError::NotFound)?;
    let other = conv.other_participant(&me).ok_or(ApiError::NotFound)?;
    let other_id = convert::parse_id(other, "conversation participant");

    let message_id = Uuid::new_v4();
    state
        .db
        .insert_message(&message_id.to_string(), &conv.id, &me, body)?;

    let now = chrono::Utc::now();
    let event = GatewayEvent::MessageCreate {
        id: message_id,
        conversation_id,
        sender_id: claims.sub,
        body: body.to_string(),
        created_at: now,
    };

    state.dispatcher.send_to_user(claims.sub, event.clone()).await;
    state.dispatcher.send_to_user(other_id, event).await;

    // Badge refresh for the recipient.
    let total = state.db.unread_count_for_user(other)?;
    state
        .dispatcher
        .send_to_user(other_id, GatewayEvent::UnreadCount { total })
        .await;

    Ok((
        StatusCode::CREATED,
        Json(Message {
            id: message_id,
            conversation_id,
            sender_id: claims.sub,
            body: body.to_string(),
            created_at: now,
            read_at: None,
        }),
    ))
}

/// POST /conversations/{id}/read — one batched update marks everything
/// addressed to the caller as read, and reports exactly which messages
/// were touched.
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(conversation_id): Path<Uuid>,
) -> ApiResult<Json<MarkReadResponse>> {
    let me = claims.sub.to_string();
    let conv = state
        .db
        .get_conversation(&conversation_id.to_string())?
        .ok_or(ApiError::NotFound)?;
    let other = conv.other_participant(&me).ok_or(ApiError::NotFound)?;
    let other_id = convert::parse_id(other, "conversation participant");

    let raw_ids = state.db.mark_conversation_read(&conv.id, &me)?;
    let message_ids: Vec<Uuid> = raw_ids
        .iter()
        .map(|raw| convert::parse_id(raw, "message"))
        .collect();

    if !message_ids.is_empty() {
        state
            .dispatcher
            .send_to_user(
                other_id,
                GatewayEvent::MessagesRead {
                    conversation_id,
                    reader_id: claims.sub,
                    message_ids: message_ids.clone(),
                },
            )
            .await;

        let total = state.db.unread_count_for_user(&me)?;
        state
            .dispatcher
            .send_to_user(claims.sub, GatewayEvent::UnreadCount { total })
            .await;
    }

    Ok(Json(MarkReadResponse { message_ids }))
}

/// GET /unread-count — the authoritative badge total, computed server-side.
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<UnreadCountResponse>> {
    let total = state.db.unread_count_for_user(&claims.sub.to_string())?;
    Ok(Json(UnreadCountResponse { total }))
}

#[cfg(test)]
mod tests {
    use super::build_previews;
    use filmcrew_db::models::{ConversationRow, MessageRow, ProfileRow};

    fn conv(id: &str, low: &str, high: &str) -> ConversationRow {
        ConversationRow {
            id: id.into(),
            user_low: low.into(),
            user_high: high.into(),
            created_at: "2026-08-01 10:00:00".into(),
        }
    }

    fn profile(id: &str) -> ProfileRow {
        ProfileRow {
            id: id.into(),
            email: format!("{}@example.com", id),
            display_name: id.into(),
            headline: None,
            department: None,
            location: None,
            bio: None,
            avatar_key: None,
            created_at: "2026-08-01 09:00:00".into(),
        }
    }

    fn message(
        id: &str,
        conversation: &str,
        sender: &str,
        created_at: &str,
        read: bool,
    ) -> MessageRow {
        MessageRow {
            id: id.into(),
            conversation_id: conversation.into(),
            sender_id: sender.into(),
            body: format!("body of {}", id),
            created_at: created_at.into(),
            read_at: read.then(|| created_at.to_string()),
        }
    }

    #[test]
    fn newest_first_input_means_first_occurrence_is_the_latest() {
        let pairs = vec![(conv("c1", "me", "b"), profile("b"))];
        let newest_first = vec![
            message("m3", "c1", "b", "2026-08-02 12:02:00", false),
            message("m2", "c1", "me", "2026-08-02 12:01:00", false),
            message("m1", "c1", "b", "2026-08-02 12:00:00", true),
        ];

        let previews = build_previews("me", pairs, newest_first);
        assert_eq!(previews.len(), 1);
        let last = previews[0].last_message.as_ref().unwrap();
        assert_eq!(last.body, "body of m3");
        // m3 is unread and from b; m1 is read, m2 is the viewer's own.
        assert_eq!(previews[0].unread_count, 1);
    }

    #[test]
    fn sorts_by_latest_recency_with_empty_conversations_last() {
        let pairs = vec![
            (conv("quiet1", "me", "b"), profile("b")),
            (conv("old", "me", "c"), profile("c")),
            (conv("quiet2", "me", "d"), profile("d")),
            (conv("busy", "me", "e"), profile("e")),
        ];
        let newest_first = vec![
            message("m2", "busy", "e", "2026-08-02 12:00:00", false),
            message("m1", "old", "c", "2026-08-01 12:00:00", false),
        ];

        let order: Vec<String> = build_previews("me", pairs, newest_first)
            .into_iter()
            .map(|p| p.other.display_name)
            .collect();

        // Active conversations by recency, then the empty ones in their
        // original relative order.
        assert_eq!(order, vec!["e", "c", "b", "d"]);
    }

    #[test]
    fn unread_counts_only_messages_addressed_to_the_viewer() {
        let pairs = vec![(conv("c1", "a", "me"), profile("a"))];
        let newest_first = vec![
            message("m4", "c1", "a", "2026-08-02 12:03:00", false),
            message("m3", "c1", "a", "2026-08-02 12:02:00", false),
            message("m2", "c1", "me", "2026-08-02 12:01:00", false),
            message("m1", "c1", "a", "2026-08-02 12:00:00", true),
        ];

        let previews = build_previews("me", pairs, newest_first);
        assert_eq!(previews[0].unread_count, 2);
    }
}
