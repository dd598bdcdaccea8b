use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use filmcrew_types::api::{Claims, ConnectionListQuery, ConnectionRequestBody};
use filmcrew_types::models::{Connection, ConnectionStatus};

use crate::auth::AppState;
use crate::convert;
use crate::error::{ApiError, ApiResult};

/// POST /connections — request a connection with another member.
pub async fn request_connection(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ConnectionRequestBody>,
) -> ApiResult<impl IntoResponse> {
    if req.addressee_id == claims.sub {
        return Err(ApiError::invalid("cannot connect with yourself"));
    }

    let me = claims.sub.to_string();
    let them = req.addressee_id.to_string();

    let addressee = state.db.get_profile(&them)?.ok_or(ApiError::NotFound)?;

    if let Some(existing) = state.db.find_live_connection(&me, &them)? {
        let code = if existing.status == "pending" {
            "connection_pending"
        } else {
            "connection_exists"
        };
        return Err(ApiError::conflict(
            code,
            "a connection with this member already exists",
        ));
    }

    let id = Uuid::new_v4().to_string();
    state.db.create_connection(&id, &me, &them)?;

    let row = state
        .db
        .get_connection(&id)?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("connection vanished after insert")))?;

    Ok((StatusCode::CREATED, Json(convert::connection(row, addressee))))
}

/// GET /connections?status= — the viewer's connections, newest first.
pub async fn list_connections(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ConnectionListQuery>,
) -> ApiResult<Json<Vec<Connection>>> {
    let rows = state.db.list_connections_for_user(
        &claims.sub.to_string(),
        query.status.map(|s| s.as_str()),
    )?;

    Ok(Json(
        rows.into_iter()
            .map(|(row, other)| convert::connection(row, other))
            .collect(),
    ))
}

pub async fn accept_connection(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Connection>> {
    respond(state, claims, id, ConnectionStatus::Accepted).await
}

pub async fn decline_connection(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Connection>> {
    respond(state, claims, id, ConnectionStatus::Declined).await
}

/// Only the addressee of a pending request may answer it.
async fn respond(
    state: AppState,
    claims: Claims,
    id: Uuid,
    status: ConnectionStatus,
) -> ApiResult<Json<Connection>> {
    let me = claims.sub.to_string();
    let row = state
        .db
        .get_connection(&id.to_string())?
        .ok_or(ApiError::NotFound)?;

    if row.requester_id != me && row.addressee_id != me {
        // Non-participants cannot learn the row exists.
        return Err(ApiError::NotFound);
    }
    if row.addressee_id != me {
        return Err(ApiError::Forbidden);
    }
    if row.status != "pending" {
        return Err(ApiError::conflict(
            "invalid_transition",
            format!("connection is already {}", row.status),
        ));
    }

    state.db.set_connection_status(&row.id, status.as_str())?;

    let updated = state
        .db
        .get_connection(&row.id)?
        .ok_or(ApiError::NotFound)?;
    let other = state
        .db
        .get_profile(&updated.requester_id)?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(convert::connection(updated, other)))
}

/// DELETE /connections/{id} — either participant can withdraw or sever.
pub async fn remove_connection(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let me = claims.sub.to_string();
    let row = state
        .db
        .get_connection(&id.to_string())?
        .ok_or(ApiError::NotFound)?;

    if row.requester_id != me && row.addressee_id != me {
        return Err(ApiError::NotFound);
    }

    state.db.delete_connection(&row.id)?;
    Ok(StatusCode::NO_CONTENT)
}
