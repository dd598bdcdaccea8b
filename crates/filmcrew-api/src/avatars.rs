use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, header},
    response::IntoResponse,
};
use bytes::Bytes;
use serde_json::json;
use uuid::Uuid;

use filmcrew_types::api::Claims;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};

const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

fn content_type_for(key: &str) -> &'static str {
    if key.ends_with(".png") {
        "image/png"
    } else if key.ends_with(".webp") {
        "image/webp"
    } else {
        "image/jpeg"
    }
}

/// POST /profiles/me/avatar — raw image bytes, keyed on disk by user id.
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let ext = extension_for(content_type).ok_or_else(|| {
        ApiError::invalid("avatar must be image/png, image/jpeg, or image/webp")
    })?;

    if body.is_empty() {
        return Err(ApiError::invalid("empty image body"));
    }
    if body.len() > MAX_AVATAR_BYTES {
        return Err(ApiError::invalid("image exceeds 5 MiB"));
    }

    let user_id = claims.sub.to_string();
    let profile = state.db.get_profile(&user_id)?.ok_or(ApiError::NotFound)?;

    let key = format!("{}.{}", user_id, ext);
    state.storage.save(&key, &body).await?;

    // A re-upload with a different image type leaves the old file behind.
    if let Some(old_key) = profile.avatar_key {
        if old_key != key {
            state.storage.delete(&old_key).await.ok();
        }
    }

    state.db.set_avatar_key(&user_id, &key)?;

    Ok(Json(json!({ "avatar_url": format!("/avatars/{}", user_id) })))
}

/// GET /avatars/{user_id} — public fetch of the stored image.
pub async fn get_avatar(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let profile = state
        .db
        .get_profile(&user_id.to_string())?
        .ok_or(ApiError::NotFound)?;
    let key = profile.avatar_key.ok_or(ApiError::NotFound)?;

    let data = state.storage.read(&key).await?.ok_or(ApiError::NotFound)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&key)),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=300"),
    );

    Ok((headers, data))
}
