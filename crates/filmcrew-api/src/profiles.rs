use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use filmcrew_types::api::{Claims, UpdateProfileRequest};
use filmcrew_types::models::Profile;

use crate::auth::AppState;
use crate::convert;
use crate::error::{ApiError, ApiResult};

pub async fn get_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Profile>> {
    let row = state
        .db
        .get_profile(&claims.sub.to_string())?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(convert::profile(row)))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<Profile>> {
    if let Some(name) = &req.display_name {
        if name.trim().is_empty() {
            return Err(ApiError::invalid("display name cannot be empty"));
        }
    }

    let id = claims.sub.to_string();
    state.db.update_profile(
        &id,
        req.display_name.as_deref().map(str::trim),
        req.headline.as_deref(),
        req.department.as_deref(),
        req.location.as_deref(),
        req.bio.as_deref(),
    )?;

    let row = state.db.get_profile(&id)?.ok_or(ApiError::NotFound)?;
    Ok(Json(convert::profile(row)))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Profile>> {
    let row = state
        .db
        .get_profile(&user_id.to_string())?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(convert::profile(row)))
}
