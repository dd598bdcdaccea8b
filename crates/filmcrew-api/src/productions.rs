use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use filmcrew_types::api::{Claims, CreateProductionRequest, UpdateProductionRequest};
use filmcrew_types::models::{Production, ProductionStatus};

use crate::auth::AppState;
use crate::companies::require_manager;
use crate::convert;
use crate::error::{ApiError, ApiResult};

/// POST /companies/{id}/productions
pub async fn create_production(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateProductionRequest>,
) -> ApiResult<impl IntoResponse> {
    let company_id = id.to_string();
    state.db.get_company(&company_id)?.ok_or(ApiError::NotFound)?;
    require_manager(&state, &company_id, &claims.sub.to_string())?;

    let title = req.title.trim();
    if title.is_empty() {
        return Err(ApiError::invalid("production title cannot be empty"));
    }

    let production_id = Uuid::new_v4().to_string();
    state.db.create_production(
        &production_id,
        &company_id,
        title,
        req.logline.as_deref(),
        req.status.unwrap_or(ProductionStatus::Development).as_str(),
        req.starts_on.as_deref(),
        req.wraps_on.as_deref(),
    )?;

    let row = state
        .db
        .get_production(&production_id)?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("production vanished after insert")))?;

    Ok((StatusCode::CREATED, Json(convert::production(row))))
}

/// GET /companies/{id}/productions
pub async fn list_productions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<Production>>> {
    let company_id = id.to_string();
    state.db.get_company(&company_id)?.ok_or(ApiError::NotFound)?;

    let rows = state.db.list_productions_for_company(&company_id)?;
    Ok(Json(rows.into_iter().map(convert::production).collect()))
}

/// GET /productions/{id}
pub async fn get_production(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Production>> {
    let row = state
        .db
        .get_production(&id.to_string())?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(convert::production(row)))
}

/// PUT /productions/{id}
pub async fn update_production(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductionRequest>,
) -> ApiResult<Json<Production>> {
    let production_id = id.to_string();
    let row = state
        .db
        .get_production(&production_id)?
        .ok_or(ApiError::NotFound)?;
    require_manager(&state, &row.company_id, &claims.sub.to_string())?;

    if let Some(title) = &req.title {
        if title.trim().is_empty() {
            return Err(ApiError::invalid("production title cannot be empty"));
        }
    }

    state.db.update_production(
        &production_id,
        req.title.as_deref().map(str::trim),
        req.logline.as_deref(),
        req.status.map(|s| s.as_str()),
        req.starts_on.as_deref(),
        req.wraps_on.as_deref(),
    )?;

    let row = state
        .db
        .get_production(&production_id)?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(convert::production(row)))
}
