use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use filmcrew_types::api::{
    Claims, CreateCompanyRequest, SlugCheckQuery, SlugCheckResponse, TransferOwnershipRequest,
    UpdateCompanyRequest,
};
use filmcrew_types::models::{Company, CompanyMember, CompanyRole};

use crate::auth::AppState;
use crate::convert;
use crate::error::{ApiError, ApiResult};
use crate::slug;

/// The caller's role in the company, if they can manage it. Companies are
/// publicly readable, so a failed check is forbidden rather than hidden.
pub(crate) fn require_manager(
    state: &AppState,
    company_id: &str,
    user_id: &str,
) -> ApiResult<CompanyRole> {
    let role = state
        .db
        .member_role(company_id, user_id)?
        .and_then(|r| CompanyRole::parse(&r))
        .ok_or(ApiError::Forbidden)?;

    if !role.can_manage() {
        return Err(ApiError::Forbidden);
    }
    Ok(role)
}

/// GET /companies/check-slug?name= — derive the slug candidate for a name
/// and report whether it is free.
pub async fn check_slug(
    State(state): State<AppState>,
    Query(query): Query<SlugCheckQuery>,
) -> ApiResult<Json<SlugCheckResponse>> {
    let candidate = slug::slugify(&query.name);

    let available =
        slug::validate(&candidate).is_ok() && !state.db.slug_exists(&candidate)?;

    Ok(Json(SlugCheckResponse {
        slug: candidate,
        available,
    }))
}

/// POST /companies — create a company; the caller becomes its owner in the
/// same transaction.
pub async fn create_company(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateCompanyRequest>,
) -> ApiResult<impl IntoResponse> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::invalid("company name cannot be empty"));
    }

    let slug = match &req.slug {
        Some(explicit) => {
            let explicit = explicit.trim().to_string();
            slug::validate(&explicit).map_err(ApiError::invalid)?;
            explicit
        }
        None => {
            let derived = slug::slugify(name);
            slug::validate(&derived)
                .map_err(|_| ApiError::invalid("name does not produce a usable slug"))?;
            derived
        }
    };

    if state.db.slug_exists(&slug)? {
        return Err(ApiError::conflict("slug_taken", "that slug is already taken"));
    }

    let id = Uuid::new_v4().to_string();
    state.db.create_company(
        &id,
        name,
        &slug,
        req.description.as_deref(),
        req.website.as_deref(),
        &claims.sub.to_string(),
    )?;

    let row = state
        .db
        .get_company(&id)?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("company vanished after insert")))?;

    Ok((StatusCode::CREATED, Json(convert::company(row))))
}

/// GET /companies/{slug}
pub async fn get_company(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Company>> {
    let row = state
        .db
        .get_company_by_slug(&slug)?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(convert::company(row)))
}

/// PUT /companies/{id}
pub async fn update_company(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCompanyRequest>,
) -> ApiResult<Json<Company>> {
    let company_id = id.to_string();
    state.db.get_company(&company_id)?.ok_or(ApiError::NotFound)?;
    require_manager(&state, &company_id, &claims.sub.to_string())?;

    if let Some(name) = &req.name {
        if name.trim().is_empty() {
            return Err(ApiError::invalid("company name cannot be empty"));
        }
    }

    state.db.update_company(
        &company_id,
        req.name.as_deref().map(str::trim),
        req.description.as_deref(),
        req.website.as_deref(),
    )?;

    let row = state.db.get_company(&company_id)?.ok_or(ApiError::NotFound)?;
    Ok(Json(convert::company(row)))
}

/// GET /companies/{id}/members
pub async fn list_members(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<CompanyMember>>> {
    let company_id = id.to_string();
    state.db.get_company(&company_id)?.ok_or(ApiError::NotFound)?;

    let rows = state.db.list_members(&company_id)?;
    Ok(Json(
        rows.into_iter()
            .map(|(member, profile)| convert::member(member, profile))
            .collect(),
    ))
}

/// POST /companies/{id}/transfer-ownership — demote the caller, promote the
/// target, one transaction. Exactly one owner holds before and after.
pub async fn transfer_ownership(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<TransferOwnershipRequest>,
) -> ApiResult<Json<Vec<CompanyMember>>> {
    let company_id = id.to_string();
    let me = claims.sub.to_string();

    state.db.get_company(&company_id)?.ok_or(ApiError::NotFound)?;

    let my_role = require_manager(&state, &company_id, &me)?;
    if my_role != CompanyRole::Owner {
        return Err(ApiError::Forbidden);
    }
    if req.new_owner_id == claims.sub {
        return Err(ApiError::invalid("you already own this company"));
    }

    let target = req.new_owner_id.to_string();
    if state.db.member_role(&company_id, &target)?.is_none() {
        return Err(ApiError::conflict(
            "not_a_member",
            "ownership can only be transferred to an existing member",
        ));
    }

    state.db.transfer_ownership(&company_id, &me, &target)?;

    let rows = state.db.list_members(&company_id)?;
    Ok(Json(
        rows.into_iter()
            .map(|(member, profile)| convert::member(member, profile))
            .collect(),
    ))
}

/// DELETE /companies/{id}/members/{user_id}
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    let company_id = id.to_string();
    let me = claims.sub.to_string();
    let target = user_id.to_string();

    state.db.get_company(&company_id)?.ok_or(ApiError::NotFound)?;
    let my_role = require_manager(&state, &company_id, &me)?;

    let target_role = state
        .db
        .member_role(&company_id, &target)?
        .and_then(|r| CompanyRole::parse(&r))
        .ok_or(ApiError::NotFound)?;

    if target_role == CompanyRole::Owner {
        return Err(ApiError::conflict(
            "owner_must_transfer",
            "the owner must transfer ownership before being removed",
        ));
    }
    // Admins manage members, not each other.
    if my_role == CompanyRole::Admin && target_role == CompanyRole::Admin && me != target {
        return Err(ApiError::Forbidden);
    }

    state.db.remove_member(&company_id, &target)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /companies/{id}/leave
pub async fn leave_company(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let company_id = id.to_string();
    let me = claims.sub.to_string();

    state.db.get_company(&company_id)?.ok_or(ApiError::NotFound)?;

    let role = state
        .db
        .member_role(&company_id, &me)?
        .and_then(|r| CompanyRole::parse(&r))
        .ok_or(ApiError::NotFound)?;

    if role == CompanyRole::Owner {
        return Err(ApiError::conflict(
            "owner_must_transfer",
            "transfer ownership before leaving the company",
        ));
    }

    state.db.remove_member(&company_id, &me)?;
    Ok(StatusCode::NO_CONTENT)
}
