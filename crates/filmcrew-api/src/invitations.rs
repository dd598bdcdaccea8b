use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use filmcrew_types::api::{Claims, InviteRequest};
use filmcrew_types::models::{CompanyInvitation, CompanyRole};

use crate::auth::AppState;
use crate::companies::require_manager;
use crate::convert;
use crate::error::{ApiError, ApiResult};

/// POST /companies/{id}/invitations
pub async fn invite(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<InviteRequest>,
) -> ApiResult<impl IntoResponse> {
    let company_id = id.to_string();
    let me = claims.sub.to_string();

    let company = state.db.get_company(&company_id)?.ok_or(ApiError::NotFound)?;
    require_manager(&state, &company_id, &me)?;

    if req.role == CompanyRole::Owner {
        return Err(ApiError::invalid(
            "ownership is transferred, not granted by invitation",
        ));
    }

    let invitee = req.invitee_id.to_string();
    state.db.get_profile(&invitee)?.ok_or(ApiError::NotFound)?;

    if state.db.member_role(&company_id, &invitee)?.is_some() {
        return Err(ApiError::conflict(
            "already_member",
            "that member already belongs to the company",
        ));
    }
    if state.db.pending_invitation_exists(&company_id, &invitee)? {
        return Err(ApiError::conflict(
            "duplicate_invitation",
            "an invitation for that member is already pending",
        ));
    }

    let invitation_id = Uuid::new_v4().to_string();
    state
        .db
        .create_invitation(&invitation_id, &company_id, &invitee, &me, req.role.as_str())?;

    let row = state
        .db
        .get_invitation(&invitation_id)?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("invitation vanished after insert")))?;

    Ok((StatusCode::CREATED, Json(convert::invitation(row, company))))
}

/// GET /invitations — pending invitations addressed to the caller.
pub async fn list_my_invitations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<CompanyInvitation>>> {
    let rows = state.db.list_invitations_for_user(&claims.sub.to_string())?;

    Ok(Json(
        rows.into_iter()
            .map(|(row, company)| convert::invitation(row, company))
            .collect(),
    ))
}

/// POST /invitations/{id}/accept — invitee only; membership lands in the
/// same transaction as the status flip.
pub async fn accept_invitation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CompanyInvitation>> {
    let me = claims.sub.to_string();
    let row = load_pending(&state, &id.to_string(), &me)?;

    if state.db.member_role(&row.company_id, &me)?.is_some() {
        return Err(ApiError::conflict(
            "already_member",
            "you already belong to this company",
        ));
    }

    state
        .db
        .accept_invitation(&row.id, &row.company_id, &me, &row.role)?;

    reload(&state, &row.id)
}

/// POST /invitations/{id}/decline
pub async fn decline_invitation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CompanyInvitation>> {
    let me = claims.sub.to_string();
    let row = load_pending(&state, &id.to_string(), &me)?;

    state.db.decline_invitation(&row.id)?;

    reload(&state, &row.id)
}

fn load_pending(
    state: &AppState,
    invitation_id: &str,
    user_id: &str,
) -> ApiResult<filmcrew_db::models::InvitationRow> {
    let row = state
        .db
        .get_invitation(invitation_id)?
        .ok_or(ApiError::NotFound)?;

    // Invitations are visible only to their invitee.
    if row.invitee_id != user_id {
        return Err(ApiError::NotFound);
    }
    if row.status != "pending" {
        return Err(ApiError::conflict(
            "invalid_transition",
            format!("invitation is already {}", row.status),
        ));
    }

    Ok(row)
}

fn reload(state: &AppState, invitation_id: &str) -> ApiResult<Json<CompanyInvitation>> {
    let row = state
        .db
        .get_invitation(invitation_id)?
        .ok_or(ApiError::NotFound)?;
    let company = state
        .db
        .get_company(&row.company_id)?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(convert::invitation(row, company)))
}
