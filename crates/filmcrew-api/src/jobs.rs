use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use filmcrew_types::api::{
    ApplicationDecisionRequest, ApplyRequest, Claims, CreateJobRequest, JobApplicationWithProfile,
    JobListQuery,
};
use filmcrew_types::models::{ApplicationStatus, JobApplication, JobPost, JobStatus};

use crate::auth::AppState;
use crate::companies::require_manager;
use crate::convert;
use crate::error::{ApiError, ApiResult};

/// POST /productions/{id}/jobs
pub async fn create_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateJobRequest>,
) -> ApiResult<impl IntoResponse> {
    let production_id = id.to_string();
    let production = state
        .db
        .get_production(&production_id)?
        .ok_or(ApiError::NotFound)?;
    require_manager(&state, &production.company_id, &claims.sub.to_string())?;

    let title = req.title.trim();
    let department = req.department.trim();
    if title.is_empty() || department.is_empty() {
        return Err(ApiError::invalid("job title and department are required"));
    }

    let job_id = Uuid::new_v4().to_string();
    state.db.create_job(
        &job_id,
        &production_id,
        title,
        department,
        req.description.as_deref(),
        req.rate.as_deref(),
    )?;

    let row = state
        .db
        .get_job(&job_id)?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("job vanished after insert")))?;

    Ok((StatusCode::CREATED, Json(convert::job(row))))
}

/// GET /jobs?department=&status= — the public board. Defaults to open
/// postings when no status filter is given.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> ApiResult<Json<Vec<JobPost>>> {
    let status = query.status.unwrap_or(JobStatus::Open);
    let rows = state
        .db
        .list_jobs(query.department.as_deref(), Some(status.as_str()))?;

    Ok(Json(rows.into_iter().map(convert::job).collect()))
}

/// GET /jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<JobPost>> {
    let row = state.db.get_job(&id.to_string())?.ok_or(ApiError::NotFound)?;
    Ok(Json(convert::job(row)))
}

/// POST /jobs/{id}/close
pub async fn close_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<JobPost>> {
    let job_id = id.to_string();
    let row = state.db.get_job(&job_id)?.ok_or(ApiError::NotFound)?;
    require_manager(&state, &row.company_id, &claims.sub.to_string())?;

    if row.status != "open" {
        return Err(ApiError::conflict(
            "invalid_transition",
            "job is already closed",
        ));
    }

    state.db.set_job_status(&job_id, JobStatus::Closed.as_str())?;

    let row = state.db.get_job(&job_id)?.ok_or(ApiError::NotFound)?;
    Ok(Json(convert::job(row)))
}

/// POST /jobs/{id}/applications
pub async fn apply(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<ApplyRequest>,
) -> ApiResult<impl IntoResponse> {
    let job_id = id.to_string();
    let me = claims.sub.to_string();

    let job = state.db.get_job(&job_id)?.ok_or(ApiError::NotFound)?;
    if job.status != "open" {
        return Err(ApiError::conflict(
            "job_closed",
            "this job is no longer accepting applications",
        ));
    }
    if state.db.application_exists(&job_id, &me)? {
        return Err(ApiError::conflict(
            "duplicate_application",
            "you have already applied to this job",
        ));
    }

    let application_id = Uuid::new_v4().to_string();
    state
        .db
        .create_application(&application_id, &job_id, &me, req.note.as_deref())?;

    let row = state
        .db
        .get_application(&application_id)?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("application vanished after insert")))?;

    Ok((StatusCode::CREATED, Json(convert::application(row))))
}

/// GET /jobs/{id}/applications — hiring side only.
pub async fn list_job_applications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<JobApplicationWithProfile>>> {
    let job_id = id.to_string();
    let job = state.db.get_job(&job_id)?.ok_or(ApiError::NotFound)?;
    require_manager(&state, &job.company_id, &claims.sub.to_string())?;

    let rows = state.db.list_applications_for_job(&job_id)?;
    Ok(Json(
        rows.into_iter()
            .map(|(application, profile)| JobApplicationWithProfile {
                application: convert::application(application),
                applicant: convert::profile(profile),
            })
            .collect(),
    ))
}

/// GET /applications — the caller's own applications.
pub async fn my_applications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<JobApplication>>> {
    let rows = state.db.list_applications_for_user(&claims.sub.to_string())?;
    Ok(Json(rows.into_iter().map(convert::application).collect()))
}

/// POST /applications/{id}/decision — accept or decline, hiring side only.
pub async fn decide_application(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<ApplicationDecisionRequest>,
) -> ApiResult<Json<JobApplication>> {
    if req.status == ApplicationStatus::Submitted {
        return Err(ApiError::invalid("decision must be accepted or declined"));
    }

    let application_id = id.to_string();
    let row = state
        .db
        .get_application(&application_id)?
        .ok_or(ApiError::NotFound)?;
    let job = state.db.get_job(&row.job_id)?.ok_or(ApiError::NotFound)?;
    require_manager(&state, &job.company_id, &claims.sub.to_string())?;

    if row.status != "submitted" {
        return Err(ApiError::conflict(
            "invalid_transition",
            format!("application is already {}", row.status),
        ));
    }

    state
        .db
        .set_application_status(&application_id, req.status.as_str())?;

    let row = state
        .db
        .get_application(&application_id)?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(convert::application(row)))
}
