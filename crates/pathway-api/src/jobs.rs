use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, info};

use pathway_types::api::JobDraft;
use pathway_types::models::JobType;

use crate::auth::{AppState, RequireAdmin, blocking};
use crate::body::JsonBody;
use crate::error::ApiError;

pub async fn list_jobs(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let jobs = blocking(&state, |db| db.list_jobs()).await?;
    Ok(Json(jobs))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let job = blocking(&state, move |db| db.get_job(&job_id))
        .await?
        .ok_or(ApiError::NotFound("Job not found."))?;
    Ok(Json(job))
}

/// POST /api/jobs: admin only.
pub async fn create_job(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    body: JsonBody,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(title), Some(area), Some(summary)) =
        (body.text("title"), body.text("area"), body.text("summary"))
    else {
        return Err(ApiError::Validation("Title, area, and summary are required."));
    };

    let draft = JobDraft {
        title,
        area,
        job_type: job_type_or_default(body.text("type").as_deref()),
        employer_name: body.text("employerName"),
        summary,
        responsibilities: body.list("responsibilities"),
        requirements: body.list("requirements"),
        support_available: body.list("supportAvailable"),
        how_to_apply: body.list("howToApply"),
    };

    let job = blocking(&state, move |db| db.insert_job(&draft)).await?;
    info!("Job {} created ({})", job.id, job.job_type.label());
    Ok((StatusCode::CREATED, Json(job)))
}

/// Unknown job types fall back to full time rather than failing the request.
// TODO: decide with the admin UI whether an unknown type should be a 400.
fn job_type_or_default(raw: Option<&str>) -> JobType {
    match raw {
        Some(label) => JobType::from_label(label).unwrap_or_else(|| {
            debug!("Unknown job type '{}', using default", label);
            JobType::default()
        }),
        None => JobType::default(),
    }
}
