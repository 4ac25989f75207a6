use axum::{Json, extract::State, response::IntoResponse};

use pathway_types::api::SponsorPlanDraft;

use crate::auth::{AppState, blocking};
use crate::body::JsonBody;
use crate::error::ApiError;

const DEFAULT_CHECK_IN_FREQUENCY: &str = "daily";

/// GET /api/sponsor-plan: `null` until the first save.
pub async fn get_plan(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let plan = blocking(&state, |db| db.get_sponsor_plan()).await?;
    Ok(Json(plan))
}

/// PUT /api/sponsor-plan: replaces the whole plan.
pub async fn save_plan(
    State(state): State<AppState>,
    body: JsonBody,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(reach_out), Some(boundary)) = (body.text("reachOut"), body.text("boundary")) else {
        return Err(ApiError::Validation("Plan fields are required."));
    };

    let draft = SponsorPlanDraft {
        reach_out,
        check_in_frequency: body
            .text("checkInFrequency")
            .unwrap_or_else(|| DEFAULT_CHECK_IN_FREQUENCY.to_string()),
        backup_contact: body.text("backupContact").unwrap_or_default(),
        boundary,
    };

    let plan = blocking(&state, move |db| db.upsert_sponsor_plan(&draft)).await?;
    Ok(Json(plan))
}
