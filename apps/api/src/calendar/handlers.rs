use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::applications::handlers::find_company_application;
use crate::auth::{require_company, Session};
use crate::calendar::{calendar_links, CalendarEvent, CalendarLinks};
use crate::errors::AppError;
use crate::extract::ValidJson;
use crate::jobs::handlers::find_company_job;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CalendarLinkRequest {
    pub start: DateTime<Utc>,
    pub duration_minutes: Option<i64>,
    pub location: Option<String>,
    pub title: Option<String>,
    pub details: Option<String>,
}

pub fn interview_duration(minutes: Option<i64>) -> Result<Duration, AppError> {
    let minutes = minutes.unwrap_or(60);
    if !(1..=480).contains(&minutes) {
        return Err(AppError::Validation(format!(
            "duration_minutes must be between 1 and 480, got {minutes}"
        )));
    }
    Ok(Duration::minutes(minutes))
}

/// POST /api/v1/applications/:id/calendar-links
pub async fn handle_calendar_links(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<CalendarLinkRequest>,
) -> Result<Json<CalendarLinks>, AppError> {
    let company = require_company(&state.db, &session.user).await?;
    let application = find_company_application(&state.db, company.id, id).await?;
    let job = find_company_job(&state.db, company.id, application.job_id).await?;
    let duration = interview_duration(req.duration_minutes)?;

    let title = req
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Interview: {} – {}", application.candidate_name, job.title));

    let event = CalendarEvent {
        title,
        start: req.start,
        duration,
        details: req.details,
        location: req.location,
    };
    Ok(Json(calendar_links(&event)))
}
