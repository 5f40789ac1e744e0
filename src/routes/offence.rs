//! Offence recording routes

use crate::{
    error::{AppError, Result},
    routes::{created, ensure_user, ok, required_min, required_value, ApiJson, ApiPath, ApiResponse},
    server::AppState,
    storage::{NewOffence, Offence},
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOffenceRequest {
    pub user_id: Option<i64>,
    pub offence_details: Option<String>,
    pub offence_date: Option<String>,
}

impl CreateOffenceRequest {
    fn validate(&self) -> Result<NewOffence> {
        let offence_date = match self.offence_date.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(parse_offence_date(raw)?),
            _ => None,
        };

        Ok(NewOffence {
            user_id: required_value(self.user_id, "userId")?,
            offence_details: required_min(&self.offence_details, "offenceDetails", 10)?,
            offence_date,
        })
    }
}

/// Accepts RFC 3339 or the `YYYY-MM-DDTHH:MM[:SS]` form produced by
/// datetime-local inputs, which is taken as UTC.
fn parse_offence_date(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(AppError::Validation(format!("Invalid offenceDate: {}", raw)))
}

pub async fn create_offence(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateOffenceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Offence>>)> {
    let new_offence = payload.validate()?;

    let db = state.database.lock().await;
    ensure_user(&db, new_offence.user_id)?;
    let offence = db.create_offence(&new_offence)?;

    info!("Recorded offence {} against user {}", offence.id, offence.user_id);

    Ok(created(offence))
}

pub async fn get_offences(
    State(state): State<Arc<AppState>>,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Vec<Offence>>>> {
    let db = state.database.lock().await;
    let offences = db.get_offences_by_user(user_id)?;

    Ok(ok(offences))
}
