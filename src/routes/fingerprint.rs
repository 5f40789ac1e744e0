//! Fingerprint registration routes

use crate::{
    error::{AppError, Result},
    routes::{
        created, ensure_user, ok, required, required_min, required_value, ApiJson, ApiPath,
        ApiResponse,
    },
    server::AppState,
    storage::{Fingerprint, NewFingerprint},
};
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFingerprintRequest {
    pub user_id: Option<i64>,
    pub full_name: Option<String>,
    pub id_number: Option<String>,
    pub image_url: Option<String>,
    pub image_size: Option<u64>,
    pub image_name: Option<String>,
}

impl CreateFingerprintRequest {
    fn validate(&self) -> Result<NewFingerprint> {
        Ok(NewFingerprint {
            user_id: required_value(self.user_id, "userId")?,
            full_name: required_min(&self.full_name, "fullName", 2)?,
            id_number: required(&self.id_number, "idNumber")?,
            image_url: required(&self.image_url, "imageUrl")?,
            image_size: self.image_size.map(checked_image_size).transpose()?,
            image_name: self.image_name.clone().filter(|name| !name.is_empty()),
        })
    }
}

/// SQLite integers are signed 64-bit
fn checked_image_size(size: u64) -> Result<u64> {
    if i64::try_from(size).is_err() {
        return Err(AppError::Validation(format!("imageSize out of range: {}", size)));
    }
    Ok(size)
}

pub async fn create_fingerprint(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateFingerprintRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Fingerprint>>)> {
    let new_fingerprint = payload.validate()?;

    let db = state.database.lock().await;
    ensure_user(&db, new_fingerprint.user_id)?;
    let fingerprint = db.create_fingerprint(&new_fingerprint)?;

    info!("Registered fingerprint {} for user {}", fingerprint.id, fingerprint.user_id);

    Ok(created(fingerprint))
}

pub async fn get_fingerprint(
    State(state): State<Arc<AppState>>,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Fingerprint>>> {
    let db = state.database.lock().await;
    let fingerprint = db
        .get_fingerprint_by_user(user_id)?
        .ok_or_else(|| AppError::NotFound("Fingerprint not found".to_string()))?;

    Ok(ok(fingerprint))
}
