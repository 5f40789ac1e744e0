//! Identity-provider callbacks
//!
//! The OAuth redirect flow itself runs in the provider integration; these
//! endpoints are the two hooks it calls back into. Sign-in registers the
//! user on first contact, session resolves the stored id and role.

use crate::{
    error::{AppError, Result},
    routes::{ok, required, ApiJson, ApiResponse},
    server::AppState,
    storage::{NewUser, Role},
};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub provider: String,
    pub profile: Profile,
}

#[derive(Debug, Deserialize)]
pub struct Profile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub allowed: bool,
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub role: Role,
}

pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<SignInRequest>,
) -> Json<ApiResponse<SignInResponse>> {
    if !state.config.provider_enabled(&payload.provider) {
        warn!("Sign-in refused: provider {} is not enabled", payload.provider);
        return ok(SignInResponse { allowed: false });
    }

    let allowed = match register_on_first_sign_in(&state, &payload.profile).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Sign-in refused: {}", e);
            false
        }
    };

    ok(SignInResponse { allowed })
}

async fn register_on_first_sign_in(state: &AppState, profile: &Profile) -> Result<()> {
    let email = required(&profile.email, "email")?;

    let db = state.database.lock().await;
    if db.find_user_by_email(&email)?.is_some() {
        return Ok(());
    }

    let user = db.create_user(&NewUser {
        name: required(&profile.name, "name")?,
        email,
        image: profile.picture.clone(),
    })?;

    info!("Registered new user {} ({})", user.id, user.email);
    Ok(())
}

pub async fn session(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<SessionRequest>,
) -> Result<Json<ApiResponse<SessionResponse>>> {
    let email = required(&payload.email, "email")?;

    let db = state.database.lock().await;
    let user = db
        .find_user_by_email(&email)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(ok(SessionResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        image: user.image,
        role: user.role,
    }))
}
