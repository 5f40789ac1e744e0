//! API routes

pub mod auth;
pub mod clearance;
pub mod eligibility;
pub mod fingerprint;
pub mod offence;
pub mod users;

use crate::error::{AppError, Result};
use crate::storage::Database;
use axum::{
    extract::{FromRequest, FromRequestParts},
    http::StatusCode,
    Json,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Success envelope shared by every record endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { success: true, data })
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, ok(data))
}

/// JSON body whose rejections use the error envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// A present, non-blank string field, trimmed
pub(crate) fn required(value: &Option<String>, field: &str) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AppError::Validation(format!("{} is required", field))),
    }
}

/// A present, non-blank string field, kept exactly as sent
pub(crate) fn required_verbatim(value: &Option<String>, field: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.clone()),
        _ => Err(AppError::Validation(format!("{} is required", field))),
    }
}

pub(crate) fn required_min(
    value: &Option<String>,
    field: &str,
    min_chars: usize,
) -> Result<String> {
    let value = required(value, field)?;
    if value.chars().count() < min_chars {
        return Err(AppError::Validation(format!(
            "{} must be at least {} characters",
            field, min_chars
        )));
    }
    Ok(value)
}

pub(crate) fn required_value<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| AppError::Validation(format!("{} is required", field)))
}

/// Fail with 404 unless the referenced user exists
pub(crate) fn ensure_user(db: &Database, user_id: i64) -> Result<()> {
    match db.get_user(user_id)? {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound("User not found".to_string())),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{
        config::Config,
        server::{build_router, AppState},
        storage::{Database, NewUser, User},
    };
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    pub fn app() -> (Router, Arc<AppState>) {
        let state = AppState::new(Config::default(), Database::in_memory().unwrap());
        let router = build_router(state.clone()).unwrap();
        (router, state)
    }

    pub async fn add_user(state: &AppState, email: &str) -> User {
        state
            .database
            .lock()
            .await
            .create_user(&NewUser {
                name: "Jane Doe".to_string(),
                email: email.to_string(),
                image: None,
            })
            .unwrap()
    }

    pub async fn send(
        router: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, value)
    }
}
