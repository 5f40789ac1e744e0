//! Clearance application routes

use crate::{
    error::{AppError, Result},
    routes::{ensure_user, required, required_min, required_value, required_verbatim, ApiJson},
    server::AppState,
    storage::{Clearance, NewClearance},
    verification::{EligibilityChecker, UploadedImage},
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClearanceRequest {
    pub user_id: Option<i64>,
    pub full_name: Option<String>,
    pub id_number: Option<String>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub image_name: Option<String>,
    pub image_size: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ClearanceCreated {
    pub message: String,
    pub clearance: Clearance,
}

impl CreateClearanceRequest {
    fn validate(&self) -> Result<(NewClearance, UploadedImage)> {
        let clearance = NewClearance {
            user_id: required_value(self.user_id, "userId")?,
            full_name: required_min(&self.full_name, "fullName", 2)?,
            id_number: required_min(&self.id_number, "idNumber", 5)?,
            image_url: required(&self.image_url, "imageUrl")?,
            description: required_min(&self.description, "description", 10)?,
        };

        let upload = UploadedImage::new(
            required_verbatim(&self.image_name, "imageName")?,
            required_value(self.image_size, "imageSize")?,
        );

        Ok((clearance, upload))
    }
}

pub async fn create_clearance(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateClearanceRequest>,
) -> Result<(StatusCode, Json<ClearanceCreated>)> {
    let (new_clearance, upload) = payload.validate()?;

    let db = state.database.lock().await;
    ensure_user(&db, new_clearance.user_id)?;

    let eligibility = EligibilityChecker::new(&*db).check(new_clearance.user_id, &upload)?;
    if !eligibility.is_eligible {
        warn!(
            "Clearance refused for user {}: {:?}",
            new_clearance.user_id, eligibility.verdict
        );
        return Err(AppError::NotEligible(eligibility.verdict.message().to_string()));
    }

    let clearance = db.create_clearance(&new_clearance)?;
    info!("Created clearance {} for user {}", clearance.id, clearance.user_id);

    Ok((
        StatusCode::CREATED,
        Json(ClearanceCreated {
            message: "Clearance created successfully".to_string(),
            clearance,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{add_user, app, send};
    use crate::server::AppState;
    use crate::storage::{NewFingerprint, NewOffence, User};
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    async fn register_fingerprint(state: &AppState, user: &User) {
        state
            .database
            .lock()
            .await
            .create_fingerprint(&NewFingerprint {
                user_id: user.id,
                full_name: "Jane Doe".to_string(),
                id_number: "8001015009087".to_string(),
                image_url: "https://files.example/A".to_string(),
                image_size: Some(100),
                image_name: Some("A".to_string()),
            })
            .unwrap();
    }

    fn application(user_id: i64, image_name: &str, image_size: u64) -> Value {
        json!({
            "userId": user_id,
            "fullName": "Jane Doe",
            "idNumber": "8001015009087",
            "imageUrl": "https://files.example/verify.png",
            "description": "Required for a work visa application",
            "imageName": image_name,
            "imageSize": image_size
        })
    }

    #[tokio::test]
    async fn test_eligible_user_gets_clearance() {
        let (router, state) = app();
        let user = add_user(&state, "jane@example.com").await;
        register_fingerprint(&state, &user).await;

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/clearance",
            Some(application(user.id, "A", 100)),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Clearance created successfully");
        assert_eq!(body["clearance"]["fullName"], "Jane Doe");
        assert_eq!(body["clearance"]["userId"], user.id);

        let stored = state.database.lock().await.get_clearances_by_user(user.id).unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn test_legacy_path_is_routed() {
        let (router, state) = app();
        let user = add_user(&state, "jane@example.com").await;
        register_fingerprint(&state, &user).await;

        let (status, _) = send(
            &router,
            Method::POST,
            "/api/clearence",
            Some(application(user.id, "A", 100)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_image_name_compared_as_sent() {
        let (router, state) = app();
        let user = add_user(&state, "jane@example.com").await;

        let (status, _) = send(
            &router,
            Method::POST,
            "/api/fingerprint",
            Some(json!({
                "userId": user.id,
                "fullName": "Jane Doe",
                "idNumber": "8001015009087",
                "imageUrl": "https://files.example/scan.png",
                "imageSize": 100,
                "imageName": "scan.png "
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = send(
            &router,
            Method::POST,
            "/api/clearance",
            Some(application(user.id, "scan.png ", 100)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = send(
            &router,
            Method::POST,
            "/api/clearance",
            Some(application(user.id, "scan.png", 100)),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_image_mismatch_refused() {
        let (router, state) = app();
        let user = add_user(&state, "jane@example.com").await;
        register_fingerprint(&state, &user).await;

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/clearance",
            Some(application(user.id, "A", 101)),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["success"], false);
        assert!(state.database.lock().await.get_clearances_by_user(user.id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_user_with_offences_refused() {
        let (router, state) = app();
        let user = add_user(&state, "jane@example.com").await;
        register_fingerprint(&state, &user).await;
        state
            .database
            .lock()
            .await
            .create_offence(&NewOffence {
                user_id: user.id,
                offence_details: "Assault during a bar fight".to_string(),
                offence_date: None,
            })
            .unwrap();

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/clearance",
            Some(application(user.id, "A", 100)),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(
            body["error"],
            "Clearance denied. You have pending offences that must be resolved first."
        );
    }

    #[tokio::test]
    async fn test_no_fingerprint_refused() {
        let (router, state) = app();
        let user = add_user(&state, "jane@example.com").await;

        let (status, _) = send(
            &router,
            Method::POST,
            "/api/clearance",
            Some(application(user.id, "A", 100)),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_missing_field_is_client_error() {
        let (router, state) = app();
        let user = add_user(&state, "jane@example.com").await;
        register_fingerprint(&state, &user).await;

        let mut payload = application(user.id, "A", 100);
        payload.as_object_mut().unwrap().remove("description");

        let (status, body) = send(&router, Method::POST, "/api/clearance", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "description is required");
    }

    #[tokio::test]
    async fn test_short_id_number_is_client_error() {
        let (router, state) = app();
        let user = add_user(&state, "jane@example.com").await;

        let mut payload = application(user.id, "A", 100);
        payload["idNumber"] = json!("123");

        let (status, body) = send(&router, Method::POST, "/api/clearance", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "idNumber must be at least 5 characters");
    }
}
