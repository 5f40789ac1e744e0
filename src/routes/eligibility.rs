use crate::{
    error::Result,
    routes::{ensure_user, ok, required_value, required_verbatim, ApiPath, ApiQuery, ApiResponse},
    server::AppState,
    verification::{Eligibility, EligibilityChecker, UploadedImage},
};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityQuery {
    pub image_name: Option<String>,
    pub image_size: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityResponse {
    #[serde(flatten)]
    pub eligibility: Eligibility,
    pub message: String,
}

pub async fn check(
    State(state): State<Arc<AppState>>,
    ApiPath(user_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<EligibilityQuery>,
) -> Result<Json<ApiResponse<EligibilityResponse>>> {
    let upload = UploadedImage::new(
        required_verbatim(&query.image_name, "imageName")?,
        required_value(query.image_size, "imageSize")?,
    );

    let db = state.database.lock().await;
    ensure_user(&db, user_id)?;
    let eligibility = EligibilityChecker::new(&*db).check(user_id, &upload)?;

    Ok(ok(EligibilityResponse {
        message: eligibility.verdict.message().to_string(),
        eligibility,
    }))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{add_user, app, send};
    use crate::storage::{NewFingerprint, NewOffence};
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_eligibility_endpoint() {
        let (router, state) = app();
        let user = add_user(&state, "jane@example.com").await;
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

        let uri = format!("/api/eligibility/{}?imageName=A&imageSize=100", user.id);
        let (status, body) = send(&router, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["imageMatch"], true);
        assert_eq!(body["data"]["hasOffences"], false);
        assert_eq!(body["data"]["isEligible"], true);
        assert_eq!(body["data"]["verdict"], "eligible");

        let uri = format!("/api/eligibility/{}?imageName=A&imageSize=99", user.id);
        let (_, body) = send(&router, Method::GET, &uri, None).await;
        assert_eq!(body["data"]["imageMatch"], false);
        assert_eq!(body["data"]["verdict"], "imageMismatch");

        state
            .database
            .lock()
            .await
            .create_offence(&NewOffence {
                user_id: user.id,
                offence_details: "Trespassing on private land".to_string(),
                offence_date: None,
            })
            .unwrap();

        let uri = format!("/api/eligibility/{}?imageName=A&imageSize=100", user.id);
        let (_, body) = send(&router, Method::GET, &uri, None).await;
        assert_eq!(body["data"]["hasOffences"], true);
        assert_eq!(body["data"]["isEligible"], false);
    }

    #[tokio::test]
    async fn test_eligibility_without_fingerprint() {
        let (router, state) = app();
        let user = add_user(&state, "jane@example.com").await;

        let uri = format!("/api/eligibility/{}?imageName=A&imageSize=100", user.id);
        let (status, body) = send(&router, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["isEligible"], false);
        assert_eq!(body["data"]["verdict"], "noFingerprint");
    }

    #[tokio::test]
    async fn test_eligibility_for_unknown_user() {
        let (router, _) = app();

        let uri = "/api/eligibility/999?imageName=A&imageSize=100";
        let (status, body) = send(&router, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "User not found");
    }

    #[tokio::test]
    async fn test_eligibility_keeps_image_name_whitespace() {
        let (router, state) = app();
        let user = add_user(&state, "jane@example.com").await;
        state
            .database
            .lock()
            .await
            .create_fingerprint(&NewFingerprint {
                user_id: user.id,
                full_name: "Jane Doe".to_string(),
                id_number: "8001015009087".to_string(),
                image_url: "https://files.example/scan.png".to_string(),
                image_size: Some(100),
                image_name: Some(" scan.png".to_string()),
            })
            .unwrap();

        let uri = format!("/api/eligibility/{}?imageName=%20scan.png&imageSize=100", user.id);
        let (status, body) = send(&router, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["imageMatch"], true);
    }

    #[tokio::test]
    async fn test_eligibility_requires_image_metadata() {
        let (router, _) = app();

        let (status, body) =
            send(&router, Method::GET, "/api/eligibility/1?imageName=A", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "imageSize is required");
    }
}
