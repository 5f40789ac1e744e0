use crate::{
    error::Result,
    routes::{ok, ApiResponse},
    server::AppState,
    storage::User,
};
use axum::{extract::State, Json};
use std::sync::Arc;

pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<User>>>> {
    let db = state.database.lock().await;
    Ok(ok(db.list_users()?))
}
