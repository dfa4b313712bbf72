use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{AuthUser, User};
use crate::AppState;

/// GET /api/users/me
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let row = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    Ok(Json(row))
}
