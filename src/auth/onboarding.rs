use axum::{debug_handler, extract::State, Json};
use sqlx::SqlitePool;
use tracing::info;
use validator::Validate;

use crate::{models::{ProfileUpdate, User}, session::CurrentUser, store::UserDirectory, AppError, AppResult, AppState};

#[debug_handler(state = AppState)]
pub(crate) async fn onboarding(
    State(db_pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,

    Json(profile): Json<ProfileUpdate>,
) -> AppResult<Json<User>> {
    profile.validate()?;

    let mut conn = db_pool.acquire().await?;
    let user = conn.complete_onboarding(user.id, &profile)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;

    info!(user = %user.id, "onboarded");
    Ok(Json(user))
}
