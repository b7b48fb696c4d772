use axum::{debug_handler, extract::State, http::StatusCode, Json};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use tracing::info;
use validator::Validate;

use crate::{models::User, session::USER_ID, store::UserDirectory, AppError, AppResult, AppState};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignupBody {
    #[validate(length(min = 1, max = 64, message = "Full name is required"))]
    full_name: String,
    #[validate(email(message = "Invalid email format"))]
    email: String,
}

/// Creates a not-yet-onboarded account and binds it to the session.
#[debug_handler(state = AppState)]
pub(crate) async fn signup(
    State(db_pool): State<SqlitePool>,
    session: Session,

    Json(body): Json<SignupBody>,
) -> AppResult<(StatusCode, Json<User>)> {
    body.validate()?;

    let email = body.email.trim().to_lowercase();
    let mut conn = db_pool.acquire().await?;
    let user = match conn.create_user(body.full_name.trim(), &email).await {
        Ok(user) => user,
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(AppError::Conflict("Email already exists, please use a different one".to_owned()));
        }
        Err(e) => return Err(e.into()),
    };

    session.cycle_id().await?;
    session.insert(USER_ID, user.id).await?;

    info!(user = %user.id, "signed up {}", user.full_name);
    Ok((StatusCode::CREATED, Json(user)))
}
