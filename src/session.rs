use axum::{extract::{FromRef, FromRequestParts}, http::request::Parts};
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{models::User, store::UserDirectory, AppError};

pub const USER_ID: &str = "user_id";

/// The user bound to the request's session. Rejects with 401 when there is none.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Unauthorized("No session"))?;

        let Some(user_id) = session.get::<Uuid>(USER_ID).await? else {
            return Err(AppError::Unauthorized("No user in session"));
        };

        let db_pool = SqlitePool::from_ref(state);
        let mut conn = db_pool.acquire().await?;
        let Some(user) = conn.find_user(user_id).await? else {
            session.flush().await?;
            return Err(AppError::Unauthorized("User not found"));
        };

        Ok(CurrentUser(user))
    }
}
