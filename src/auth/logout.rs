use axum::{debug_handler, Json};
use serde_json::{json, Value};
use tower_sessions::Session;

use crate::AppResult;

#[debug_handler]
pub(crate) async fn logout(session: Session) -> AppResult<Json<Value>> {
    session.flush().await?;
    Ok(Json(json!({ "message": "Logout successful" })))
}
