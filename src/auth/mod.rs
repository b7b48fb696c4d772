mod logout;
mod onboarding;
mod signup;

use axum::{debug_handler, routing::{get, post}, Json, Router};

use crate::{models::User, session::CurrentUser, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup::signup))
        .route("/onboarding", post(onboarding::onboarding))
        .route("/me", get(me))
        .route("/logout", post(logout::logout))
}

#[debug_handler(state = AppState)]
pub(crate) async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
