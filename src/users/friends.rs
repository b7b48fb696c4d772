use axum::{debug_handler, extract::State, Json};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{extract::Path, friendship::FriendManager, models::PublicProfile, session::CurrentUser, AppResult, AppState};

#[debug_handler(state = AppState)]
pub(crate) async fn recommended(
    State(friends): State<FriendManager>,
    CurrentUser(me): CurrentUser,
) -> AppResult<Json<Vec<PublicProfile>>> {
    Ok(Json(friends.recommend(me.id).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn my_friends(
    State(friends): State<FriendManager>,
    CurrentUser(me): CurrentUser,
) -> AppResult<Json<Vec<PublicProfile>>> {
    Ok(Json(friends.list_friends(me.id).await?))
}

#[debug_handler(state = AppState)]
pub(crate) async fn remove_friend(
    State(friends): State<FriendManager>,
    CurrentUser(me): CurrentUser,
    Path(friend_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    friends.remove_friendship(me.id, friend_id).await?;
    Ok(Json(json!({ "message": "Friend removed successfully" })))
}
