use axum::{debug_handler, extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    extract::Path,
    friendship::FriendManager,
    models::{FriendRequest, RequestWithProfile},
    session::CurrentUser,
    AppResult, AppState,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FriendRequests {
    incoming_reqs: Vec<RequestWithProfile>,
    accepted_reqs: Vec<RequestWithProfile>,
}

/// `recipient_id` is the user the request goes to.
#[debug_handler(state = AppState)]
pub(crate) async fn send_request(
    State(friends): State<FriendManager>,
    CurrentUser(me): CurrentUser,
    Path(recipient_id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<FriendRequest>)> {
    let request = friends.send(me.id, recipient_id).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn accept_request(
    State(friends): State<FriendManager>,
    CurrentUser(me): CurrentUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let request = friends.accept(request_id, me.id).await?;
    Ok(Json(json!({ "message": "Friend request accepted", "friendRequest": request })))
}

#[debug_handler(state = AppState)]
pub(crate) async fn decline_request(
    State(friends): State<FriendManager>,
    CurrentUser(me): CurrentUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let request = friends.decline(request_id, me.id).await?;
    Ok(Json(json!({ "message": "Friend request declined", "friendRequest": request })))
}

#[debug_handler(state = AppState)]
pub(crate) async fn cancel_request(
    State(friends): State<FriendManager>,
    CurrentUser(me): CurrentUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    friends.cancel(request_id, me.id).await?;
    Ok(Json(json!({ "message": "Friend request cancelled successfully" })))
}

#[debug_handler(state = AppState)]
pub(crate) async fn friend_requests(
    State(friends): State<FriendManager>,
    CurrentUser(me): CurrentUser,
) -> AppResult<Json<FriendRequests>> {
    Ok(Json(FriendRequests {
        incoming_reqs: friends.list_incoming(me.id).await?,
        accepted_reqs: friends.list_accepted_sent(me.id).await?,
    }))
}

#[debug_handler(state = AppState)]
pub(crate) async fn outgoing_requests(
    State(friends): State<FriendManager>,
    CurrentUser(me): CurrentUser,
) -> AppResult<Json<Vec<RequestWithProfile>>> {
    Ok(Json(friends.list_outgoing(me.id).await?))
}
