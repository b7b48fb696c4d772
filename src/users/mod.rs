mod friends;
mod requests;

use axum::{routing::{delete, get, post, put}, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(friends::recommended))
        .route("/friends", get(friends::my_friends))
        .route("/friends/{id}", delete(friends::remove_friend))

        .route("/friend-request/{id}", post(requests::send_request))
        .route("/friend-request/{id}/accept", put(requests::accept_request))
        .route("/friend-request/{id}/decline", put(requests::decline_request))
        .route("/friend-request/{id}/cancel", delete(requests::cancel_request))
        .route("/friend-requests", get(requests::friend_requests))
        .route("/outgoing-friend-requests", get(requests::outgoing_requests))
}
