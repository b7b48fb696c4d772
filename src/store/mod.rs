//! Storage collaborators of the friendship manager.
//!
//! Both traits are implemented for [`SqliteConnection`], so the manager can run
//! them on a pooled connection for reads and on an open transaction for writes.
//!
//! [`SqliteConnection`]: sqlx::SqliteConnection

mod requests;
mod users;

use uuid::Uuid;

use crate::models::{FriendRequest, ProfileUpdate, PublicProfile, RequestStatus, RequestWithProfile, User};

#[allow(async_fn_in_trait)]
pub trait UserDirectory {
    async fn create_user(&mut self, full_name: &str, email: &str) -> Result<User, sqlx::Error>;
    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>, sqlx::Error>;
    async fn complete_onboarding(&mut self, id: Uuid, profile: &ProfileUpdate) -> Result<Option<User>, sqlx::Error>;

    /// Adds the symmetric friendship edge. Adding an existing edge is a no-op.
    async fn add_friend(&mut self, id: Uuid, other_id: Uuid) -> Result<(), sqlx::Error>;
    /// Returns whether an edge was actually removed.
    async fn remove_friend(&mut self, id: Uuid, other_id: Uuid) -> Result<bool, sqlx::Error>;
    async fn is_friend(&mut self, id: Uuid, other_id: Uuid) -> Result<bool, sqlx::Error>;
    async fn friends_of(&mut self, id: Uuid) -> Result<Vec<PublicProfile>, sqlx::Error>;

    /// Onboarded users that are neither `id` nor one of its friends.
    async fn recommend_for(&mut self, id: Uuid) -> Result<Vec<PublicProfile>, sqlx::Error>;
}

#[allow(async_fn_in_trait)]
pub trait RequestStore {
    async fn create_request(&mut self, sender_id: Uuid, recipient_id: Uuid) -> Result<FriendRequest, sqlx::Error>;
    async fn find_request(&mut self, id: Uuid) -> Result<Option<FriendRequest>, sqlx::Error>;
    /// The pending or accepted request between the pair, in either direction.
    async fn find_active_between(&mut self, a: Uuid, b: Uuid) -> Result<Option<FriendRequest>, sqlx::Error>;
    async fn update_status(&mut self, id: Uuid, status: RequestStatus) -> Result<Option<FriendRequest>, sqlx::Error>;
    async fn delete_request(&mut self, id: Uuid) -> Result<bool, sqlx::Error>;
    async fn delete_all_between(&mut self, a: Uuid, b: Uuid) -> Result<u64, sqlx::Error>;
    async fn delete_all_requests(&mut self) -> Result<u64, sqlx::Error>;
    async fn count_requests(&mut self) -> Result<i64, sqlx::Error>;

    /// Requests received by `id`, joined with the sender's profile.
    async fn find_by_recipient(&mut self, id: Uuid, status: RequestStatus) -> Result<Vec<RequestWithProfile>, sqlx::Error>;
    /// Requests sent by `id`, joined with the recipient's profile.
    async fn find_by_sender(&mut self, id: Uuid, status: RequestStatus) -> Result<Vec<RequestWithProfile>, sqlx::Error>;
}
