//! Lifecycle of friend requests and the friendship edges they produce.
//!
//! ```text
//! pending ──accept──▶ accepted ──remove friendship──▶ (deleted)
//!    │
//!    ├──decline──▶ declined
//!    └──cancel───▶ (deleted)
//! ```
//!
//! Every write runs inside one `BEGIN IMMEDIATE` transaction, so an operation
//! either commits all of its effects or none of them, and concurrent writers
//! queue on the write lock instead of failing with `SQLITE_BUSY` on upgrade.
//! The "one active request per pair" rule is backed by a partial unique index
//! on top of the in-transaction check.

use sqlx::{Sqlite, SqlitePool, Transaction};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::{
    models::{FriendRequest, PublicProfile, RequestStatus, RequestWithProfile},
    store::{RequestStore, UserDirectory},
};

#[derive(Error, Debug)]
pub enum FriendError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    InvalidState(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    InvalidOperation(&'static str),

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

pub type FriendResult<T> = Result<T, FriendError>;

const REQUEST_EXISTS: &str = "A friend request already exists between you and this user";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(e) if e.is_unique_violation())
}

#[derive(Clone)]
pub struct FriendManager {
    db_pool: SqlitePool,
}

impl FriendManager {
    pub fn new(db_pool: SqlitePool) -> Self {
        FriendManager { db_pool }
    }

    /// Takes the write lock up front. A deferred transaction that reads first
    /// cannot upgrade while another writer holds the lock.
    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.db_pool.begin_with("BEGIN IMMEDIATE").await
    }

    pub async fn send(&self, sender_id: Uuid, recipient_id: Uuid) -> FriendResult<FriendRequest> {
        if sender_id == recipient_id {
            return Err(FriendError::InvalidOperation("You can't send friend request to yourself"));
        }

        let mut tx = self.begin_write().await?;

        if tx.find_user(recipient_id).await?.is_none() {
            return Err(FriendError::NotFound("Recipient not found"));
        }
        if tx.is_friend(sender_id, recipient_id).await? {
            return Err(FriendError::Conflict("You are already friends with this user"));
        }
        if tx.find_active_between(sender_id, recipient_id).await?.is_some() {
            return Err(FriendError::Conflict(REQUEST_EXISTS));
        }

        let request = tx.create_request(sender_id, recipient_id)
            .await
            .map_err(|err| if is_unique_violation(&err) {
                FriendError::Conflict(REQUEST_EXISTS)
            } else {
                err.into()
            })?;
        tx.commit().await?;

        info!(request = %request.id, sender = %sender_id, recipient = %recipient_id, "friend request sent");
        Ok(request)
    }

    /// Accepting twice is harmless: the friendship edge is only added once.
    pub async fn accept(&self, request_id: Uuid, acting_user_id: Uuid) -> FriendResult<FriendRequest> {
        let mut tx = self.begin_write().await?;

        let request = tx.find_request(request_id)
            .await?
            .ok_or(FriendError::NotFound("Friend request not found"))?;
        if request.recipient_id != acting_user_id {
            return Err(FriendError::Forbidden("You are not authorized to accept this request"));
        }
        if request.status == RequestStatus::Declined {
            return Err(FriendError::InvalidState("Friend request was already declined"));
        }

        let request = tx.update_status(request_id, RequestStatus::Accepted)
            .await?
            .ok_or(FriendError::NotFound("Friend request not found"))?;
        tx.add_friend(request.sender_id, request.recipient_id).await?;
        tx.commit().await?;

        info!(request = %request.id, sender = %request.sender_id, recipient = %request.recipient_id, "friend request accepted");
        Ok(request)
    }

    pub async fn decline(&self, request_id: Uuid, acting_user_id: Uuid) -> FriendResult<FriendRequest> {
        let mut tx = self.begin_write().await?;

        let request = tx.find_request(request_id)
            .await?
            .ok_or(FriendError::NotFound("Friend request not found"))?;
        if request.recipient_id != acting_user_id {
            return Err(FriendError::Forbidden("You can only decline requests sent to you"));
        }
        if request.status != RequestStatus::Pending {
            return Err(FriendError::InvalidState("Friend request is not pending"));
        }

        let request = tx.update_status(request_id, RequestStatus::Declined)
            .await?
            .ok_or(FriendError::NotFound("Friend request not found"))?;
        tx.commit().await?;

        info!(request = %request.id, "friend request declined");
        Ok(request)
    }

    /// Withdraws a pending request. The record is deleted, not archived.
    pub async fn cancel(&self, request_id: Uuid, acting_user_id: Uuid) -> FriendResult<()> {
        let mut tx = self.begin_write().await?;

        let request = tx.find_request(request_id)
            .await?
            .ok_or(FriendError::NotFound("Friend request not found"))?;
        if request.sender_id != acting_user_id {
            return Err(FriendError::Forbidden("You can only cancel requests you sent"));
        }
        if request.status != RequestStatus::Pending {
            return Err(FriendError::InvalidState("Friend request is not pending"));
        }

        tx.delete_request(request_id).await?;
        tx.commit().await?;

        info!(request = %request_id, "friend request cancelled");
        Ok(())
    }

    /// Drops the friendship and every request ever exchanged by the pair, so
    /// either side can send a fresh request later.
    pub async fn remove_friendship(&self, user_a: Uuid, user_b: Uuid) -> FriendResult<()> {
        if user_a == user_b {
            return Err(FriendError::InvalidOperation("Invalid friend ID"));
        }

        let mut tx = self.begin_write().await?;

        if tx.find_user(user_a).await?.is_none() || tx.find_user(user_b).await?.is_none() {
            return Err(FriendError::NotFound("Friend not found"));
        }
        if !tx.remove_friend(user_a, user_b).await? {
            return Err(FriendError::Conflict("You are not friends with this user"));
        }
        let purged = tx.delete_all_between(user_a, user_b).await?;
        tx.commit().await?;

        info!(user_a = %user_a, user_b = %user_b, purged, "friendship removed");
        Ok(())
    }

    pub async fn list_incoming(&self, user_id: Uuid) -> FriendResult<Vec<RequestWithProfile>> {
        let mut conn = self.db_pool.acquire().await?;
        Ok(conn.find_by_recipient(user_id, RequestStatus::Pending).await?)
    }

    pub async fn list_outgoing(&self, user_id: Uuid) -> FriendResult<Vec<RequestWithProfile>> {
        let mut conn = self.db_pool.acquire().await?;
        Ok(conn.find_by_sender(user_id, RequestStatus::Pending).await?)
    }

    pub async fn list_accepted_sent(&self, user_id: Uuid) -> FriendResult<Vec<RequestWithProfile>> {
        let mut conn = self.db_pool.acquire().await?;
        Ok(conn.find_by_sender(user_id, RequestStatus::Accepted).await?)
    }

    pub async fn list_friends(&self, user_id: Uuid) -> FriendResult<Vec<PublicProfile>> {
        let mut conn = self.db_pool.acquire().await?;
        Ok(conn.friends_of(user_id).await?)
    }

    pub async fn recommend(&self, user_id: Uuid) -> FriendResult<Vec<PublicProfile>> {
        let mut conn = self.db_pool.acquire().await?;
        Ok(conn.recommend_for(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, models::{ProfileUpdate, User}};

    async fn setup() -> (SqlitePool, FriendManager) {
        let db_pool = db::connect("sqlite::memory:", 1).await.unwrap();
        (db_pool.clone(), FriendManager::new(db_pool))
    }

    async fn user(db_pool: &SqlitePool, name: &str, onboarded: bool) -> User {
        let mut conn = db_pool.acquire().await.unwrap();
        let user = conn.create_user(name, &format!("{}@example.com", name.to_lowercase()))
            .await
            .unwrap();
        if !onboarded {
            return user;
        }
        conn.complete_onboarding(user.id, &ProfileUpdate {
            full_name: name.to_owned(),
            bio: String::new(),
            profile_pic: String::new(),
            native_language: "english".to_owned(),
            learning_language: "spanish".to_owned(),
        }).await.unwrap().unwrap()
    }

    async fn friend_ids(manager: &FriendManager, id: Uuid) -> Vec<Uuid> {
        manager.list_friends(id).await.unwrap().into_iter().map(|p| p.id).collect()
    }

    #[tokio::test]
    async fn send_rejects_self_and_unknown_recipient() {
        let (db_pool, manager) = setup().await;
        let a = user(&db_pool, "Alice", true).await;

        assert!(matches!(manager.send(a.id, a.id).await, Err(FriendError::InvalidOperation(_))));
        assert!(matches!(manager.send(a.id, Uuid::now_v7()).await, Err(FriendError::NotFound(_))));
    }

    #[tokio::test]
    async fn pending_request_blocks_both_directions() {
        let (db_pool, manager) = setup().await;
        let a = user(&db_pool, "Alice", true).await;
        let b = user(&db_pool, "Bob", true).await;

        let request = manager.send(a.id, b.id).await.unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!((request.sender_id, request.recipient_id), (a.id, b.id));

        assert!(matches!(manager.send(b.id, a.id).await, Err(FriendError::Conflict(_))));
        assert!(matches!(manager.send(a.id, b.id).await, Err(FriendError::Conflict(_))));
    }

    /// Removes the database file and its WAL companions on drop.
    struct TempDb(std::path::PathBuf);

    impl Drop for TempDb {
        fn drop(&mut self) {
            for suffix in ["", "-wal", "-shm"] {
                let _ = std::fs::remove_file(format!("{}{suffix}", self.0.display()));
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cross_sends_race_to_one_request_and_one_conflict() {
        let temp_db = TempDb(std::env::temp_dir().join(format!("tandem-{}.db", Uuid::now_v7())));
        let db_pool = db::connect(&format!("sqlite://{}", temp_db.0.display()), 8).await.unwrap();
        let manager = FriendManager::new(db_pool.clone());

        for round in 0..20 {
            let a = user(&db_pool, &format!("Alice{round}"), true).await;
            let b = user(&db_pool, &format!("Bob{round}"), true).await;

            let ab = tokio::spawn({
                let manager = manager.clone();
                async move { manager.send(a.id, b.id).await }
            });
            let ba = tokio::spawn({
                let manager = manager.clone();
                async move { manager.send(b.id, a.id).await }
            });
            let (ab, ba) = tokio::join!(ab, ba);
            let results = [ab.unwrap(), ba.unwrap()];

            assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1, "{results:?}");
            assert!(
                results.iter().any(|r| matches!(r, Err(FriendError::Conflict(_)))),
                "{results:?}"
            );

            let pending = manager.list_outgoing(a.id).await.unwrap().len()
                + manager.list_outgoing(b.id).await.unwrap().len();
            assert_eq!(pending, 1);
        }

        db_pool.close().await;
    }

    #[tokio::test]
    async fn unique_index_rejects_second_active_request() {
        let (db_pool, _) = setup().await;
        let a = user(&db_pool, "Alice", true).await;
        let b = user(&db_pool, "Bob", true).await;

        let mut conn = db_pool.acquire().await.unwrap();
        conn.create_request(a.id, b.id).await.unwrap();
        let err = conn.create_request(b.id, a.id).await.unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn accept_links_both_users_once() {
        let (db_pool, manager) = setup().await;
        let a = user(&db_pool, "Alice", true).await;
        let b = user(&db_pool, "Bob", true).await;

        let request = manager.send(a.id, b.id).await.unwrap();
        assert!(matches!(manager.accept(request.id, a.id).await, Err(FriendError::Forbidden(_))));

        let accepted = manager.accept(request.id, b.id).await.unwrap();
        assert_eq!(accepted.status, RequestStatus::Accepted);
        manager.accept(request.id, b.id).await.unwrap();

        assert_eq!(friend_ids(&manager, a.id).await, vec![b.id]);
        assert_eq!(friend_ids(&manager, b.id).await, vec![a.id]);
        assert!(matches!(manager.send(b.id, a.id).await, Err(FriendError::Conflict(_))));

        let accepted_sent = manager.list_accepted_sent(a.id).await.unwrap();
        assert_eq!(accepted_sent.len(), 1);
        assert_eq!(accepted_sent[0].user.id, b.id);
    }

    #[tokio::test]
    async fn decline_is_terminal_but_does_not_block_resend() {
        let (db_pool, manager) = setup().await;
        let a = user(&db_pool, "Alice", true).await;
        let b = user(&db_pool, "Bob", true).await;

        let request = manager.send(a.id, b.id).await.unwrap();
        assert!(matches!(manager.decline(request.id, a.id).await, Err(FriendError::Forbidden(_))));

        let declined = manager.decline(request.id, b.id).await.unwrap();
        assert_eq!(declined.status, RequestStatus::Declined);
        assert!(friend_ids(&manager, a.id).await.is_empty());
        assert!(friend_ids(&manager, b.id).await.is_empty());

        assert!(matches!(manager.decline(request.id, b.id).await, Err(FriendError::InvalidState(_))));
        assert!(matches!(manager.accept(request.id, b.id).await, Err(FriendError::InvalidState(_))));

        manager.send(a.id, b.id).await.unwrap();
    }

    #[tokio::test]
    async fn cancel_deletes_pending_request() {
        let (db_pool, manager) = setup().await;
        let a = user(&db_pool, "Alice", true).await;
        let b = user(&db_pool, "Bob", true).await;

        let request = manager.send(a.id, b.id).await.unwrap();
        assert!(matches!(manager.cancel(request.id, b.id).await, Err(FriendError::Forbidden(_))));

        manager.cancel(request.id, a.id).await.unwrap();
        let mut conn = db_pool.acquire().await.unwrap();
        assert!(conn.find_request(request.id).await.unwrap().is_none());
        drop(conn);

        assert!(matches!(manager.cancel(request.id, a.id).await, Err(FriendError::NotFound(_))));
        assert!(friend_ids(&manager, a.id).await.is_empty());
        manager.send(a.id, b.id).await.unwrap();
    }

    #[tokio::test]
    async fn cancel_refuses_accepted_request() {
        let (db_pool, manager) = setup().await;
        let a = user(&db_pool, "Alice", true).await;
        let b = user(&db_pool, "Bob", true).await;

        let request = manager.send(a.id, b.id).await.unwrap();
        manager.accept(request.id, b.id).await.unwrap();
        assert!(matches!(manager.cancel(request.id, a.id).await, Err(FriendError::InvalidState(_))));
    }

    #[tokio::test]
    async fn remove_friendship_purges_history() {
        let (db_pool, manager) = setup().await;
        let a = user(&db_pool, "Alice", true).await;
        let b = user(&db_pool, "Bob", true).await;

        let declined = manager.send(b.id, a.id).await.unwrap();
        manager.decline(declined.id, a.id).await.unwrap();
        let request = manager.send(a.id, b.id).await.unwrap();
        manager.accept(request.id, b.id).await.unwrap();

        manager.remove_friendship(b.id, a.id).await.unwrap();

        assert!(friend_ids(&manager, a.id).await.is_empty());
        assert!(friend_ids(&manager, b.id).await.is_empty());
        let mut conn = db_pool.acquire().await.unwrap();
        assert!(conn.find_request(request.id).await.unwrap().is_none());
        assert!(conn.find_request(declined.id).await.unwrap().is_none());
        drop(conn);

        manager.send(a.id, b.id).await.unwrap();
    }

    #[tokio::test]
    async fn remove_friendship_errors() {
        let (db_pool, manager) = setup().await;
        let a = user(&db_pool, "Alice", true).await;
        let b = user(&db_pool, "Bob", true).await;

        assert!(matches!(manager.remove_friendship(a.id, a.id).await, Err(FriendError::InvalidOperation(_))));
        assert!(matches!(manager.remove_friendship(a.id, Uuid::now_v7()).await, Err(FriendError::NotFound(_))));
        assert!(matches!(manager.remove_friendship(a.id, b.id).await, Err(FriendError::Conflict(_))));
    }

    #[tokio::test]
    async fn listings_join_counterpart_profile() {
        let (db_pool, manager) = setup().await;
        let a = user(&db_pool, "Alice", true).await;
        let b = user(&db_pool, "Bob", true).await;
        let c = user(&db_pool, "Carol", true).await;

        manager.send(a.id, b.id).await.unwrap();
        manager.send(c.id, b.id).await.unwrap();

        let incoming = manager.list_incoming(b.id).await.unwrap();
        let mut senders: Vec<_> = incoming.iter().map(|r| r.user.full_name.as_str()).collect();
        senders.sort();
        assert_eq!(senders, ["Alice", "Carol"]);
        assert!(incoming.iter().all(|r| r.request.recipient_id == b.id));

        let outgoing = manager.list_outgoing(a.id).await.unwrap();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].user, PublicProfile::from(&b));
        assert!(manager.list_incoming(a.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn recommend_excludes_self_friends_and_newcomers() {
        let (db_pool, manager) = setup().await;
        let a = user(&db_pool, "Alice", true).await;
        let b = user(&db_pool, "Bob", true).await;
        let c = user(&db_pool, "Carol", true).await;
        let d = user(&db_pool, "Dave", false).await;

        let request = manager.send(a.id, b.id).await.unwrap();
        manager.accept(request.id, b.id).await.unwrap();

        let recommended: Vec<Uuid> = manager.recommend(a.id).await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(recommended, vec![c.id]);
        assert!(!recommended.contains(&d.id));
    }
}
