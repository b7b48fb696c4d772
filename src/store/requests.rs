use sqlx::{FromRow, SqliteConnection};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{db::ordered_pair, models::{FriendRequest, PublicProfile, RequestStatus, RequestWithProfile}};

use super::RequestStore;

const REQUEST_COLUMNS: &str = "id,sender_id,recipient_id,status,created_at,updated_at";

#[derive(FromRow)]
struct JoinedRow {
    request_id: Uuid,
    sender_id: Uuid,
    recipient_id: Uuid,
    status: RequestStatus,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,

    #[sqlx(flatten)]
    user: PublicProfile,
}

impl From<JoinedRow> for RequestWithProfile {
    fn from(row: JoinedRow) -> Self {
        RequestWithProfile {
            request: FriendRequest {
                id: row.request_id,
                sender_id: row.sender_id,
                recipient_id: row.recipient_id,
                status: row.status,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            user: row.user,
        }
    }
}

/// `counterpart` is the request column holding the user whose profile is joined in.
fn joined_query(counterpart: &str, owner: &str) -> String {
    format!(
        "SELECT r.id AS request_id,r.sender_id AS sender_id,r.recipient_id AS recipient_id,\
         r.status AS status,r.created_at AS created_at,r.updated_at AS updated_at,\
         u.id AS id,u.full_name AS full_name,u.profile_pic AS profile_pic,\
         u.native_language AS native_language,u.learning_language AS learning_language \
         FROM friend_requests r JOIN users u ON u.id = r.{counterpart} \
         WHERE r.{owner}=? AND r.status=? \
         ORDER BY r.created_at DESC"
    )
}

impl RequestStore for SqliteConnection {
    async fn create_request(&mut self, sender_id: Uuid, recipient_id: Uuid) -> Result<FriendRequest, sqlx::Error> {
        let (low, high) = ordered_pair(sender_id, recipient_id);
        let now = OffsetDateTime::now_utc();
        sqlx::query_as(&format!(
            "INSERT INTO friend_requests (id,sender_id,recipient_id,pair_low,pair_high,status,created_at,updated_at) \
             VALUES (?,?,?,?,?,?,?,?) RETURNING {REQUEST_COLUMNS}"
        ))
            .bind(Uuid::now_v7())
            .bind(sender_id)
            .bind(recipient_id)
            .bind(low)
            .bind(high)
            .bind(RequestStatus::Pending)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *self)
            .await
    }

    async fn find_request(&mut self, id: Uuid) -> Result<Option<FriendRequest>, sqlx::Error> {
        sqlx::query_as(&format!("SELECT {REQUEST_COLUMNS} FROM friend_requests WHERE id=?"))
            .bind(id)
            .fetch_optional(&mut *self)
            .await
    }

    async fn find_active_between(&mut self, a: Uuid, b: Uuid) -> Result<Option<FriendRequest>, sqlx::Error> {
        let (low, high) = ordered_pair(a, b);
        sqlx::query_as(&format!(
            "SELECT {REQUEST_COLUMNS} FROM friend_requests \
             WHERE pair_low=? AND pair_high=? AND status IN ('pending','accepted')"
        ))
            .bind(low)
            .bind(high)
            .fetch_optional(&mut *self)
            .await
    }

    async fn update_status(&mut self, id: Uuid, status: RequestStatus) -> Result<Option<FriendRequest>, sqlx::Error> {
        sqlx::query_as(&format!(
            "UPDATE friend_requests SET status=?,updated_at=? WHERE id=? RETURNING {REQUEST_COLUMNS}"
        ))
            .bind(status)
            .bind(OffsetDateTime::now_utc())
            .bind(id)
            .fetch_optional(&mut *self)
            .await
    }

    async fn delete_request(&mut self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM friend_requests WHERE id=?")
            .bind(id)
            .execute(&mut *self)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_between(&mut self, a: Uuid, b: Uuid) -> Result<u64, sqlx::Error> {
        let (low, high) = ordered_pair(a, b);
        let result = sqlx::query("DELETE FROM friend_requests WHERE pair_low=? AND pair_high=?")
            .bind(low)
            .bind(high)
            .execute(&mut *self)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_all_requests(&mut self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM friend_requests")
            .execute(&mut *self)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count_requests(&mut self) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM friend_requests")
            .fetch_one(&mut *self)
            .await?;
        Ok(count)
    }

    async fn find_by_recipient(&mut self, id: Uuid, status: RequestStatus) -> Result<Vec<RequestWithProfile>, sqlx::Error> {
        let rows: Vec<JoinedRow> = sqlx::query_as(&joined_query("sender_id", "recipient_id"))
            .bind(id)
            .bind(status)
            .fetch_all(&mut *self)
            .await?;
        Ok(rows.into_iter().map(RequestWithProfile::from).collect())
    }

    async fn find_by_sender(&mut self, id: Uuid, status: RequestStatus) -> Result<Vec<RequestWithProfile>, sqlx::Error> {
        let rows: Vec<JoinedRow> = sqlx::query_as(&joined_query("recipient_id", "sender_id"))
            .bind(id)
            .bind(status)
            .fetch_all(&mut *self)
            .await?;
        Ok(rows.into_iter().map(RequestWithProfile::from).collect())
    }
}
