use sqlx::SqliteConnection;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{db::ordered_pair, models::{ProfileUpdate, PublicProfile, User}};

use super::UserDirectory;

const USER_COLUMNS: &str = "id,full_name,email,bio,profile_pic,native_language,learning_language,is_onboarded,created_at,updated_at";

impl UserDirectory for SqliteConnection {
    async fn create_user(&mut self, full_name: &str, email: &str) -> Result<User, sqlx::Error> {
        let now = OffsetDateTime::now_utc();
        sqlx::query_as(&format!(
            "INSERT INTO users (id,full_name,email,created_at,updated_at) VALUES (?,?,?,?,?) RETURNING {USER_COLUMNS}"
        ))
            .bind(Uuid::now_v7())
            .bind(full_name)
            .bind(email)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *self)
            .await
    }

    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id=?"))
            .bind(id)
            .fetch_optional(&mut *self)
            .await
    }

    async fn complete_onboarding(&mut self, id: Uuid, profile: &ProfileUpdate) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(&format!(
            "UPDATE users SET full_name=?,bio=?,profile_pic=?,native_language=?,learning_language=?,is_onboarded=1,updated_at=? \
             WHERE id=? RETURNING {USER_COLUMNS}"
        ))
            .bind(&profile.full_name)
            .bind(&profile.bio)
            .bind(&profile.profile_pic)
            .bind(&profile.native_language)
            .bind(&profile.learning_language)
            .bind(OffsetDateTime::now_utc())
            .bind(id)
            .fetch_optional(&mut *self)
            .await
    }

    async fn add_friend(&mut self, id: Uuid, other_id: Uuid) -> Result<(), sqlx::Error> {
        let (low, high) = ordered_pair(id, other_id);
        sqlx::query("INSERT OR IGNORE INTO friendships (user_low,user_high,created_at) VALUES (?,?,?)")
            .bind(low)
            .bind(high)
            .bind(OffsetDateTime::now_utc())
            .execute(&mut *self)
            .await?;
        Ok(())
    }

    async fn remove_friend(&mut self, id: Uuid, other_id: Uuid) -> Result<bool, sqlx::Error> {
        let (low, high) = ordered_pair(id, other_id);
        let result = sqlx::query("DELETE FROM friendships WHERE user_low=? AND user_high=?")
            .bind(low)
            .bind(high)
            .execute(&mut *self)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn is_friend(&mut self, id: Uuid, other_id: Uuid) -> Result<bool, sqlx::Error> {
        let (low, high) = ordered_pair(id, other_id);
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM friendships WHERE user_low=? AND user_high=?")
            .bind(low)
            .bind(high)
            .fetch_optional(&mut *self)
            .await?;
        Ok(row.is_some())
    }

    async fn friends_of(&mut self, id: Uuid) -> Result<Vec<PublicProfile>, sqlx::Error> {
        sqlx::query_as(
            "SELECT u.id AS id,u.full_name AS full_name,u.profile_pic AS profile_pic,\
             u.native_language AS native_language,u.learning_language AS learning_language \
             FROM friendships f JOIN users u \
             ON u.id = CASE WHEN f.user_low=? THEN f.user_high ELSE f.user_low END \
             WHERE f.user_low=? OR f.user_high=? \
             ORDER BY u.full_name"
        )
            .bind(id)
            .bind(id)
            .bind(id)
            .fetch_all(&mut *self)
            .await
    }

    async fn recommend_for(&mut self, id: Uuid) -> Result<Vec<PublicProfile>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id,full_name,profile_pic,native_language,learning_language FROM users \
             WHERE id<>? AND is_onboarded=1 \
             AND id NOT IN (SELECT user_high FROM friendships WHERE user_low=?) \
             AND id NOT IN (SELECT user_low FROM friendships WHERE user_high=?) \
             ORDER BY created_at DESC"
        )
            .bind(id)
            .bind(id)
            .bind(id)
            .fetch_all(&mut *self)
            .await
    }
}
