use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    pub full_name: String,
    pub email: String,
    pub bio: String,
    pub profile_pic: String,
    pub native_language: String,
    pub learning_language: String,
    pub is_onboarded: bool,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,

    // unique: id
    // unique: email
}

/// What other users get to see of someone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: Uuid,
    pub full_name: String,
    pub profile_pic: String,
    pub native_language: String,
    pub learning_language: String,
}

impl From<&User> for PublicProfile {
    fn from(user: &User) -> Self {
        PublicProfile {
            id: user.id,
            full_name: user.full_name.clone(),
            profile_pic: user.profile_pic.clone(),
            native_language: user.native_language.clone(),
            learning_language: user.learning_language.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Declined,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub status: RequestStatus,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,

    // unique: id
    // unique: pair, while active
}

/// A request together with the profile of the user on the other end of it.
#[derive(Debug, Clone, Serialize)]
pub struct RequestWithProfile {
    #[serde(flatten)]
    pub request: FriendRequest,
    pub user: PublicProfile,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 64, message = "Full name is required"))]
    pub full_name: String,
    #[validate(length(max = 280))]
    #[serde(default)]
    pub bio: String,
    #[validate(length(max = 512))]
    #[serde(default)]
    pub profile_pic: String,
    #[validate(length(min = 1, max = 32, message = "Native language is required"))]
    pub native_language: String,
    #[validate(length(min = 1, max = 32, message = "Learning language is required"))]
    pub learning_language: String,
}
