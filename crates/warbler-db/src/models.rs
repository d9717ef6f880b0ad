//! Database row types — these map directly to SQLite rows.
//! Ids and timestamps stay as stored TEXT here; the `TryFrom` impls turn rows
//! into `warbler_types` models and fail with `DbError::Corrupt` on bad data.

use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

use warbler_types::api::MessageResponse;
use warbler_types::models::{Follow, Like, Message, User};

use crate::DbError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub username: String,
    pub image_url: String,
    pub header_image_url: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub password: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRow {
    pub id: String,
    pub text: String,
    pub timestamp: String,
    pub user_id: String,
}

/// A message with its author's display fields, from a users JOIN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthoredMessageRow {
    pub id: String,
    pub text: String,
    pub timestamp: String,
    pub user_id: String,
    pub author_username: String,
    pub author_image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowRow {
    pub user_being_followed_id: String,
    pub user_following_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeRow {
    pub id: String,
    pub user_id: String,
    pub message_id: String,
    pub created_at: String,
}

/// A user to insert. Unset required fields are written as NULL and rejected
/// by the schema, so the failure surfaces as `DbError::Integrity`.
/// `password` is stored as given; callers outside tests go through signup.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub image_url: Option<String>,
}

impl NewUser {
    pub fn new(username: &str, email: &str, password: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            image_url: None,
        }
    }
}

/// A message to insert. Missing text or owner fails the insert.
#[derive(Debug, Clone, Default)]
pub struct NewMessage {
    pub text: Option<String>,
    pub user_id: Option<String>,
}

impl NewMessage {
    pub fn new(user_id: &str, text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            user_id: Some(user_id.to_string()),
        }
    }
}

/// Replacement profile fields. `None` images reset to the defaults.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: String,
    pub email: String,
    pub image_url: Option<String>,
    pub header_image_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
}

pub(crate) fn parse_id(field: &'static str, value: &str) -> Result<Uuid, DbError> {
    value.parse().map_err(|_| DbError::Corrupt {
        field,
        value: value.to_string(),
    })
}

/// SQLite's `datetime('now')` has no timezone; it is UTC.
pub(crate) fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, DbError> {
    value
        .parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .map_err(|_| DbError::Corrupt {
            field,
            value: value.to_string(),
        })
}

impl TryFrom<UserRow> for User {
    type Error = DbError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: parse_id("users.id", &row.id)?,
            created_at: parse_timestamp("users.created_at", &row.created_at)?,
            email: row.email,
            username: row.username,
            image_url: row.image_url,
            header_image_url: row.header_image_url,
            bio: row.bio,
            location: row.location,
        })
    }
}

impl TryFrom<MessageRow> for Message {
    type Error = DbError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(Message {
            id: parse_id("messages.id", &row.id)?,
            timestamp: parse_timestamp("messages.timestamp", &row.timestamp)?,
            user_id: parse_id("messages.user_id", &row.user_id)?,
            text: row.text,
        })
    }
}

impl TryFrom<AuthoredMessageRow> for MessageResponse {
    type Error = DbError;

    fn try_from(row: AuthoredMessageRow) -> Result<Self, Self::Error> {
        Ok(MessageResponse {
            id: parse_id("messages.id", &row.id)?,
            timestamp: parse_timestamp("messages.timestamp", &row.timestamp)?,
            user_id: parse_id("messages.user_id", &row.user_id)?,
            text: row.text,
            author_username: row.author_username,
            author_image_url: row.author_image_url,
        })
    }
}

impl TryFrom<FollowRow> for Follow {
    type Error = DbError;

    fn try_from(row: FollowRow) -> Result<Self, Self::Error> {
        Ok(Follow {
            user_being_followed_id: parse_id(
                "follows.user_being_followed_id",
                &row.user_being_followed_id,
            )?,
            user_following_id: parse_id("follows.user_following_id", &row.user_following_id)?,
        })
    }
}

impl TryFrom<LikeRow> for Like {
    type Error = DbError;

    fn try_from(row: LikeRow) -> Result<Self, Self::Error> {
        Ok(Like {
            id: parse_id("likes.id", &row.id)?,
            user_id: parse_id("likes.user_id", &row.user_id)?,
            message_id: parse_id("likes.message_id", &row.message_id)?,
        })
    }
}
