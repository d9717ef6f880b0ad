use tracing::{info, warn};
use uuid::Uuid;

use warbler_db::models::NewMessage;
use warbler_types::api::{MessageResponse, NewMessageRequest};
use warbler_types::models::{MAX_MESSAGE_LEN, Message};

use crate::session::require_user;
use crate::{ApiError, AppState, Session};

/// How many messages the home page shows.
pub const HOME_TIMELINE_LIMIT: u32 = 100;

pub fn add_message(
    state: &AppState,
    session: &Session,
    req: NewMessageRequest,
) -> Result<Message, ApiError> {
    let user = require_user(state, session)?;

    let text = req.text.as_str();
    if text.trim().is_empty() {
        return Err(ApiError::Validation("Message text is required".into()));
    }
    if text.chars().count() > MAX_MESSAGE_LEN {
        return Err(ApiError::Validation(format!(
            "Messages are limited to {MAX_MESSAGE_LEN} characters"
        )));
    }

    let row = state
        .db
        .insert_message(&NewMessage::new(&user.id.to_string(), text))?;
    Ok(Message::try_from(row)?)
}

pub fn show_message(state: &AppState, message_id: Uuid) -> Result<MessageResponse, ApiError> {
    let row = state
        .db
        .get_authored_message(&message_id.to_string())?
        .ok_or(ApiError::NotFound("message"))?;
    Ok(MessageResponse::try_from(row)?)
}

/// Only the message's owner may delete it.
pub fn delete_message(
    state: &AppState,
    session: &Session,
    message_id: Uuid,
) -> Result<(), ApiError> {
    let user = require_user(state, session)?;

    let mid = message_id.to_string();
    let message = state
        .db
        .get_message(&mid)?
        .ok_or(ApiError::NotFound("message"))?;

    if message.user_id != user.id.to_string() {
        warn!("{} tried to delete message {} owned by {}", user.username, mid, message.user_id);
        return Err(ApiError::Unauthorized);
    }

    state.db.delete_message(&mid)?;
    info!("{} deleted message {}", user.username, mid);
    Ok(())
}

/// Newest messages from the current user and everyone they follow.
pub fn home_timeline(
    state: &AppState,
    session: &Session,
) -> Result<Vec<MessageResponse>, ApiError> {
    let user = require_user(state, session)?;

    let rows = state
        .db
        .timeline(&user.id.to_string(), HOME_TIMELINE_LIMIT)?;
    let messages = rows
        .into_iter()
        .map(MessageResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(messages)
}
