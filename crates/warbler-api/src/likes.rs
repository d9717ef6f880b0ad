use tracing::warn;
use uuid::Uuid;

use warbler_types::api::{LikeToggled, MessageResponse};

use crate::session::require_user;
use crate::{ApiError, AppState, Session};

/// Like or unlike someone else's message.
pub fn toggle_like(
    state: &AppState,
    session: &Session,
    message_id: Uuid,
) -> Result<LikeToggled, ApiError> {
    let user = require_user(state, session)?;

    let mid = message_id.to_string();
    let message = state
        .db
        .get_message(&mid)?
        .ok_or(ApiError::NotFound("message"))?;

    if message.user_id == user.id.to_string() {
        warn!("{} tried to like their own message {}", user.username, mid);
        return Err(ApiError::Forbidden);
    }

    let liked = state.db.toggle_like(&user.id.to_string(), &mid)?;
    Ok(LikeToggled { message_id, liked })
}

/// Messages `user_id` has liked. Requires a logged-in viewer.
pub fn show_likes(
    state: &AppState,
    session: &Session,
    user_id: Uuid,
) -> Result<Vec<MessageResponse>, ApiError> {
    require_user(state, session)?;

    let uid = user_id.to_string();
    if state.db.get_user_by_id(&uid)?.is_none() {
        return Err(ApiError::NotFound("user"));
    }

    let messages = state
        .db
        .liked_messages(&uid)?
        .into_iter()
        .map(MessageResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(messages)
}
