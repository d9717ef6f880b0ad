use tracing::info;
use uuid::Uuid;

use warbler_db::DbError;
use warbler_db::models::{UserRow, UserUpdate};
use warbler_types::api::{MessageResponse, ProfileUpdateRequest, UserProfile};
use warbler_types::models::{Follow, Like, User};

use crate::auth::{confirm_password, validate_email, validate_username};
use crate::session::require_user;
use crate::{ApiError, AppState, Session};

/// How many of a user's messages their profile page shows.
pub const PROFILE_MESSAGE_LIMIT: u32 = 100;

fn to_users(rows: Vec<UserRow>) -> Result<Vec<User>, DbError> {
    rows.into_iter().map(User::try_from).collect()
}

fn find_user(state: &AppState, user_id: Uuid) -> Result<User, ApiError> {
    let row = state
        .db
        .get_user_by_id(&user_id.to_string())?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(User::try_from(row)?)
}

/// All users, or those whose username contains `search`.
pub fn list_users(state: &AppState, search: Option<&str>) -> Result<Vec<User>, ApiError> {
    let search = search.map(str::trim).filter(|s| !s.is_empty());
    Ok(to_users(state.db.list_users(search)?)?)
}

pub fn show_user(state: &AppState, user_id: Uuid) -> Result<UserProfile, ApiError> {
    let user = find_user(state, user_id)?;
    let uid = user_id.to_string();

    let messages = state
        .db
        .authored_messages_for_user(&uid, PROFILE_MESSAGE_LIMIT)?
        .into_iter()
        .map(MessageResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    let likes = state
        .db
        .likes_for_user(&uid)?
        .into_iter()
        .map(Like::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(UserProfile {
        message_count: state.db.count_messages_for_user(&uid)?,
        followers_count: state.db.count_followers(&uid)?,
        following_count: state.db.count_following(&uid)?,
        user,
        messages,
        likes,
    })
}

/// Who `user_id` follows. Requires a logged-in viewer.
pub fn show_following(
    state: &AppState,
    session: &Session,
    user_id: Uuid,
) -> Result<Vec<User>, ApiError> {
    require_user(state, session)?;
    let user = find_user(state, user_id)?;
    Ok(to_users(state.db.following(&user.id.to_string())?)?)
}

/// Who follows `user_id`. Requires a logged-in viewer.
pub fn show_followers(
    state: &AppState,
    session: &Session,
    user_id: Uuid,
) -> Result<Vec<User>, ApiError> {
    require_user(state, session)?;
    let user = find_user(state, user_id)?;
    Ok(to_users(state.db.followers(&user.id.to_string())?)?)
}

pub fn start_following(
    state: &AppState,
    session: &Session,
    follow_id: Uuid,
) -> Result<Follow, ApiError> {
    let user = require_user(state, session)?;
    if user.id == follow_id {
        return Err(ApiError::Validation("You cannot follow yourself".into()));
    }
    let followed = find_user(state, follow_id)?;

    let row = state
        .db
        .follow(&user.id.to_string(), &followed.id.to_string())
        .map_err(|e| match e {
            DbError::Integrity(_) => {
                ApiError::Conflict(format!("Already following {}", followed.username))
            }
            e => e.into(),
        })?;

    info!("{} now follows {}", user.username, followed.username);
    Ok(Follow::try_from(row)?)
}

/// Stopping to follow someone you don't follow is a no-op.
pub fn stop_following(
    state: &AppState,
    session: &Session,
    follow_id: Uuid,
) -> Result<(), ApiError> {
    let user = require_user(state, session)?;
    let followed = find_user(state, follow_id)?;

    if state
        .db
        .unfollow(&user.id.to_string(), &followed.id.to_string())?
    {
        info!("{} stopped following {}", user.username, followed.username);
    }
    Ok(())
}

/// Edit the current user's profile after re-checking their password.
pub fn update_profile(
    state: &AppState,
    session: &Session,
    req: ProfileUpdateRequest,
) -> Result<User, ApiError> {
    let user = require_user(state, session)?;
    confirm_password(state, &user, &req.password)?;

    validate_username(&req.username)?;
    validate_email(&req.email)?;

    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    let update = UserUpdate {
        username: req.username,
        email: req.email,
        image_url: non_empty(req.image_url),
        header_image_url: non_empty(req.header_image_url),
        bio: non_empty(req.bio),
        location: non_empty(req.location),
    };

    let row = state
        .db
        .update_user(&user.id.to_string(), &update)
        .map_err(|e| match e {
            DbError::Integrity(_) => ApiError::Conflict("Username or email already taken".into()),
            e => e.into(),
        })?;

    Ok(User::try_from(row)?)
}

/// Delete the current user and everything they own, then log out.
pub fn delete_account(state: &AppState, session: &mut Session) -> Result<(), ApiError> {
    let user = require_user(state, session)?;

    state.db.delete_user(&user.id.to_string())?;
    session.logout();

    info!("Deleted account {}", user.username);
    Ok(())
}
