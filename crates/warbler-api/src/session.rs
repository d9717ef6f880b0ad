use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warbler_types::models::User;

use crate::{ApiError, AppState};

/// Session key holding the logged-in user's id.
pub const CURR_USER_KEY: &str = "curr_user";

/// Per-client session data as stored by the HTTP layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    curr_user: Option<Uuid>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn logged_in(user_id: Uuid) -> Self {
        Self {
            curr_user: Some(user_id),
        }
    }

    pub fn login(&mut self, user_id: Uuid) {
        self.curr_user = Some(user_id);
    }

    pub fn logout(&mut self) {
        self.curr_user = None;
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.curr_user
    }
}

/// The session's user, if it names one that still exists.
pub fn current_user(state: &AppState, session: &Session) -> Result<Option<User>, ApiError> {
    let Some(id) = session.user_id() else {
        return Ok(None);
    };

    match state.db.get_user_by_id(&id.to_string())? {
        Some(row) => Ok(Some(User::try_from(row)?)),
        None => Ok(None),
    }
}

pub fn require_user(state: &AppState, session: &Session) -> Result<User, ApiError> {
    current_user(state, session)?.ok_or(ApiError::Unauthorized)
}
