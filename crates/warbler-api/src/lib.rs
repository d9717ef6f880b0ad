//! Request-level Warbler operations: what each page handler does once the
//! HTTP layer has decoded the form and loaded the session.

pub mod auth;
pub mod error;
pub mod likes;
pub mod messages;
pub mod session;
pub mod users;

use std::sync::Arc;

use warbler_db::Database;

pub use error::ApiError;
pub use session::{CURR_USER_KEY, Session};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
}

impl AppStateInner {
    pub fn new(db: Database) -> AppState {
        Arc::new(Self { db })
    }
}
