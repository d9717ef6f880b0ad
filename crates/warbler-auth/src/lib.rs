//! Account creation and credential checks on top of `warbler-db`.
//!
//! Passwords are only ever stored as Argon2id PHC strings. A failed login is
//! an [`AuthOutcome`], not an error.

pub mod password;

use thiserror::Error;
use tracing::{debug, info};

use warbler_db::models::NewUser;
use warbler_db::{Database, DbError};
use warbler_types::models::User;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("stored password is not a valid hash: {0}")]
    MalformedHash(String),
}

impl AuthError {
    /// True when the database refused the write (duplicate username or email).
    pub fn is_integrity(&self) -> bool {
        matches!(self, AuthError::Db(e) if e.is_integrity())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated(User),
    UnknownUser,
    WrongPassword,
}

impl AuthOutcome {
    pub fn user(self) -> Option<User> {
        match self {
            AuthOutcome::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthOutcome::Authenticated(_))
    }
}

/// Hash the password and store a new user.
/// A taken username or email fails with an integrity error.
pub fn signup(
    db: &Database,
    username: &str,
    email: &str,
    password: &str,
    image_url: Option<&str>,
) -> Result<User, AuthError> {
    let password_hash = password::hash_password(password)?;

    let row = db.insert_user(&NewUser {
        email: Some(email.to_string()),
        username: Some(username.to_string()),
        password: Some(password_hash),
        image_url: image_url.map(str::to_string),
    })?;

    info!("New user signed up: {}", row.username);
    Ok(User::try_from(row)?)
}

pub fn authenticate(
    db: &Database,
    username: &str,
    password: &str,
) -> Result<AuthOutcome, AuthError> {
    let Some(row) = db.get_user_by_username(username)? else {
        debug!("Login for unknown user {}", username);
        return Ok(AuthOutcome::UnknownUser);
    };

    if !password::verify_password(password, &row.password)? {
        debug!("Wrong password for {}", username);
        return Ok(AuthOutcome::WrongPassword);
    }

    Ok(AuthOutcome::Authenticated(User::try_from(row)?))
}
