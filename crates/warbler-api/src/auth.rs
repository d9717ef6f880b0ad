use tracing::{info, warn};

use warbler_auth::AuthOutcome;
use warbler_types::api::{LoginRequest, SignupRequest};
use warbler_types::models::User;

use crate::{ApiError, AppState, Session};

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn signup(
    state: &AppState,
    session: &mut Session,
    req: SignupRequest,
) -> Result<User, ApiError> {
    validate_username(&req.username)?;
    validate_email(&req.email)?;
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let image_url = req.image_url.as_deref().filter(|url| !url.trim().is_empty());

    let user = warbler_auth::signup(&state.db, &req.username, &req.email, &req.password, image_url)
        .map_err(|e| match e {
            e if e.is_integrity() => ApiError::Conflict("Username or email already taken".into()),
            e => e.into(),
        })?;

    session.login(user.id);
    Ok(user)
}

pub fn login(
    state: &AppState,
    session: &mut Session,
    req: LoginRequest,
) -> Result<User, ApiError> {
    match warbler_auth::authenticate(&state.db, &req.username, &req.password)? {
        AuthOutcome::Authenticated(user) => {
            info!("{} logged in", user.username);
            session.login(user.id);
            Ok(user)
        }
        AuthOutcome::UnknownUser | AuthOutcome::WrongPassword => {
            Err(ApiError::InvalidCredentials)
        }
    }
}

pub fn logout(session: &mut Session) {
    session.logout();
}

/// Re-check the current password before a sensitive change.
pub(crate) fn confirm_password(
    state: &AppState,
    user: &User,
    password: &str,
) -> Result<(), ApiError> {
    if warbler_auth::authenticate(&state.db, &user.username, password)?.is_authenticated() {
        Ok(())
    } else {
        warn!("Password confirmation failed for {}", user.username);
        Err(ApiError::InvalidCredentials)
    }
}

pub(crate) fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.trim().is_empty() {
        return Err(ApiError::Validation("Username is required".into()));
    }
    Ok(())
}

pub(crate) fn validate_email(email: &str) -> Result<(), ApiError> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(ApiError::Validation("Invalid email address".into()));
    }
    Ok(())
}
