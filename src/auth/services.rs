use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    jwt::TokenService,
    password::{hash_password, verify_decoy, verify_password},
    repo_types::User,
};
use crate::{
    error::{AppError, AppResult},
    store::{StoreError, UserStore},
};

pub const MIN_PASSWORD_LEN: usize = 6;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid");
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Emails are compared trimmed and lower-cased everywhere.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Hashing step of registration; runs before anything is persisted.
fn prepare_credentials(password: &str) -> AppResult<String> {
    Ok(hash_password(password)?)
}

pub async fn register(users: &dyn UserStore, email: &str, password: &str) -> AppResult<User> {
    let email = normalize_email(email);

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation("invalid email".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    // Fast path only; the unique index decides under concurrent registration.
    if users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::DuplicateUser);
    }

    let hash = prepare_credentials(password)?;

    let user = match users.create(&email, &hash).await {
        Ok(u) => u,
        Err(StoreError::UniqueViolation(constraint)) => {
            warn!(email = %email, %constraint, "email registered concurrently");
            return Err(AppError::DuplicateUser);
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

pub async fn login(
    users: &dyn UserStore,
    tokens: &TokenService,
    email: &str,
    password: &str,
) -> AppResult<(String, User)> {
    let email = normalize_email(email);

    if !is_valid_email(&email) {
        return Err(AppError::Validation("invalid email".into()));
    }
    if password.is_empty() {
        return Err(AppError::Validation("password is required".into()));
    }

    let user = match users.find_by_email(&email).await? {
        Some(u) => u,
        None => {
            verify_decoy(password);
            warn!(email = %email, "login unknown email");
            return Err(AppError::InvalidCredentials);
        }
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = tokens.issue(user.id, &user.email)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((token, user))
}
