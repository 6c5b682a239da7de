//! Credential hashing. Stored values are PHC strings (`$argon2id$v=19$...`),
//! so salt and cost parameters travel with each hash.

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hash(password_hash::Error),
    #[error("stored password hash is unusable: {0}")]
    StoredHash(password_hash::Error),
}

lazy_static! {
    // Checked against when a login names an unknown email.
    static ref DECOY_HASH: Option<String> = hash_password("taskmind-decoy-credential").ok();
}

/// Fresh random salt on every call, so equal passwords never share a hash.
pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(PasswordError::Hash)
}

pub fn verify_password(plain: &str, stored: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored).map_err(PasswordError::StoredHash)?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::StoredHash(e)),
    }
}

/// Spends one verification on a throwaway hash. Lets "no such user" cost the
/// same as "wrong password".
pub fn verify_decoy(plain: &str) {
    if let Some(decoy) = DECOY_HASH.as_deref() {
        let _ = verify_password(plain, decoy);
    }
}
