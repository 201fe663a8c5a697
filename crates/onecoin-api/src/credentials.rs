use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

use onecoin_db::Database;
use onecoin_db::models::AccountRow;

use crate::error::{ApiError, ApiResult};
use crate::token::AuthError;

/// Hash a password with Argon2id and a fresh salt.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, stored_hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| anyhow::anyhow!("Stored hash is not a PHC string: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Normalised form used for storage, lookup and the admin list.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Look the account up by email and check the password.
/// Unknown email and wrong password are indistinguishable to the caller.
pub fn authenticate(db: &Database, email: &str, password: &str) -> ApiResult<AccountRow> {
    authenticate_with(db, email, password, verify_password)
}

/// The hash check runs after the connection lock is released.
fn authenticate_with<V>(db: &Database, email: &str, password: &str, verify: V) -> ApiResult<AccountRow>
where
    V: FnOnce(&str, &str) -> anyhow::Result<bool>,
{
    let email = normalize_email(email);
    let account = db
        .read(|store| store.get_account_by_email(&email))?
        .ok_or(ApiError::Unauthenticated(AuthError::Invalid))?;

    if !verify(password, &account.password)? {
        return Err(ApiError::Unauthenticated(AuthError::Invalid));
    }

    Ok(account)
}
