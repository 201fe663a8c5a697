use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use uuid::Uuid;

use onecoin_types::models::{Claims, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    Missing,
    #[error("Invalid token")]
    Invalid,
    #[error("Token expired")]
    Expired,
}

/// Issues and verifies HS256 bearer tokens.
///
/// Verification only proves the token was signed by us and is unexpired; it
/// does not look the subject up.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is compared against an explicit clock in verify_at.
        validation.validate_exp = false;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn issue(&self, account_id: Uuid, role: Role) -> anyhow::Result<String> {
        self.issue_at(account_id, role, Utc::now())
    }

    pub fn issue_at(&self, account_id: Uuid, role: Role, issued_at: DateTime<Utc>) -> anyhow::Result<String> {
        let claims = Claims {
            sub: account_id,
            role,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|_| AuthError::Invalid)?;

        if now.timestamp() > data.claims.exp {
            return Err(AuthError::Expired);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(ttl: Duration) -> TokenService {
        TokenService::new("test-secret", ttl)
    }

    #[test]
    fn verify_returns_subject_and_role() {
        let tokens = service(Duration::hours(1));
        let id = Uuid::new_v4();

        let token = tokens.issue(id, Role::Admin).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn expired_after_ttl() {
        let tokens = service(Duration::seconds(1));
        let t0 = Utc::now();

        let token = tokens.issue_at(Uuid::new_v4(), Role::User, t0).unwrap();

        assert!(tokens.verify_at(&token, t0 + Duration::seconds(1)).is_ok());
        assert_eq!(
            tokens.verify_at(&token, t0 + Duration::seconds(2)),
            Err(AuthError::Expired)
        );
    }

    #[test]
    fn foreign_signature_is_invalid() {
        let ours = service(Duration::hours(1));
        let theirs = TokenService::new("another-secret", Duration::hours(1));

        let token = theirs.issue(Uuid::new_v4(), Role::Admin).unwrap();
        assert_eq!(ours.verify(&token), Err(AuthError::Invalid));
    }

    #[test]
    fn swapped_claims_are_invalid() {
        let tokens = service(Duration::hours(1));
        let user = tokens.issue(Uuid::new_v4(), Role::User).unwrap();
        let admin = tokens.issue(Uuid::new_v4(), Role::Admin).unwrap();

        // Admin claims glued onto the user's signature.
        let user_parts: Vec<&str> = user.split('.').collect();
        let admin_parts: Vec<&str> = admin.split('.').collect();
        let forged = format!("{}.{}.{}", user_parts[0], admin_parts[1], user_parts[2]);

        assert_eq!(tokens.verify(&forged), Err(AuthError::Invalid));
    }

    #[test]
    fn garbage_is_invalid() {
        let tokens = service(Duration::hours(1));
        assert_eq!(tokens.verify("not-a-token"), Err(AuthError::Invalid));
        assert_eq!(tokens.verify(""), Err(AuthError::Invalid));
    }
}
