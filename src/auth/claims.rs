/// JWT Claims structure
///
/// Access and refresh tokens carry the same payload; only the signing
/// secret and lifetime differ.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::token::TokenError;

/// The resolved caller of a request: who the token says they are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub account_id: Uuid,
    pub email: String,
}

impl Identity {
    pub fn new(account_id: Uuid, email: impl Into<String>) -> Self {
        Self {
            account_id,
            email: email.into(),
        }
    }
}

/// JWT Claims for both token kinds
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (account ID as UUID string)
    pub sub: String,
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub iss: String,
}

impl Claims {
    /// Create claims for `identity` expiring `expiry_seconds` from now.
    ///
    /// A negative expiry produces already-expired claims.
    pub fn new(identity: &Identity, expiry_seconds: i64, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: identity.account_id.to_string(),
            email: identity.email.clone(),
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer,
        }
    }

    /// Extract the identity these claims were issued for
    ///
    /// # Errors
    /// Returns [`TokenError::Invalid`] if the subject is not a UUID
    pub fn identity(&self) -> Result<Identity, TokenError> {
        let account_id = Uuid::parse_str(&self.sub).map_err(|_| TokenError::Invalid)?;
        Ok(Identity::new(account_id, self.email.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let identity = Identity::new(Uuid::new_v4(), "test@example.com");
        let claims = Claims::new(&identity, 3600, "test".to_string());

        assert_eq!(claims.sub, identity.account_id.to_string());
        assert_eq!(claims.email, identity.email);
        assert_eq!(claims.iss, "test");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_identity_extraction() {
        let identity = Identity::new(Uuid::new_v4(), "test@example.com");
        let claims = Claims::new(&identity, 3600, "test".to_string());

        assert_eq!(claims.identity().unwrap(), identity);
    }

    #[test]
    fn test_invalid_subject() {
        let identity = Identity::new(Uuid::new_v4(), "test@example.com");
        let mut claims = Claims::new(&identity, 3600, "test".to_string());
        claims.sub = "invalid-uuid".to_string();

        assert!(matches!(claims.identity(), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_negative_expiry_lies_in_the_past() {
        let identity = Identity::new(Uuid::new_v4(), "test@example.com");
        let claims = Claims::new(&identity, -10, "test".to_string());
        assert!(claims.exp < claims.iat);
    }
}
