/// JWT Token Issuance and Verification
///
/// Access and refresh tokens are both stateless HS256 JWTs signed with two
/// distinct secrets, so one kind can never be accepted in place of the other.

use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;

use crate::auth::claims::{Claims, Identity};
use crate::configuration::JwtSettings;

/// Fixed refresh token lifetime: 7 days
pub const REFRESH_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Internal verification failure.
///
/// Never returned to a client as-is: the gatekeeper and the session flow
/// translate it into an [`crate::error::AuthError`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("token is invalid")]
    Invalid,
    #[error("token signing failed: {0}")]
    Signing(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyOptions {
    pub ignore_expiration: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

struct IssuerKeys {
    access: SigningKey,
    refresh: SigningKey,
    access_ttl: i64,
    issuer: String,
}

/// Mints and verifies access/refresh token pairs. Cheap to clone.
#[derive(Clone)]
pub struct TokenIssuer {
    keys: Arc<IssuerKeys>,
}

impl TokenIssuer {
    pub fn new(config: &JwtSettings) -> Self {
        Self {
            keys: Arc::new(IssuerKeys {
                access: SigningKey::from_secret(&config.access_secret),
                refresh: SigningKey::from_secret(&config.refresh_secret),
                access_ttl: config.access_token_expiry,
                issuer: config.issuer.clone(),
            }),
        }
    }

    /// Access token lifetime in seconds
    pub fn access_ttl(&self) -> i64 {
        self.keys.access_ttl
    }

    fn key(&self, kind: TokenKind) -> &SigningKey {
        match kind {
            TokenKind::Access => &self.keys.access,
            TokenKind::Refresh => &self.keys.refresh,
        }
    }

    /// Default lifetime for `kind`
    pub fn ttl(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.keys.access_ttl,
            TokenKind::Refresh => REFRESH_TOKEN_TTL_SECONDS,
        }
    }

    /// Sign a single token of `kind` that expires `ttl_seconds` from now.
    pub fn sign(
        &self,
        kind: TokenKind,
        identity: &Identity,
        ttl_seconds: i64,
    ) -> Result<String, TokenError> {
        let claims = Claims::new(identity, ttl_seconds, self.keys.issuer.clone());
        encode(&Header::default(), &claims, &self.key(kind).encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    async fn sign_blocking(&self, kind: TokenKind, identity: Identity) -> Result<String, TokenError> {
        let issuer = self.clone();
        let ttl = self.ttl(kind);
        tokio::task::spawn_blocking(move || issuer.sign(kind, &identity, ttl))
            .await
            .map_err(|e| TokenError::Signing(e.to_string()))?
    }

    /// Mint a fresh access/refresh pair for `identity`.
    ///
    /// The two signatures are independent and are computed in parallel.
    pub async fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, TokenError> {
        let (access_token, refresh_token) = futures::future::try_join(
            self.sign_blocking(TokenKind::Access, identity.clone()),
            self.sign_blocking(TokenKind::Refresh, identity.clone()),
        )
        .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Verify `token` against the secret of `kind` and return its claims.
    ///
    /// # Errors
    /// [`TokenError::Expired`] when the token is past its expiry (unless
    /// ignored), [`TokenError::Invalid`] for anything else: bad signature,
    /// wrong secret, wrong issuer, malformed payload or subject.
    pub fn verify(
        &self,
        token: &str,
        kind: TokenKind,
        options: VerifyOptions,
    ) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.keys.issuer]);
        validation.leeway = 0;
        validation.validate_exp = !options.ignore_expiration;

        let claims = decode::<Claims>(token, &self.key(kind).decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(kind = ?kind, "JWT validation error: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Invalid,
                }
            })?;

        // subject must be a usable account id
        claims.identity()?;
        Ok(claims)
    }

    /// Verify and resolve straight to the identity.
    pub fn verify_identity(
        &self,
        token: &str,
        kind: TokenKind,
        options: VerifyOptions,
    ) -> Result<Identity, TokenError> {
        self.verify(token, kind, options)?.identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn get_test_config() -> JwtSettings {
        JwtSettings {
            access_secret: "test-access-secret-at-least-32-characters".to_string(),
            access_token_expiry: 3600,
            refresh_secret: "test-refresh-secret-at-least-32-characters".to_string(),
            issuer: "test".to_string(),
        }
    }

    fn identity() -> Identity {
        Identity::new(Uuid::new_v4(), "test@example.com")
    }

    #[tokio::test]
    async fn test_issue_pair_round_trips() {
        let issuer = TokenIssuer::new(&get_test_config());
        let identity = identity();

        let pair = issuer.issue_pair(&identity).await.expect("Failed to issue tokens");

        let access = issuer
            .verify_identity(&pair.access_token, TokenKind::Access, VerifyOptions::default())
            .expect("Failed to verify access token");
        let refresh = issuer
            .verify_identity(&pair.refresh_token, TokenKind::Refresh, VerifyOptions::default())
            .expect("Failed to verify refresh token");

        assert_eq!(access, identity);
        assert_eq!(refresh, identity);
    }

    #[tokio::test]
    async fn test_refresh_token_lives_seven_days() {
        let issuer = TokenIssuer::new(&get_test_config());
        let pair = issuer.issue_pair(&identity()).await.unwrap();

        let access = issuer
            .verify(&pair.access_token, TokenKind::Access, VerifyOptions::default())
            .unwrap();
        let refresh = issuer
            .verify(&pair.refresh_token, TokenKind::Refresh, VerifyOptions::default())
            .unwrap();

        assert_eq!(access.exp - access.iat, 3600);
        assert_eq!(refresh.exp - refresh.iat, REFRESH_TOKEN_TTL_SECONDS);
    }

    #[tokio::test]
    async fn test_cross_secret_rejection() {
        let issuer = TokenIssuer::new(&get_test_config());
        let pair = issuer.issue_pair(&identity()).await.unwrap();

        assert_eq!(
            issuer
                .verify(&pair.access_token, TokenKind::Refresh, VerifyOptions::default())
                .unwrap_err(),
            TokenError::Invalid
        );
        assert_eq!(
            issuer
                .verify(&pair.refresh_token, TokenKind::Access, VerifyOptions::default())
                .unwrap_err(),
            TokenError::Invalid
        );
    }

    #[test]
    fn test_expired_token() {
        let issuer = TokenIssuer::new(&get_test_config());
        let token = issuer.sign(TokenKind::Access, &identity(), -120).unwrap();

        let result = issuer.verify(&token, TokenKind::Access, VerifyOptions::default());
        assert_eq!(result.unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn test_expiration_can_be_ignored() {
        let issuer = TokenIssuer::new(&get_test_config());
        let identity = identity();
        let token = issuer.sign(TokenKind::Refresh, &identity, -120).unwrap();

        let options = VerifyOptions {
            ignore_expiration: true,
        };
        let resolved = issuer
            .verify_identity(&token, TokenKind::Refresh, options)
            .expect("expired token should verify when expiry is ignored");
        assert_eq!(resolved, identity);
    }

    #[test]
    fn test_invalid_token() {
        let issuer = TokenIssuer::new(&get_test_config());
        let result = issuer.verify("invalid.token.here", TokenKind::Access, VerifyOptions::default());

        assert_eq!(result.unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn test_tampered_token() {
        let issuer = TokenIssuer::new(&get_test_config());
        let token = issuer.sign(TokenKind::Access, &identity(), 3600).unwrap();

        let tampered = format!("{}X", token);
        let result = issuer.verify(&tampered, TokenKind::Access, VerifyOptions::default());

        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_issuer() {
        let config = get_test_config();
        let token = TokenIssuer::new(&config)
            .sign(TokenKind::Access, &identity(), 3600)
            .unwrap();

        let mut other = config.clone();
        other.issuer = "wrong-issuer".to_string();
        let result = TokenIssuer::new(&other).verify(&token, TokenKind::Access, VerifyOptions::default());

        assert_eq!(result.unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn test_non_uuid_subject_is_rejected() {
        let config = get_test_config();
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            email: "test@example.com".to_string(),
            exp: chrono::Utc::now().timestamp() + 3600,
            iat: chrono::Utc::now().timestamp(),
            iss: config.issuer.clone(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.access_secret.as_bytes()),
        )
        .unwrap();

        let result = TokenIssuer::new(&config).verify(&token, TokenKind::Access, VerifyOptions::default());
        assert_eq!(result.unwrap_err(), TokenError::Invalid);
    }
}
