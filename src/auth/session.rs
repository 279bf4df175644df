/// Login / refresh orchestration
///
/// Ties the credential store to the token issuer. No server-side session
/// exists: every state transition is expressed through the token pair handed
/// back to the caller.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::claims::Identity;
use crate::auth::credentials::CredentialStore;
use crate::auth::token::{TokenIssuer, TokenKind, TokenPair, VerifyOptions};
use crate::error::{AppError, AuthError};
use crate::models::Account;
use crate::store::AccountStore;

/// Result of a successful login or refresh
#[derive(Debug)]
pub struct SessionGrant {
    pub account: Account,
    pub tokens: TokenPair,
}

#[derive(Clone)]
pub struct AuthService {
    credentials: CredentialStore,
    issuer: TokenIssuer,
}

impl AuthService {
    pub fn new(accounts: Arc<dyn AccountStore>, issuer: TokenIssuer) -> Self {
        Self {
            credentials: CredentialStore::new(accounts),
            issuer,
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<Account, AppError> {
        self.credentials.register(email, username, password).await
    }

    /// Check the credentials and mint a token pair.
    ///
    /// # Errors
    /// [`AuthError::InvalidCredentials`] when the email/password pair does
    /// not match; no token is issued in that case.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionGrant, AppError> {
        let account = self
            .credentials
            .validate(email, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let tokens = self.issue_for(&account).await?;
        Ok(SessionGrant { account, tokens })
    }

    /// Rotate a token pair from a refresh token.
    ///
    /// The password is not checked again. Any verification failure is
    /// reported as [`AuthError::InvalidRefreshToken`] without telling the
    /// caller why; an account deleted since the token was issued yields
    /// [`AuthError::AccountNotFound`].
    pub async fn refresh(&self, refresh_token: &str) -> Result<SessionGrant, AppError> {
        let identity = self
            .issuer
            .verify_identity(refresh_token, TokenKind::Refresh, VerifyOptions::default())
            .map_err(|e| {
                tracing::info!("Refresh token rejected: {}", e);
                AuthError::InvalidRefreshToken
            })?;

        let account = self
            .credentials
            .accounts()
            .find_by_id(identity.account_id)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        let tokens = self.issue_for(&account).await?;
        Ok(SessionGrant { account, tokens })
    }

    /// Resolve the account behind an authenticated identity.
    pub async fn current_account(&self, account_id: Uuid) -> Result<Account, AppError> {
        self.credentials
            .accounts()
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| AuthError::AccountNotFound.into())
    }

    async fn issue_for(&self, account: &Account) -> Result<TokenPair, AppError> {
        let identity = Identity::new(account.id, account.email.clone());
        self.issuer
            .issue_pair(&identity)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}
