/// Credential Store
///
/// Owns the password hash of every account. Nothing outside this module ever
/// sees a hash: callers get an [`Account`] or nothing.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AuthError, ValidationError};
use crate::models::{Account, NewAccount};
use crate::store::AccountStore;
use crate::validators::{is_valid_email, is_valid_password, is_valid_username};

#[derive(Clone)]
pub struct CredentialStore {
    accounts: Arc<dyn AccountStore>,
}

impl CredentialStore {
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self { accounts }
    }

    pub fn accounts(&self) -> &Arc<dyn AccountStore> {
        &self.accounts
    }

    /// Create an account and its credential record.
    ///
    /// # Errors
    /// - [`AppError::Validation`] for malformed input
    /// - [`AppError::Conflict`] when the email (or username) is taken, also
    ///   when a concurrent registration wins the race
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<Account, AppError> {
        let email = is_valid_email(email)?;
        let username = is_valid_username(username)?;
        is_valid_password(password)?;

        if self.accounts.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(password.to_string()).await?;

        let account = self
            .accounts
            .insert_account(NewAccount { email, username }, password_hash)
            .await?;

        Ok(account)
    }

    /// Check a password attempt. `None` means no match, never an error:
    /// unknown email, account without credential and wrong password all
    /// look the same to the caller.
    pub async fn validate(&self, email: &str, password: &str) -> Result<Option<Account>, AppError> {
        let (account, stored_hash) = match self.accounts.find_with_credential(email.trim()).await? {
            Some((account, Some(hash))) => (account, hash),
            _ => return Ok(None),
        };

        if verify_password(password.to_string(), stored_hash).await? {
            Ok(Some(account))
        } else {
            Ok(None)
        }
    }

    /// Replace the credential after checking the current password.
    pub async fn change_password(
        &self,
        account_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        is_valid_password(new_password)?;
        if current_password == new_password {
            return Err(ValidationError::InvalidFormat("new password").into());
        }

        let stored_hash = self
            .accounts
            .credential_for(account_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(current_password.to_string(), stored_hash).await? {
            return Err(AuthError::InvalidCredentials.into());
        }

        let new_hash = hash_password(new_password.to_string()).await?;
        if !self.accounts.replace_credential(account_id, new_hash).await? {
            return Err(AuthError::InvalidCredentials.into());
        }

        Ok(())
    }
}
