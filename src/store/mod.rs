/// Persistence seams
///
/// The auth core and the task routes only talk to these traits. A
/// PostgreSQL implementation backs the server; the in-memory one backs tests
/// and local experiments.

mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Account, NewAccount, NewTask, Task, TaskQuery, TaskUpdate};

pub use memory::{InMemoryAccountStore, InMemoryTaskStore};
pub use postgres::{PgAccountStore, PgTaskStore};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique column (named here) already holds the value
    #[error("duplicate value for {0}")]
    UniqueViolation(&'static str),
    #[error("{0}")]
    Backend(String),
}

/// Account identities and their credential records.
#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    /// Create the account and its credential record in one transaction.
    ///
    /// Either both rows exist afterwards or neither does.
    async fn insert_account(
        &self,
        account: NewAccount,
        password_hash: String,
    ) -> Result<Account, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    /// Account joined with its credential hash, if it has one.
    async fn find_with_credential(
        &self,
        email: &str,
    ) -> Result<Option<(Account, Option<String>)>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    async fn credential_for(&self, id: Uuid) -> Result<Option<String>, StoreError>;

    /// Replace the stored hash. Returns `false` if the account has no credential.
    async fn replace_credential(&self, id: Uuid, password_hash: String) -> Result<bool, StoreError>;

    /// Remove the account and its credential.
    async fn delete_account(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Tasks, always scoped to their owner.
#[async_trait]
pub trait TaskStore: Send + Sync + 'static {
    async fn create(&self, owner: Uuid, task: NewTask) -> Result<Task, StoreError>;

    /// Newest first.
    async fn list(&self, owner: Uuid, query: &TaskQuery) -> Result<Vec<Task>, StoreError>;

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<Option<Task>, StoreError>;

    async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        update: TaskUpdate,
    ) -> Result<Option<Task>, StoreError>;

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError>;
}
