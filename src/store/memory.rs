use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{AccountStore, StoreError, TaskStore};
use crate::models::{Account, NewAccount, NewTask, Task, TaskQuery, TaskUpdate};

#[derive(Default)]
struct AccountTables {
    accounts: HashMap<Uuid, Account>,
    // keyed by account id: one credential per account
    credentials: HashMap<Uuid, String>,
}

/// Account storage held in process memory.
///
/// A single mutex guards both tables, so the uniqueness check and the
/// two inserts of a registration happen as one step.
#[derive(Default)]
pub struct InMemoryAccountStore {
    tables: Mutex<AccountTables>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, AccountTables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn insert_account(
        &self,
        account: NewAccount,
        password_hash: String,
    ) -> Result<Account, StoreError> {
        let mut tables = self.tables();

        if tables.accounts.values().any(|a| a.email == account.email) {
            return Err(StoreError::UniqueViolation("email"));
        }
        if tables.accounts.values().any(|a| a.username == account.username) {
            return Err(StoreError::UniqueViolation("username"));
        }

        let now = Utc::now();
        let created = Account {
            id: Uuid::new_v4(),
            email: account.email,
            username: account.username,
            created_at: now,
            updated_at: now,
        };
        tables.credentials.insert(created.id, password_hash);
        tables.accounts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self
            .tables()
            .accounts
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn find_with_credential(
        &self,
        email: &str,
    ) -> Result<Option<(Account, Option<String>)>, StoreError> {
        let tables = self.tables();
        Ok(tables
            .accounts
            .values()
            .find(|a| a.email == email)
            .map(|a| (a.clone(), tables.credentials.get(&a.id).cloned())))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.tables().accounts.get(&id).cloned())
    }

    async fn credential_for(&self, id: Uuid) -> Result<Option<String>, StoreError> {
        Ok(self.tables().credentials.get(&id).cloned())
    }

    async fn replace_credential(&self, id: Uuid, password_hash: String) -> Result<bool, StoreError> {
        let mut tables = self.tables();
        match tables.credentials.get_mut(&id) {
            Some(stored) => {
                *stored = password_hash;
                if let Some(account) = tables.accounts.get_mut(&id) {
                    account.updated_at = Utc::now();
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_account(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables();
        tables.credentials.remove(&id);
        Ok(tables.accounts.remove(&id).is_some())
    }
}

/// Task storage held in process memory
#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: Mutex<HashMap<Uuid, Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<Uuid, Task>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, owner: Uuid, task: NewTask) -> Result<Task, StoreError> {
        let now = Utc::now();
        let created = Task {
            id: Uuid::new_v4(),
            title: task.title,
            description: task.description,
            completed: false,
            priority: task.priority,
            due_date: task.due_date,
            user_id: owner,
            created_at: now,
            updated_at: now,
        };
        self.tasks().insert(created.id, created.clone());
        Ok(created)
    }

    async fn list(&self, owner: Uuid, query: &TaskQuery) -> Result<Vec<Task>, StoreError> {
        let needle = query.search.as_ref().map(|s| s.to_lowercase());

        let mut matching: Vec<Task> = self
            .tasks()
            .values()
            .filter(|t| t.user_id == owner)
            .filter(|t| query.completed.map_or(true, |c| t.completed == c))
            .filter(|t| query.priority.map_or(true, |p| t.priority == p))
            .filter(|t| {
                needle
                    .as_ref()
                    .map_or(true, |n| t.title.to_lowercase().contains(n.as_str()))
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(matching
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .collect())
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(self
            .tasks()
            .get(&id)
            .filter(|t| t.user_id == owner)
            .cloned())
    }

    async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        update: TaskUpdate,
    ) -> Result<Option<Task>, StoreError> {
        let mut tasks = self.tasks();
        let task = match tasks.get_mut(&id).filter(|t| t.user_id == owner) {
            Some(task) => task,
            None => return Ok(None),
        };

        if let Some(title) = update.title {
            task.title = title;
        }
        if let Some(description) = update.description {
            task.description = Some(description);
        }
        if let Some(completed) = update.completed {
            task.completed = completed;
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(due_date) = update.due_date {
            task.due_date = Some(due_date);
        }
        task.updated_at = Utc::now();

        Ok(Some(task.clone()))
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let mut tasks = self.tasks();
        if tasks.get(&id).map_or(false, |t| t.user_id == owner) {
            tasks.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}
