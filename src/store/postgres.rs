use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{AccountStore, StoreError, TaskStore};
use crate::models::{Account, NewAccount, NewTask, Task, TaskQuery, TaskUpdate};

const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                let field = match db_err.constraint() {
                    Some("users_username_key") => "username",
                    _ => "email",
                };
                return StoreError::UniqueViolation(field);
            }
        }
        StoreError::Backend(err.to_string())
    }
}

/// PostgreSQL-backed account and credential storage
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn insert_account(
        &self,
        account: NewAccount,
        password_hash: String,
    ) -> Result<Account, StoreError> {
        let now = Utc::now();
        let mut transaction = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO users (id, email, username, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, email, username, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&account.email)
        .bind(&account.username)
        .bind(now)
        .fetch_one(&mut transaction)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO credentials (id, user_id, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(created.id)
        .bind(password_hash)
        .bind(now)
        .execute(&mut transaction)
        .await?;

        transaction.commit().await?;
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, email, username, created_at, updated_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn find_with_credential(
        &self,
        email: &str,
    ) -> Result<Option<(Account, Option<String>)>, StoreError> {
        let row = sqlx::query_as::<
            _,
            (Uuid, String, String, DateTime<Utc>, DateTime<Utc>, Option<String>),
        >(
            r#"
            SELECT u.id, u.email, u.username, u.created_at, u.updated_at, c.password_hash
            FROM users u
            LEFT JOIN credentials c ON c.user_id = u.id
            WHERE u.email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, email, username, created_at, updated_at, hash)| {
            (
                Account {
                    id,
                    email,
                    username,
                    created_at,
                    updated_at,
                },
                hash,
            )
        }))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, email, username, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn credential_for(&self, id: Uuid) -> Result<Option<String>, StoreError> {
        let hash = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM credentials WHERE user_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(hash)
    }

    async fn replace_credential(&self, id: Uuid, password_hash: String) -> Result<bool, StoreError> {
        let mut transaction = self.pool.begin().await?;

        let replaced = sqlx::query("UPDATE credentials SET password_hash = $1 WHERE user_id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&mut transaction)
            .await?
            .rows_affected();

        sqlx::query("UPDATE users SET updated_at = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(id)
            .execute(&mut transaction)
            .await?;

        transaction.commit().await?;
        Ok(replaced > 0)
    }

    async fn delete_account(&self, id: Uuid) -> Result<bool, StoreError> {
        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    completed: bool,
    priority: String,
    due_date: Option<DateTime<Utc>>,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = StoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            id: row.id,
            title: row.title,
            description: row.description,
            completed: row.completed,
            priority: row.priority.parse().map_err(StoreError::Backend)?,
            due_date: row.due_date,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const TASK_COLUMNS: &str =
    "id, title, description, completed, priority, due_date, user_id, created_at, updated_at";

/// PostgreSQL-backed task storage
#[derive(Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn create(&self, owner: Uuid, task: NewTask) -> Result<Task, StoreError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            INSERT INTO tasks (id, title, description, completed, priority, due_date, user_id, created_at, updated_at)
            VALUES ($1, $2, $3, false, $4, $5, $6, $7, $7)
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(task.title)
        .bind(task.description)
        .bind(task.priority.as_str())
        .bind(task.due_date)
        .bind(owner)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn list(&self, owner: Uuid, query: &TaskQuery) -> Result<Vec<Task>, StoreError> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {}
            FROM tasks
            WHERE user_id = $1
              AND ($2::boolean IS NULL OR completed = $2)
              AND ($3::text IS NULL OR priority = $3)
              AND ($4::text IS NULL OR title ILIKE '%' || $4 || '%')
            ORDER BY created_at DESC
            LIMIT $5 OFFSET $6
            "#,
            TASK_COLUMNS
        ))
        .bind(owner)
        .bind(query.completed)
        .bind(query.priority.map(|p| p.as_str()))
        .bind(query.search.as_deref())
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<Option<Task>, StoreError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Task::try_from).transpose()
    }

    async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        update: TaskUpdate,
    ) -> Result<Option<Task>, StoreError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            UPDATE tasks SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                completed = COALESCE($5, completed),
                priority = COALESCE($6, priority),
                due_date = COALESCE($7, due_date),
                updated_at = $8
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .bind(update.title)
        .bind(update.description)
        .bind(update.completed)
        .bind(update.priority.map(|p| p.as_str()))
        .bind(update.due_date)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Task::try_from).transpose()
    }

    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let deleted = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }
}
