//! CRUD over the `todos` table.
//!
//! Reads page by identity (keyset pagination): a page is "the newest `size`
//! rows with an id below the cursor", so concurrent inserts never shift rows
//! between pages.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::model::Todo;
use crate::service::ServiceError;

const SELECT_COLUMNS: &str = "SELECT id, subject, description, created_at, updated_at FROM todos";

/// TODO data access. Holds nothing but the pool; records are never cached.
#[derive(Clone)]
pub struct TodoService {
    pool: SqlitePool,
}

impl TodoService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a TODO and return it as stored, with store-assigned id and timestamps.
    pub async fn create(&self, subject: &str, description: &str) -> Result<Todo, ServiceError> {
        let result = sqlx::query("INSERT INTO todos (subject, description) VALUES (?, ?)")
            .bind(subject)
            .bind(description)
            .execute(&self.pool)
            .await?;

        let todo = sqlx::query_as::<_, Todo>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(result.last_insert_rowid())
            .fetch_one(&self.pool)
            .await?;

        Ok(todo)
    }

    /// Read up to `size` TODOs in descending id order.
    ///
    /// A positive `cursor` restricts the page to ids strictly below it.
    /// `size == 0` returns an empty page without querying.
    pub async fn read(&self, cursor: i64, size: u32) -> Result<Vec<Todo>, ServiceError> {
        if size == 0 {
            return Ok(Vec::new());
        }

        let todos = if cursor > 0 {
            sqlx::query_as::<_, Todo>(&format!(
                "{SELECT_COLUMNS} WHERE id < ? ORDER BY id DESC LIMIT ?"
            ))
            .bind(cursor)
            .bind(i64::from(size))
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Todo>(&format!("{SELECT_COLUMNS} ORDER BY id DESC LIMIT ?"))
                .bind(i64::from(size))
                .fetch_all(&self.pool)
                .await?
        };

        Ok(todos)
    }

    /// Replace subject and description of an existing TODO.
    ///
    /// Id 0 is never a valid identity and fails without touching the store.
    pub async fn update(
        &self,
        id: i64,
        subject: &str,
        description: &str,
    ) -> Result<Todo, ServiceError> {
        if id == 0 {
            return Err(ServiceError::NotFound);
        }

        let result = sqlx::query("UPDATE todos SET subject = ?, description = ? WHERE id = ?")
            .bind(subject)
            .bind(description)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound);
        }

        let todo = sqlx::query_as::<_, Todo>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(todo)
    }

    /// Delete every TODO whose id is in `ids`, in one statement.
    ///
    /// Succeeds when at least one row was removed, even if some ids did not
    /// exist. Only a delete that removed nothing reports `NotFound`.
    pub async fn delete(&self, ids: &[i64]) -> Result<(), ServiceError> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut query = QueryBuilder::<Sqlite>::new("DELETE FROM todos WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let result = query.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound);
        }

        tracing::debug!(requested = ids.len(), deleted = result.rows_affected(), "TODOs deleted");
        Ok(())
    }
}
