use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use uuid::Uuid;

use shared::domain::{NewTodo, Todo, TodoFields, TodoId};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct StoredTodo {
    pub todo: Todo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// All todos in insertion order.
    pub async fn list_todos(&self) -> Result<Vec<StoredTodo>> {
        let rows = sqlx::query(
            "SELECT id, title, description, status, created_at, updated_at
             FROM todos
             ORDER BY seq ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list todos")?;

        Ok(rows.iter().map(stored_todo_from_row).collect())
    }

    pub async fn get_todo(&self, id: &TodoId) -> Result<Option<StoredTodo>> {
        let row = sqlx::query(
            "SELECT id, title, description, status, created_at, updated_at
             FROM todos
             WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(stored_todo_from_row))
    }

    /// Inserts a new open todo and returns the id assigned to it.
    pub async fn create_todo(&self, new_todo: &NewTodo) -> Result<TodoId> {
        let id = TodoId::new(Uuid::new_v4().simple().to_string());
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO todos (id, title, description, status, created_at, updated_at)
             VALUES (?, ?, ?, 0, ?, ?)",
        )
        .bind(id.as_str())
        .bind(&new_todo.title)
        .bind(&new_todo.description)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("failed to insert todo")?;
        Ok(id)
    }

    /// Applies the present fields of `fields`. Returns false when no todo has `id`.
    pub async fn update_todo_fields(&self, id: &TodoId, fields: &TodoFields) -> Result<bool> {
        if fields.is_empty() {
            return Ok(self.get_todo(id).await?.is_some());
        }

        let result = sqlx::query(
            "UPDATE todos
             SET title = COALESCE(?, title),
                 description = COALESCE(?, description),
                 status = COALESCE(?, status),
                 updated_at = ?
             WHERE id = ?",
        )
        .bind(fields.title.as_deref())
        .bind(fields.description.as_deref())
        .bind(fields.status)
        .bind(Utc::now())
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to update todo {id}"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns false when no todo has `id`.
    pub async fn delete_todo(&self, id: &TodoId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete todo {id}"))?;
        Ok(result.rows_affected() > 0)
    }
}

fn stored_todo_from_row(row: &SqliteRow) -> StoredTodo {
    StoredTodo {
        todo: Todo {
            id: TodoId::new(row.get::<String, _>("id")),
            title: row.get("title"),
            description: row.get("description"),
            status: row.get::<bool, _>("status"),
        },
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Creates the directory holding a file-backed sqlite database. In-memory urls are left alone.
pub fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
