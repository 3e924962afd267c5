// SPDX-License-Identifier: MIT
//! Task SQLite operations.

use chrono::Utc;
use sqlx::SqlitePool;

use super::model::{
    validate_due_date, validate_name, BulkTaskEntry, CreateTaskParams, TaskError, TaskFilter,
    TaskRow, UpdateTaskParams,
};

/// Default timeout for individual SQLite queries.
/// Prevents hung queries from blocking the server indefinitely.
const QUERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Execute a future with the standard query timeout.
async fn with_timeout<T>(
    fut: impl std::future::Future<Output = Result<T, TaskError>>,
) -> Result<T, TaskError> {
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(TaskError::Timeout(QUERY_TIMEOUT.as_secs())),
    }
}

#[derive(Clone)]
pub struct TaskStorage {
    pool: SqlitePool,
}

impl TaskStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All tasks in insertion order, optionally excluding completed ones.
    pub async fn list(&self, filter: TaskFilter) -> Result<Vec<TaskRow>, TaskError> {
        with_timeout(async {
            let rows = match filter {
                TaskFilter::All => {
                    sqlx::query_as("SELECT * FROM tasks ORDER BY id ASC")
                        .fetch_all(&self.pool)
                        .await?
                }
                TaskFilter::Incomplete => {
                    sqlx::query_as("SELECT * FROM tasks WHERE complete = 0 ORDER BY id ASC")
                        .fetch_all(&self.pool)
                        .await?
                }
            };
            Ok(rows)
        })
        .await
    }

    pub async fn count(&self, filter: TaskFilter) -> Result<u64, TaskError> {
        let row: (i64,) = match filter {
            TaskFilter::All => {
                sqlx::query_as("SELECT COUNT(*) FROM tasks")
                    .fetch_one(&self.pool)
                    .await?
            }
            TaskFilter::Incomplete => {
                sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE complete = 0")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(row.0 as u64)
    }

    pub async fn get(&self, id: i64) -> Result<TaskRow, TaskError> {
        sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(TaskError::NotFound(id))
    }

    pub async fn add(&self, params: CreateTaskParams) -> Result<TaskRow, TaskError> {
        validate_name(&params.name)?;
        validate_due_date(&params.due_date)?;

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO tasks (name, due_date, complete, created_at, updated_at)
             VALUES (?, ?, 0, ?, ?)",
        )
        .bind(&params.name)
        .bind(&params.due_date)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        self.get(result.last_insert_rowid()).await
    }

    /// Insert a batch of tasks in one transaction. The whole batch is
    /// rejected if any entry fails validation — nothing is inserted.
    pub async fn bulk_add(&self, entries: &[BulkTaskEntry]) -> Result<u64, TaskError> {
        for entry in entries {
            validate_name(&entry.name)?;
            validate_due_date(&entry.due_date)?;
        }

        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;
        for entry in entries {
            sqlx::query(
                "INSERT INTO tasks (name, due_date, complete, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&entry.name)
            .bind(&entry.due_date)
            .bind(entry.complete)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(entries.len() as u64)
    }

    pub async fn update(&self, id: i64, params: UpdateTaskParams) -> Result<TaskRow, TaskError> {
        if let Some(ref name) = params.name {
            validate_name(name)?;
        }
        if let Some(ref due_date) = params.due_date {
            validate_due_date(due_date)?;
        }

        let now = Utc::now().to_rfc3339();
        // Partial update — only set fields that were provided
        let rows = sqlx::query(
            "UPDATE tasks SET \
             name = COALESCE(?, name), \
             due_date = COALESCE(?, due_date), \
             updated_at = ? \
             WHERE id = ?",
        )
        .bind(&params.name)
        .bind(&params.due_date)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        if rows == 0 {
            return Err(TaskError::NotFound(id));
        }
        self.get(id).await
    }

    /// Set the completion flag. Idempotent in both directions.
    pub async fn set_complete(&self, id: i64, complete: bool) -> Result<TaskRow, TaskError> {
        let now = Utc::now().to_rfc3339();
        let rows = sqlx::query("UPDATE tasks SET complete = ?, updated_at = ? WHERE id = ?")
            .bind(complete)
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if rows == 0 {
            return Err(TaskError::NotFound(id));
        }
        self.get(id).await
    }

    /// Record (or clear) the attachment filename for a task.
    pub async fn set_file_name(&self, id: i64, file_name: Option<&str>) -> Result<(), TaskError> {
        let now = Utc::now().to_rfc3339();
        let rows = sqlx::query("UPDATE tasks SET file_name = ?, updated_at = ? WHERE id = ?")
            .bind(file_name)
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if rows == 0 {
            return Err(TaskError::NotFound(id));
        }
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), TaskError> {
        let rows = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if rows == 0 {
            return Err(TaskError::NotFound(id));
        }
        Ok(())
    }

    /// Clear the entire collection unconditionally. Returns the number of
    /// rows removed.
    pub async fn delete_all(&self) -> Result<u64, TaskError> {
        let rows = sqlx::query("DELETE FROM tasks")
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqliteConnectOptions;
    use std::str::FromStr;

    async fn make_pool() -> SqlitePool {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(opts).await.unwrap();
        // Run the migration SQL directly
        let migration = include_str!("../storage/migrations/0001_tasks.sql");
        for stmt in migration.split(';') {
            let stmt = stmt.trim();
            if !stmt.is_empty() {
                sqlx::query(stmt).execute(&pool).await.unwrap();
            }
        }
        pool
    }

    fn storage(pool: SqlitePool) -> TaskStorage {
        TaskStorage::new(pool)
    }

    fn params(name: &str, due_date: &str) -> CreateTaskParams {
        CreateTaskParams {
            name: name.to_string(),
            due_date: due_date.to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_task() {
        let s = storage(make_pool().await);
        let before = s.count(TaskFilter::All).await.unwrap();
        let t = s.add(params("Buy milk", "2026-08-10")).await.unwrap();
        assert_eq!(t.name, "Buy milk");
        assert_eq!(t.due_date, "2026-08-10");
        assert!(!t.complete);
        assert!(t.file_name.is_none());
        assert_eq!(s.count(TaskFilter::All).await.unwrap(), before + 1);
    }

    #[tokio::test]
    async fn test_add_rejects_empty_name() {
        let s = storage(make_pool().await);
        let err = s.add(params("  ", "2026-08-10")).await.unwrap_err();
        assert!(matches!(err, TaskError::Validation(_)));
        assert_eq!(s.count(TaskFilter::All).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_rejects_bad_due_date() {
        let s = storage(make_pool().await);
        let err = s.add(params("Buy milk", "next tuesday")).await.unwrap_err();
        assert!(matches!(err, TaskError::Validation(_)));
        assert_eq!(s.count(TaskFilter::All).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_insertion_order() {
        let s = storage(make_pool().await);
        s.add(params("first", "2026-08-01")).await.unwrap();
        s.add(params("second", "2026-08-02")).await.unwrap();
        s.add(params("third", "2026-08-03")).await.unwrap();
        let tasks = s.list(TaskFilter::All).await.unwrap();
        let names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_incomplete_filter_excludes_completed() {
        let s = storage(make_pool().await);
        let a = s.add(params("done", "2026-08-01")).await.unwrap();
        s.add(params("open", "2026-08-02")).await.unwrap();
        s.set_complete(a.id, true).await.unwrap();

        let tasks = s.list(TaskFilter::Incomplete).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert!(tasks.iter().all(|t| !t.complete));
        assert_eq!(s.count(TaskFilter::Incomplete).await.unwrap(), 1);

        // The full list still has both
        assert_eq!(s.list(TaskFilter::All).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_toggle_complete_twice_restores_state() {
        let s = storage(make_pool().await);
        let t = s.add(params("flip me", "2026-08-01")).await.unwrap();
        assert!(!t.complete);
        let t = s.set_complete(t.id, !t.complete).await.unwrap();
        assert!(t.complete);
        let t = s.set_complete(t.id, !t.complete).await.unwrap();
        assert!(!t.complete);
    }

    #[tokio::test]
    async fn test_set_complete_is_idempotent() {
        let s = storage(make_pool().await);
        let t = s.add(params("task", "2026-08-01")).await.unwrap();
        let t = s.set_complete(t.id, true).await.unwrap();
        assert!(t.complete);
        let t = s.set_complete(t.id, true).await.unwrap();
        assert!(t.complete);
    }

    #[tokio::test]
    async fn test_update_renames_task() {
        let s = storage(make_pool().await);
        let t = s.add(params("Original", "2026-08-01")).await.unwrap();
        let updated = s
            .update(
                t.id,
                UpdateTaskParams {
                    name: Some("Updated".to_string()),
                    due_date: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Updated");
        // Unspecified fields are untouched
        assert_eq!(updated.due_date, "2026-08-01");
    }

    #[tokio::test]
    async fn test_update_missing_task() {
        let s = storage(make_pool().await);
        let err = s
            .update(
                999,
                UpdateTaskParams {
                    name: Some("nope".to_string()),
                    due_date: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::NotFound(999)));
    }

    #[tokio::test]
    async fn test_update_rejects_bad_due_date() {
        let s = storage(make_pool().await);
        let t = s.add(params("task", "2026-08-01")).await.unwrap();
        let err = s
            .update(
                t.id,
                UpdateTaskParams {
                    name: None,
                    due_date: Some("08/01/2026".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Validation(_)));
        // Original value survives the rejected update
        assert_eq!(s.get(t.id).await.unwrap().due_date, "2026-08-01");
    }

    #[tokio::test]
    async fn test_delete_task() {
        let s = storage(make_pool().await);
        let t = s.add(params("to delete", "2026-08-01")).await.unwrap();
        s.delete(t.id).await.unwrap();
        assert!(matches!(
            s.get(t.id).await.unwrap_err(),
            TaskError::NotFound(_)
        ));
        assert!(s
            .list(TaskFilter::All)
            .await
            .unwrap()
            .iter()
            .all(|r| r.id != t.id));
        // Deleting again reports not found
        assert!(matches!(
            s.delete(t.id).await.unwrap_err(),
            TaskError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_delete_all() {
        let s = storage(make_pool().await);
        s.add(params("a", "2026-08-01")).await.unwrap();
        s.add(params("b", "2026-08-02")).await.unwrap();
        let removed = s.delete_all().await.unwrap();
        assert_eq!(removed, 2);
        assert!(s.list(TaskFilter::All).await.unwrap().is_empty());
        // Empty collection is fine to clear again
        assert_eq!(s.delete_all().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bulk_add() {
        let s = storage(make_pool().await);
        let entries = vec![
            BulkTaskEntry {
                name: "one".to_string(),
                due_date: "2026-08-01".to_string(),
                complete: false,
            },
            BulkTaskEntry {
                name: "two".to_string(),
                due_date: "2026-08-02".to_string(),
                complete: true,
            },
        ];
        let count = s.bulk_add(&entries).await.unwrap();
        assert_eq!(count, 2);
        let tasks = s.list(TaskFilter::All).await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks[1].complete);
    }

    #[tokio::test]
    async fn test_bulk_add_is_all_or_nothing() {
        let s = storage(make_pool().await);
        let entries = vec![
            BulkTaskEntry {
                name: "ok".to_string(),
                due_date: "2026-08-01".to_string(),
                complete: false,
            },
            BulkTaskEntry {
                name: "bad".to_string(),
                due_date: "not a date".to_string(),
                complete: false,
            },
        ];
        assert!(matches!(
            s.bulk_add(&entries).await.unwrap_err(),
            TaskError::Validation(_)
        ));
        assert_eq!(s.count(TaskFilter::All).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_set_file_name() {
        let s = storage(make_pool().await);
        let t = s.add(params("with file", "2026-08-01")).await.unwrap();
        s.set_file_name(t.id, Some("notes.txt")).await.unwrap();
        assert_eq!(
            s.get(t.id).await.unwrap().file_name.as_deref(),
            Some("notes.txt")
        );
        s.set_file_name(t.id, None).await.unwrap();
        assert!(s.get(t.id).await.unwrap().file_name.is_none());
        assert!(matches!(
            s.set_file_name(999, Some("x")).await.unwrap_err(),
            TaskError::NotFound(999)
        ));
    }
}
