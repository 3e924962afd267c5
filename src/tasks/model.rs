// SPDX-License-Identifier: MIT
//! Task data model types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Due dates are ISO calendar dates, the format produced by `<input type="date">`.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// A single to-do item as stored in the `tasks` table.
///
/// `file_name` is the original filename of the task's attachment; `None`
/// means the task has no attachment and no download target.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskRow {
    pub id: i64,
    pub name: String,
    pub due_date: String,
    pub complete: bool,
    pub file_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Parameters for creating a task. New tasks always start incomplete.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskParams {
    pub name: String,
    pub due_date: String,
}

/// Partial update — only provided fields are changed.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskParams {
    pub name: Option<String>,
    pub due_date: Option<String>,
}

/// One entry of a bulk insert batch. Unlike `CreateTaskParams`, a bulk entry
/// may arrive pre-completed (import of an existing list).
#[derive(Debug, Clone, Deserialize)]
pub struct BulkTaskEntry {
    pub name: String,
    pub due_date: String,
    #[serde(default)]
    pub complete: bool,
}

/// List-view filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    /// Exclude tasks already marked complete.
    Incomplete,
}

/// Errors returned by the task store and attachment store.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("task {0} not found")]
    NotFound(i64),
    #[error("{0}")]
    Validation(String),
    #[error("task {0} has no attachment")]
    AttachmentMissing(i64),
    #[error("database query timed out after {0}s")]
    Timeout(u64),
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Validate a due date string. Rejects anything `chrono` cannot parse as a
/// real calendar date (e.g. `2026-02-30`).
pub fn validate_due_date(due_date: &str) -> Result<(), TaskError> {
    NaiveDate::parse_from_str(due_date, DUE_DATE_FORMAT)
        .map(|_| ())
        .map_err(|_| TaskError::Validation(format!("invalid due date: {due_date:?}")))
}

/// Validate a task name: required, non-empty after trimming.
pub fn validate_name(name: &str) -> Result<(), TaskError> {
    if name.trim().is_empty() {
        return Err(TaskError::Validation("task name must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_due_date() {
        assert!(validate_due_date("2026-08-04").is_ok());
        assert!(validate_due_date("2026-02-30").is_err());
        assert!(validate_due_date("tomorrow").is_err());
        assert!(validate_due_date("").is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Buy milk").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
    }
}
