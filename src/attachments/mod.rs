// SPDX-License-Identifier: MIT
//! Filesystem-backed attachment storage.
//!
//! Each task holds at most one attachment, stored at
//! `{data_dir}/attachments/task_{id}/{file_name}`. Uploading replaces any
//! prior file for the task.

use std::path::{Path, PathBuf};

use crate::tasks::TaskError;

pub struct AttachmentStore {
    root: PathBuf,
}

/// Reject filenames that are empty or could escape the task directory.
/// Returns the validated name unchanged.
pub fn sanitize_file_name(name: &str) -> Result<&str, TaskError> {
    if name.trim().is_empty() {
        return Err(TaskError::Validation("attachment filename is empty".into()));
    }
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(TaskError::Validation(format!(
            "invalid attachment filename: {name:?}"
        )));
    }
    Ok(name)
}

impl AttachmentStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            root: data_dir.join("attachments"),
        }
    }

    fn task_dir(&self, task_id: i64) -> PathBuf {
        self.root.join(format!("task_{task_id}"))
    }

    /// Store the attachment for a task, replacing any prior file.
    pub async fn save(&self, task_id: i64, file_name: &str, bytes: &[u8]) -> Result<(), TaskError> {
        let file_name = sanitize_file_name(file_name)?;
        let dir = self.task_dir(task_id);
        // One attachment per task — clear the directory before writing.
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(file_name), bytes).await?;
        Ok(())
    }

    /// Read back the stored bytes for a task's attachment.
    pub async fn load(&self, task_id: i64, file_name: &str) -> Result<Vec<u8>, TaskError> {
        let file_name = sanitize_file_name(file_name)?;
        match tokio::fs::read(self.task_dir(task_id).join(file_name)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(TaskError::AttachmentMissing(task_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a task's attachment directory. No-op if the task has none.
    pub async fn remove(&self, task_id: i64) -> Result<(), TaskError> {
        match tokio::fs::remove_dir_all(self.task_dir(task_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete every stored attachment.
    pub async fn remove_all(&self) -> Result<(), TaskError> {
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> AttachmentStore {
        AttachmentStore::new(dir.path())
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        let payload = b"quarterly report\x00\x01\x02";
        s.save(1, "report.pdf", payload).await.unwrap();
        let loaded = s.load(1, "report.pdf").await.unwrap();
        assert_eq!(loaded, payload);
    }

    #[tokio::test]
    async fn test_save_replaces_prior_attachment() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        s.save(1, "old.txt", b"old").await.unwrap();
        s.save(1, "new.txt", b"new").await.unwrap();
        assert_eq!(s.load(1, "new.txt").await.unwrap(), b"new");
        // The previous file is gone, not orphaned alongside the new one
        assert!(matches!(
            s.load(1, "old.txt").await.unwrap_err(),
            TaskError::AttachmentMissing(1)
        ));
    }

    #[tokio::test]
    async fn test_load_missing_attachment() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        assert!(matches!(
            s.load(7, "nothing.txt").await.unwrap_err(),
            TaskError::AttachmentMissing(7)
        ));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        s.save(1, "a.txt", b"a").await.unwrap();
        s.remove(1).await.unwrap();
        assert!(matches!(
            s.load(1, "a.txt").await.unwrap_err(),
            TaskError::AttachmentMissing(1)
        ));
        // Removing again is fine
        s.remove(1).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_all() {
        let dir = TempDir::new().unwrap();
        let s = store(&dir);
        s.save(1, "a.txt", b"a").await.unwrap();
        s.save(2, "b.txt", b"b").await.unwrap();
        s.remove_all().await.unwrap();
        assert!(s.load(1, "a.txt").await.is_err());
        assert!(s.load(2, "b.txt").await.is_err());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert!(sanitize_file_name("notes.txt").is_ok());
        assert!(sanitize_file_name("").is_err());
        assert!(sanitize_file_name("   ").is_err());
        assert!(sanitize_file_name("../escape").is_err());
        assert!(sanitize_file_name("a/b.txt").is_err());
        assert!(sanitize_file_name("a\\b.txt").is_err());
        assert!(sanitize_file_name("..").is_err());
    }
}
