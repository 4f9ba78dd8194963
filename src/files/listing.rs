use super::{DirectoryEntry, FileOps};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use tokio::fs;
use tokio_stream::{wrappers::ReadDirStream, StreamExt};

impl FileOps {
    /// Immediate children of `logical`, directories first.
    pub async fn list(&self, logical: &str) -> AppResult<Vec<DirectoryEntry>> {
        let dir = self.sandbox.resolve(logical)?;
        fs::metadata(&dir).await.map_err(AppError::from_io)?;

        let read_dir = fs::read_dir(&dir).await.map_err(AppError::from_io)?;
        let mut children = ReadDirStream::new(read_dir);
        let mut items = Vec::new();
        while let Some(child) = children.next().await {
            let child = child.map_err(|e| AppError::Io(e.to_string()))?;
            let name = child.file_name().to_string_lossy().into_owned();
            // follows symlinks, so a dangling link lands in the fallback arm
            let entry = match fs::metadata(child.path()).await {
                Ok(meta) => DirectoryEntry {
                    name,
                    is_directory: meta.is_dir(),
                    size: if meta.is_dir() { 0 } else { meta.len() },
                    modified: meta.modified().map(DateTime::<Utc>::from).unwrap_or_else(|_| Utc::now()),
                },
                Err(err) => {
                    let is_directory = child.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
                    tracing::debug!(entry = %name, error = %err, "stat failed, using placeholder entry");
                    DirectoryEntry::unreadable(name, is_directory)
                }
            };
            items.push(entry);
        }
        items.sort_by(compare_entries);
        Ok(items)
    }
}

/// Directories before files; then case-insensitive name, then exact name.
pub fn compare_entries(a: &DirectoryEntry, b: &DirectoryEntry) -> Ordering {
    b.is_directory
        .cmp(&a.is_directory)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
}
