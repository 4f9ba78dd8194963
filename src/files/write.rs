use super::{EntryKind, FileOps};
use crate::errors::{AppError, AppResult};
use tokio::{
    fs,
    io::{AsyncRead, AsyncWriteExt},
};

impl FileOps {
    /// Directories are created with all missing ancestors and succeed if
    /// already present. Files get their parent chain created and are
    /// overwritten if they exist.
    pub async fn create(&self, logical: &str, kind: EntryKind, content: Option<&str>) -> AppResult<()> {
        let path = self.sandbox.resolve(logical)?;
        match kind {
            EntryKind::Directory => fs::create_dir_all(&path).await.map_err(io_err),
            EntryKind::File => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).await.map_err(io_err)?;
                }
                fs::write(&path, content.unwrap_or_default()).await.map_err(io_err)
            }
        }
    }

    /// Removes a file, or a directory together with everything under it.
    pub async fn delete(&self, logical: &str) -> AppResult<()> {
        let path = self.sandbox.resolve(logical)?;
        if self.sandbox.is_root(&path) {
            return Err(AppError::BadRequest("refusing to delete the root directory".into()));
        }
        let meta = fs::symlink_metadata(&path).await.map_err(io_err)?;
        if meta.is_dir() {
            fs::remove_dir_all(&path).await.map_err(io_err)
        } else {
            fs::remove_file(&path).await.map_err(io_err)
        }
    }

    /// Streams `body` into `dir/file_name`, replacing any existing file.
    ///
    /// Unlike [`FileOps::create`], the destination directory must already
    /// exist; no ancestors are created.
    pub async fn upload<R>(&self, dir: &str, file_name: &str, body: &mut R) -> AppResult<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let logical = format!("{}/{}", dir.trim_end_matches('/'), file_name);
        let path = self.sandbox.resolve(&logical)?;
        let mut file = fs::File::create(&path).await.map_err(io_err)?;
        let written = tokio::io::copy(body, &mut file).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;
        Ok(written)
    }
}

// Mutation failures all surface as upstream errors, missing targets included.
fn io_err(err: std::io::Error) -> AppError {
    AppError::Io(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(tmp: &tempfile::TempDir) -> FileOps {
        FileOps::new(dunce::canonicalize(tmp.path()).unwrap())
    }

    #[tokio::test]
    async fn create_file_then_read_back() {
        let tmp = tempfile::tempdir().unwrap();
        let ops = ops(&tmp);
        ops.create("/notes/today/hello.txt", EntryKind::File, Some("hello")).await.unwrap();
        let got = ops.read_content("/notes/today/hello.txt").await.unwrap();
        assert_eq!(got.content, "hello");
        assert_eq!(got.size, 5);
    }

    #[tokio::test]
    async fn create_file_without_content_is_empty_and_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.txt"), "old").unwrap();
        ops(&tmp).create("a.txt", EntryKind::File, None).await.unwrap();
        assert_eq!(std::fs::read(tmp.path().join("a.txt")).unwrap(), b"");
    }

    #[tokio::test]
    async fn create_directory_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let ops = ops(&tmp);
        ops.create("/x/y/z", EntryKind::Directory, None).await.unwrap();
        ops.create("/x/y/z", EntryKind::Directory, None).await.unwrap();
        assert!(tmp.path().join("x/y/z").is_dir());
    }

    #[tokio::test]
    async fn created_then_deleted_directory_disappears_from_parent() {
        let tmp = tempfile::tempdir().unwrap();
        let ops = ops(&tmp);
        ops.create("/parent/child", EntryKind::Directory, None).await.unwrap();
        ops.create("/parent/child/inner.txt", EntryKind::File, Some("x")).await.unwrap();
        ops.delete("/parent/child").await.unwrap();
        let items = ops.list("/parent").await.unwrap();
        assert!(items.iter().all(|e| e.name != "child"));
    }

    #[tokio::test]
    async fn delete_file_and_missing_target() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("gone.txt"), "x").unwrap();
        let ops = ops(&tmp);
        ops.delete("gone.txt").await.unwrap();
        assert!(!tmp.path().join("gone.txt").exists());
        assert!(matches!(ops.delete("gone.txt").await, Err(AppError::Io(_))));
    }

    #[tokio::test]
    async fn root_cannot_be_deleted() {
        let tmp = tempfile::tempdir().unwrap();
        for p in ["/", "", "a/.."] {
            assert!(matches!(ops(&tmp).delete(p).await, Err(AppError::BadRequest(_))), "input {p:?}");
        }
        assert!(tmp.path().is_dir());
    }

    #[tokio::test]
    async fn mutations_refuse_escapes() {
        let tmp = tempfile::tempdir().unwrap();
        let ops = ops(&tmp);
        assert!(matches!(ops.create("../evil", EntryKind::Directory, None).await, Err(AppError::PathEscape)));
        assert!(matches!(ops.delete("/../../tmp").await, Err(AppError::PathEscape)));
        let mut body: &[u8] = b"x";
        assert!(matches!(ops.upload("/", "../evil.txt", &mut body).await, Err(AppError::PathEscape)));
    }

    #[tokio::test]
    async fn upload_lands_in_existing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let ops = ops(&tmp);
        ops.create("/docs", EntryKind::Directory, None).await.unwrap();
        let mut body: &[u8] = b"abc";
        let n = ops.upload("/docs", "report.txt", &mut body).await.unwrap();
        assert_eq!(n, 3);
        let items = ops.list("/docs").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "report.txt");
        assert!(!items[0].is_directory);
        assert_eq!(items[0].size, 3);
    }

    #[tokio::test]
    async fn upload_does_not_create_missing_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let mut body: &[u8] = b"abc";
        let err = ops(&tmp).upload("/nowhere", "f.txt", &mut body).await.unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
        assert!(!tmp.path().join("nowhere").exists());
    }
}
