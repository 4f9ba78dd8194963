use super::{FileContent, FileOps, MAX_PREVIEW_BYTES};
use crate::errors::{AppError, AppResult};
use tokio::fs;

/// An opened file ready to be streamed to the client.
#[derive(Debug)]
pub struct Download {
    pub file: fs::File,
    pub size: u64,
    /// Final path segment, used for the Content-Disposition filename.
    pub file_name: String,
    pub mime: mime_guess::Mime,
}

impl FileOps {
    /// Text preview. The size check happens on metadata, before any read.
    pub async fn read_content(&self, logical: &str) -> AppResult<FileContent> {
        let path = self.sandbox.resolve(logical)?;
        let meta = fs::metadata(&path).await.map_err(AppError::from_io)?;
        let size = meta.len();
        if size > MAX_PREVIEW_BYTES {
            return Err(AppError::TooLarge { size });
        }
        let bytes = fs::read(&path).await.map_err(AppError::from_io)?;
        Ok(FileContent { content: String::from_utf8_lossy(&bytes).into_owned(), size })
    }

    pub async fn open_download(&self, logical: &str) -> AppResult<Download> {
        let path = self.sandbox.resolve(logical)?;
        let meta = fs::metadata(&path).await.map_err(AppError::from_io)?;
        if meta.is_dir() {
            return Err(AppError::BadRequest("path is a directory".into()));
        }
        let file = fs::File::open(&path).await.map_err(AppError::from_io)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "download".to_string());
        let mime = mime_guess::from_path(&path).first_or_octet_stream();
        Ok(Download { file, size: meta.len(), file_name, mime })
    }
}
