use std::io::{self, Write};
use std::path::{Path, PathBuf};

use actix_multipart::Multipart;
use actix_web::web::{self, Bytes};
use futures_util::StreamExt;
use tempfile::{Builder, NamedTempFile};

use crate::error::PredictError;

/// Form field carrying the image.
pub const FILE_FIELD: &str = "file";

/// An uploaded file on disk, owned by one request.
///
/// The file is removed when the guard is dropped, whichever way the request ends.
/// A failed removal is logged and otherwise ignored.
pub struct TempUpload {
    file: Option<NamedTempFile>,
    path: PathBuf,
}

impl TempUpload {
    pub async fn create_in(dir: PathBuf) -> Result<Self, PredictError> {
        let file = web::block(move || Builder::new().prefix("upload-").tempfile_in(dir)).await??;
        let path = file.path().to_path_buf();
        tracing::debug!(path = %path.display(), "created upload file");
        Ok(TempUpload {
            file: Some(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(mut self, chunk: Bytes) -> Result<Self, PredictError> {
        let upload = web::block(move || -> io::Result<Self> {
            if let Some(file) = self.file.as_mut() {
                file.write_all(&chunk)?;
            }
            Ok(self)
        })
        .await??;
        Ok(upload)
    }

    pub async fn read(&self) -> Result<Vec<u8>, PredictError> {
        let path = self.path.clone();
        let bytes = web::block(move || std::fs::read(path)).await??;
        Ok(bytes)
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            match file.close() {
                Ok(()) => tracing::debug!(path = %self.path.display(), "removed upload file"),
                Err(e) => tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to remove upload file"
                ),
            }
        }
    }
}

/// Streams the `file` field of a multipart body into a fresh temp file under `dir`.
///
/// Other fields are read and discarded. Nothing touches the disk unless a `file`
/// field is present.
pub async fn receive(mut payload: Multipart, dir: &Path) -> Result<TempUpload, PredictError> {
    let mut upload: Option<TempUpload> = None;

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let wanted = upload.is_none()
            && field.content_disposition().get_name() == Some(FILE_FIELD);

        if !wanted {
            while let Some(chunk) = field.next().await {
                chunk?;
            }
            continue;
        }

        let mut file = TempUpload::create_in(dir.to_path_buf()).await?;
        while let Some(chunk) = field.next().await {
            file = file.append(chunk?).await?;
        }
        upload = Some(file);
    }

    upload.ok_or(PredictError::UploadMissing)
}
