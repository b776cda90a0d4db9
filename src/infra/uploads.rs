//! Scratch storage for multipart images awaiting upload.
//!
//! Incoming files are written under a scratch root so the object-storage
//! client can read them from a local path, then discarded once the request
//! has finished with them.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use slug::slugify;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use tracing::warn;
use uuid::Uuid;

use crate::application::upstream::ImageFile;

#[derive(Debug, Error)]
pub enum ScratchError {
    #[error("path is outside the scratch directory")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("uploaded file is empty")]
    EmptyPayload,
}

/// Filesystem-backed scratch directory.
#[derive(Debug)]
pub struct ScratchStorage {
    root: PathBuf,
}

impl ScratchStorage {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `data` to a fresh scratch file. When the client sent no content
    /// type one is guessed from the file name.
    pub async fn store(
        &self,
        original_name: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> Result<ImageFile, ScratchError> {
        if data.is_empty() {
            return Err(ScratchError::EmptyPayload);
        }

        let path = self
            .root
            .join(format!("{}-{}", Uuid::new_v4(), sanitize_filename(original_name)));
        let mut file = fs::File::create(&path).await?;
        if let Err(err) = file.write_all(&data).await {
            drop(file);
            let _ = fs::remove_file(&path).await;
            return Err(err.into());
        }
        file.flush().await?;

        let content_type = content_type
            .map(str::to_string)
            .unwrap_or_else(|| {
                mime_guess::from_path(original_name)
                    .first_or_octet_stream()
                    .to_string()
            });

        Ok(ImageFile {
            path,
            content_type,
            bytes: data,
        })
    }

    /// Remove a scratch file. Missing files are treated as success.
    pub async fn discard(&self, path: &Path) -> Result<(), ScratchError> {
        if !path.starts_with(&self.root) {
            return Err(ScratchError::InvalidPath);
        }
        match fs::remove_file(path).await {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ScratchError::Io(err)),
        }
    }

    /// Discard and log instead of failing; used once a request no longer
    /// needs its file.
    pub async fn discard_quietly(&self, path: &Path) {
        if let Err(err) = self.discard(path).await {
            warn!(
                target = "plantlog::infra::uploads",
                path = %path.display(),
                error = %err,
                "Failed to remove scratch file"
            );
        }
    }
}

fn sanitize_filename(original: &str) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("upload");
    let mut base = slugify(stem);
    if base.is_empty() {
        base = "upload".to_string();
    }

    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.trim_matches('.').to_ascii_lowercase())
        .filter(|value| !value.is_empty());

    match extension {
        Some(ext) => format!("{base}.{ext}"),
        None => base,
    }
}
