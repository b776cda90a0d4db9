//! Contracts for the third-party services the write paths depend on.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("image upload failed: {0}")]
    Upload(String),
    #[error("diagnosis request failed: {0}")]
    Diagnosis(String),
}

impl UpstreamError {
    pub fn upload(err: impl std::fmt::Display) -> Self {
        Self::Upload(err.to_string())
    }

    pub fn diagnosis(err: impl std::fmt::Display) -> Self {
        Self::Diagnosis(err.to_string())
    }
}

/// Result of a successful object-storage upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub secure_url: String,
}

/// An image received from a client and spooled to local disk.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub path: PathBuf,
    pub content_type: String,
    pub bytes: Bytes,
}

#[async_trait]
pub trait ImageUploader: Send + Sync {
    async fn upload(&self, local_path: &Path) -> Result<UploadedImage, UpstreamError>;
}

#[async_trait]
pub trait PlantDiagnoser: Send + Sync {
    /// Produce a free-text diagnosis for `image`, using `context` as supporting notes.
    async fn diagnose(&self, context: &str, image: &ImageFile) -> Result<String, UpstreamError>;
}
