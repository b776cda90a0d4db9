use std::error::Error as StdError;

use axum::{http::StatusCode, response::Response};
use thiserror::Error;

use crate::{
    application::{repos::RepoError, upstream::UpstreamError},
    cache::CacheError,
    domain::error::DomainError,
    infra::error::InfraError,
};

#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    pub fn not_found(entity: &'static str) -> Self {
        Self::Domain(DomainError::not_found(entity))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Domain(DomainError::NotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Domain(DomainError::Validation { .. })
            | AppError::Validation(_)
            | AppError::Repo(RepoError::InvalidInput { .. }) => StatusCode::BAD_REQUEST,
            AppError::Repo(_)
            | AppError::Infra(_)
            | AppError::Cache(_)
            | AppError::Upstream(_)
            | AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for the JSON error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Domain(DomainError::NotFound { .. }) => "not_found",
            AppError::Domain(DomainError::Validation { .. }) | AppError::Validation(_) => {
                "bad_request"
            }
            AppError::Repo(RepoError::InvalidInput { .. }) => "invalid_input",
            AppError::Repo(RepoError::Timeout) => "db_timeout",
            AppError::Repo(_) => "repo_error",
            AppError::Cache(_) => "cache_error",
            AppError::Upstream(UpstreamError::Upload(_)) => "upload_error",
            AppError::Upstream(UpstreamError::Diagnosis(_)) => "diagnosis_error",
            AppError::Infra(_) | AppError::Unexpected(_) => "internal_error",
        }
    }

    pub fn presentation_message(&self) -> &'static str {
        match self {
            AppError::Domain(DomainError::NotFound { entity }) => match *entity {
                "plant" => "Plant not found",
                "health log" => "Health log not found",
                _ => "Resource not found",
            },
            AppError::Domain(DomainError::Validation { .. })
            | AppError::Validation(_)
            | AppError::Repo(RepoError::InvalidInput { .. }) => "Request could not be processed",
            AppError::Repo(RepoError::Timeout) => "Database timeout",
            AppError::Repo(_) => "Persistence error",
            AppError::Cache(_) => "Cache unavailable",
            AppError::Upstream(UpstreamError::Upload(_)) => "Image upload failed",
            AppError::Upstream(UpstreamError::Diagnosis(_)) => "Diagnosis failed",
            AppError::Infra(_) | AppError::Unexpected(_) => "Unexpected error occurred",
        }
    }

    /// Detail surfaced to clients as the envelope hint. Server-side failures
    /// carry none; their chain only reaches the logs.
    pub fn detail(&self) -> Option<String> {
        match self {
            AppError::Domain(DomainError::Validation { message })
            | AppError::Validation(message)
            | AppError::Repo(RepoError::InvalidInput { message }) => Some(message.clone()),
            _ => None,
        }
    }
}
