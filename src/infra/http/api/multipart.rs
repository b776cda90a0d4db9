//! Multipart form collection shared by the create endpoints.

use std::collections::HashMap;

use axum::extract::Multipart;
use axum::http::StatusCode;

use crate::application::upstream::ImageFile;
use crate::infra::uploads::ScratchStorage;

use super::error::{ApiError, codes};

/// Text fields plus at most one spooled file.
#[derive(Debug, Default)]
pub(super) struct FormPayload {
    fields: HashMap<String, String>,
    pub file: Option<ImageFile>,
}

impl FormPayload {
    pub fn take(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }
}

/// Drain `multipart`, spooling the first part that carries a file name into
/// scratch storage. Later file parts are ignored.
pub(super) async fn collect(
    scratch: &ScratchStorage,
    mut multipart: Multipart,
) -> Result<FormPayload, ApiError> {
    let mut payload = FormPayload::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                discard(scratch, &payload).await;
                return Err(ApiError::new(
                    err.status(),
                    codes::PAYLOAD,
                    "Invalid multipart payload",
                    Some(err.body_text()),
                ));
            }
        };

        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if let Some(file_name) = field.file_name().map(str::to_string) {
            let content_type = field.content_type().map(str::to_string);
            let data = match field.bytes().await {
                Ok(data) => data,
                Err(err) => {
                    discard(scratch, &payload).await;
                    return Err(ApiError::new(
                        err.status(),
                        codes::PAYLOAD,
                        "Failed to read uploaded file",
                        Some(err.body_text()),
                    ));
                }
            };
            if payload.file.is_some() || data.is_empty() {
                continue;
            }
            let image = scratch
                .store(&file_name, content_type.as_deref(), data)
                .await
                .map_err(|err| {
                    ApiError::new(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        codes::SCRATCH,
                        "Failed to store uploaded file",
                        Some(err.to_string()),
                    )
                })?;
            payload.file = Some(image);
            continue;
        }

        match field.text().await {
            Ok(value) => {
                payload.fields.insert(name, value);
            }
            Err(err) => {
                discard(scratch, &payload).await;
                return Err(ApiError::bad_request(
                    "Invalid form field",
                    Some(err.body_text()),
                ));
            }
        }
    }

    Ok(payload)
}

async fn discard(scratch: &ScratchStorage, payload: &FormPayload) {
    if let Some(file) = &payload.file {
        scratch.discard_quietly(&file.path).await;
    }
}
