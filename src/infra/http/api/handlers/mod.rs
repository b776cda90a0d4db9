//! JSON handlers for the plant and health-log endpoints.

pub mod health_logs;
pub mod plants;

use serde::Deserialize;
use uuid::Uuid;

use crate::application::pagination::ListOptions;

use super::error::ApiError;

/// Query string accepted by every listing endpoint. Values are kept raw so
/// malformed numbers fall back to defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
}

impl ListQuery {
    pub fn options(&self) -> ListOptions {
        ListOptions::from_query(
            self.page.as_deref(),
            self.limit.as_deref(),
            self.sort_field.as_deref(),
            self.sort_order.as_deref(),
        )
    }
}

pub(super) fn parse_id(raw: &str, message: &'static str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|err| ApiError::bad_request(message, Some(err.to_string())))
}
