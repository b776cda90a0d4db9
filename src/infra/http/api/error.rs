use crate::application::error::{AppError, ErrorReport};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const NOT_FOUND: &str = "not_found";
    pub const PAYLOAD: &str = "invalid_payload";
    pub const SCRATCH: &str = "scratch_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    chain: Vec<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
            chain: Vec::new(),
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let report = ErrorReport::from_error("infra::http::api", err.status_code(), &err);
        Self {
            status: err.status_code(),
            code: err.code(),
            message: err.presentation_message(),
            hint: err.detail(),
            chain: report.messages,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            codes::PAYLOAD,
            "Invalid JSON body",
            Some(rejection.body_text()),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let summary = format!(
            "{}: {}",
            self.code,
            self.hint.as_deref().unwrap_or(self.message)
        );
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        // Attach a structured report so shared logging middleware can emit rich diagnostics.
        let mut report = ErrorReport::from_message("infra::http::api", self.status, summary);
        report.messages.extend(self.chain);
        report.attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_errors_map_to_envelope_fields() {
        let err = ApiError::from(AppError::not_found("plant"));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code, codes::NOT_FOUND);
        assert_eq!(err.message, "Plant not found");
        assert!(err.hint.is_none());

        let err = ApiError::from(AppError::validation("Image file is required"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.hint.as_deref(), Some("Image file is required"));
    }

    #[test]
    fn response_carries_error_report() {
        let response = ApiError::bad_request("Invalid id", Some("abc".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("error report");
        assert_eq!(report.messages[0], "bad_request: abc");
    }

    #[test]
    fn upstream_failure_keeps_detail_in_report_only() {
        use crate::application::upstream::UpstreamError;

        let err = ApiError::from(AppError::from(UpstreamError::upload(
            "status 401: Invalid Signature",
        )));
        assert!(err.hint.is_none());

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("error report");
        assert_eq!(report.messages[0], "upload_error: Image upload failed");
        assert!(
            report
                .messages
                .iter()
                .any(|message| message.contains("Invalid Signature"))
        );
    }
}
