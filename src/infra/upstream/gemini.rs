//! Plant diagnosis through a Gemini `generateContent` endpoint.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::application::upstream::{ImageFile, PlantDiagnoser, UpstreamError};
use crate::config::DiagnosisSettings;

use super::user_agent;

const INSTRUCTIONS: &str = "You are a plant health assistant. Examine the photo and \
     describe visible problems, their likely causes and recommended care. \
     Supporting notes about the plant follow.";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 2],
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text { text: String },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct GeminiDiagnoser {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl GeminiDiagnoser {
    pub fn new(settings: &DiagnosisSettings) -> Result<Self, UpstreamError> {
        let endpoint = settings
            .base_url
            .join(&format!("v1beta/models/{}:generateContent", settings.model))
            .map_err(|err| {
                UpstreamError::diagnosis(format!("invalid diagnosis endpoint: {err}"))
            })?;
        let client = Client::builder()
            .user_agent(user_agent())
            .build()
            .map_err(UpstreamError::diagnosis)?;

        Ok(Self {
            client,
            endpoint,
            api_key: settings.api_key.clone(),
        })
    }
}

fn build_request<'a>(context: &str, image: &'a ImageFile) -> GenerateRequest<'a> {
    GenerateRequest {
        contents: [Content {
            parts: [
                RequestPart::Text {
                    text: format!("{INSTRUCTIONS}\n\n{context}"),
                },
                RequestPart::InlineData {
                    inline_data: InlineData {
                        mime_type: &image.content_type,
                        data: STANDARD.encode(&image.bytes),
                    },
                },
            ],
        }],
    }
}

fn extract_text(response: GenerateResponse) -> Option<String> {
    let text = response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect::<Vec<_>>()
        .join("");
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[async_trait]
impl PlantDiagnoser for GeminiDiagnoser {
    async fn diagnose(&self, context: &str, image: &ImageFile) -> Result<String, UpstreamError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&build_request(context, image))
            .send()
            .await
            .map_err(UpstreamError::diagnosis)?;
        let status = response.status();
        let body: GenerateResponse = response.json().await.map_err(|err| {
            UpstreamError::diagnosis(format!("unreadable diagnosis response ({status}): {err}"))
        })?;

        if !status.is_success() {
            let message = body
                .error
                .map(|error| error.message)
                .unwrap_or_else(|| "no error message".to_string());
            return Err(UpstreamError::diagnosis(format!(
                "status {status}: {message}"
            )));
        }

        let diagnosis = extract_text(body)
            .ok_or_else(|| UpstreamError::diagnosis("response contained no text"))?;
        info!(
            target = "plantlog::infra::upstream::gemini",
            chars = diagnosis.len(),
            "Diagnosis received"
        );
        Ok(diagnosis)
    }
}
