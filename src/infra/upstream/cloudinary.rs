//! Signed uploads to a Cloudinary-compatible image API.

use std::path::Path;

use async_trait::async_trait;
use reqwest::{
    Client, Url,
    multipart::{Form, Part},
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use tokio::fs;
use tracing::info;

use crate::application::upstream::{ImageUploader, UploadedImage, UpstreamError};
use crate::config::ObjectStorageSettings;

use super::user_agent;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct CloudinaryUploader {
    client: Client,
    endpoint: Url,
    api_key: String,
    api_secret: String,
    folder: Option<String>,
}

impl CloudinaryUploader {
    pub fn new(settings: &ObjectStorageSettings) -> Result<Self, UpstreamError> {
        let endpoint = settings
            .base_url
            .join(&format!("v1_1/{}/image/upload", settings.cloud_name))
            .map_err(|err| UpstreamError::upload(format!("invalid upload endpoint: {err}")))?;
        let client = Client::builder()
            .user_agent(user_agent())
            .build()
            .map_err(UpstreamError::upload)?;

        Ok(Self {
            client,
            endpoint,
            api_key: settings.api_key.clone(),
            api_secret: settings.api_secret.clone(),
            folder: settings.folder.clone(),
        })
    }

    fn signed_params(&self, timestamp: i64) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(2);
        if let Some(folder) = &self.folder {
            params.push(("folder", folder.clone()));
        }
        params.push(("timestamp", timestamp.to_string()));
        params
    }
}

/// SHA-256 over the alphabetically sorted `key=value` pairs joined by `&`,
/// followed by the API secret.
pub(crate) fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    let digest = Sha256::digest(format!("{joined}{api_secret}").as_bytes());
    hex::encode(&digest[..])
}

#[async_trait]
impl ImageUploader for CloudinaryUploader {
    async fn upload(&self, local_path: &Path) -> Result<UploadedImage, UpstreamError> {
        let data = fs::read(local_path)
            .await
            .map_err(|err| UpstreamError::upload(format!("cannot read scratch file: {err}")))?;
        let file_name = local_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();

        let params = self.signed_params(OffsetDateTime::now_utc().unix_timestamp());
        let signature = sign(&params, &self.api_secret);

        let mut form = Form::new()
            .part("file", Part::bytes(data).file_name(file_name))
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(UpstreamError::upload)?;
        let status = response.status();
        let body: UploadResponse = response.json().await.map_err(|err| {
            UpstreamError::upload(format!("unreadable upload response ({status}): {err}"))
        })?;

        if !status.is_success() {
            let message = body
                .error
                .map(|error| error.message)
                .unwrap_or_else(|| "no error message".to_string());
            return Err(UpstreamError::upload(format!("status {status}: {message}")));
        }

        let secure_url = body
            .secure_url
            .ok_or_else(|| UpstreamError::upload("response did not include secure_url"))?;
        info!(
            target = "plantlog::infra::upstream::cloudinary",
            url = %secure_url,
            "Image uploaded"
        );
        Ok(UploadedImage { secure_url })
    }
}

#[cfg(test)]
mod tests {
    use httpmock::MockServer;

    use super::*;

    fn settings(server: &MockServer) -> ObjectStorageSettings {
        ObjectStorageSettings {
            base_url: Url::parse(&server.base_url()).expect("url"),
            cloud_name: "demo".to_string(),
            api_key: "key-1".to_string(),
            api_secret: "abcd".to_string(),
            folder: Some("plants".to_string()),
        }
    }

    fn scratch_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("tmp file");
        std::io::Write::write_all(&mut file, b"jpeg").expect("write tmp");
        file
    }

    #[test]
    fn signature_sorts_params_and_appends_secret() {
        let params = vec![
            ("timestamp", "1700000000".to_string()),
            ("folder", "plants".to_string()),
        ];
        assert_eq!(
            sign(&params, "abcd"),
            "5f1529348d87614cac32d895b8e4ece87ac42e76ee2f7f29828caa8311157c5b"
        );
        assert_eq!(
            sign(&[("timestamp", "1700000000".to_string())], "abcd"),
            "29886ed878035abc09e29f7e8ce19b01d9f3caa3ad0851d5d5c2aaa5ab812369"
        );
    }

    #[tokio::test]
    async fn upload_returns_secure_url() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("POST").path("/v1_1/demo/image/upload");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"secure_url":"https://res.example/demo/leaf.jpg","public_id":"leaf"}"#);
        });

        let uploader = CloudinaryUploader::new(&settings(&server)).expect("uploader");
        let file = scratch_file();
        let uploaded = uploader.upload(file.path()).await.expect("upload");

        mock.assert();
        assert_eq!(uploaded.secure_url, "https://res.example/demo/leaf.jpg");
    }

    #[tokio::test]
    async fn rejected_upload_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("POST").path("/v1_1/demo/image/upload");
            then.status(401)
                .header("content-type", "application/json")
                .body(r#"{"error":{"message":"Invalid Signature"}}"#);
        });

        let uploader = CloudinaryUploader::new(&settings(&server)).expect("uploader");
        let file = scratch_file();
        let err = uploader.upload(file.path()).await.unwrap_err();

        assert!(matches!(err, UpstreamError::Upload(_)));
        assert!(err.to_string().contains("Invalid Signature"));
    }

    #[tokio::test]
    async fn missing_scratch_file_fails_before_any_request() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("POST");
            then.status(200);
        });

        let uploader = CloudinaryUploader::new(&settings(&server)).expect("uploader");
        let err = uploader
            .upload(Path::new("/nonexistent/plantlog/leaf.jpg"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("cannot read scratch file"));
        mock.assert_hits(0);
    }
}
