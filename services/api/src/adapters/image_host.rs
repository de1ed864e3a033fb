//! services/api/src/adapters/image_host.rs
//!
//! This module contains the adapter for the image hosting service (imgbb).
//! It implements the `ImageHostService` port from the `core` crate. The
//! completion endpoint only accepts image URLs, so photos are hosted here first.

use async_trait::async_trait;
use beyond_bark_core::ports::{ImageHostService, PortError, PortResult};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{error, info};

/// An adapter that implements `ImageHostService` against the imgbb upload API.
#[derive(Clone)]
pub struct ImgbbAdapter {
    http: reqwest::Client,
    upload_url: String,
    api_key: String,
}

impl ImgbbAdapter {
    /// Creates a new `ImgbbAdapter`.
    pub fn new(http: reqwest::Client, upload_url: String, api_key: String) -> Self {
        Self {
            http,
            upload_url,
            api_key,
        }
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    data: UploadData,
}

#[derive(Deserialize)]
struct UploadData {
    url: String,
}

fn parse_upload_response(body: &str) -> PortResult<String> {
    let response: UploadResponse = serde_json::from_str(body)
        .map_err(|e| PortError::Unexpected(format!("Unreadable image host response: {}", e)))?;
    Ok(response.data.url)
}

#[async_trait]
impl ImageHostService for ImgbbAdapter {
    async fn upload_image(&self, file_name: &str, image: Vec<u8>) -> PortResult<String> {
        info!(file_name, bytes = image.len(), "Uploading image");
        let form = Form::new().part("image", Part::bytes(image).file_name(file_name.to_string()));

        let response = self
            .http
            .post(&self.upload_url)
            .query(&[("key", self.api_key.as_str())])
            .multipart(form)
            .send()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;

        if !status.is_success() {
            error!(%status, "Image upload rejected");
            return Err(PortError::Rejected(format!("{}: {}", status, body)));
        }

        parse_upload_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_hosted_url_from_response() {
        let body = r#"{"data":{"id":"2ndCYJK","url":"https:\/\/i.ibb.co\/w04Prt6\/c1f64245afb2.gif","display_url":"https:\/\/i.ibb.co\/98W13PY\/c1f64245afb2.gif"},"success":true,"status":200}"#;
        assert_eq!(
            parse_upload_response(body).unwrap(),
            "https://i.ibb.co/w04Prt6/c1f64245afb2.gif"
        );
    }

    #[test]
    fn malformed_response_is_an_error() {
        let err = parse_upload_response(r#"{"success":false}"#).unwrap_err();
        assert!(matches!(err, PortError::Unexpected(_)));
    }
}
