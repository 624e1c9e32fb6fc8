//! Image uploads forwarded to the hosted media service.
//!
//! Uploads are signed: the request parameters are sorted by name, joined as
//! `key=value` pairs with `&`, suffixed with the API secret and hashed with
//! SHA-256.

use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::config::MediaConfig;
use crate::{FolioError, Result};

/// File extensions accepted for upload.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "avif"];

const UPLOAD_TIMEOUT_SECS: u64 = 60;

/// Client for the signed upload API.
#[derive(Debug, Clone)]
pub struct MediaClient {
    client: Client,
    endpoint: String,
    api_key: String,
    api_secret: String,
    folder: String,
    max_bytes: usize,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    error: Option<UploadError>,
}

#[derive(Debug, Deserialize)]
struct UploadError {
    message: String,
}

impl MediaClient {
    /// Returns `Ok(None)` when no media account is configured.
    pub fn from_config(config: &MediaConfig) -> Result<Option<Self>> {
        if !config.is_configured() {
            return Ok(None);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
            .build()
            .map_err(|e| FolioError::Media(format!("failed to create HTTP client: {}", e)))?;

        Ok(Some(Self {
            client,
            endpoint: format!(
                "{}/{}/image/upload",
                config.upload_base_url.trim_end_matches('/'),
                config.cloud_name
            ),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            folder: config.folder.clone(),
            max_bytes: (config.max_upload_mb as usize).saturating_mul(1024 * 1024),
        }))
    }

    /// Largest accepted upload in bytes.
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Upload an image and return its public HTTPS URL.
    pub async fn upload(&self, filename: &str, data: Vec<u8>) -> Result<String> {
        validate_image(filename, data.len(), self.max_bytes)?;

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("folder", &self.folder), ("timestamp", &timestamp)],
            &self.api_secret,
        );

        let mime = mime_guess::from_path(filename).first_or_octet_stream();
        let part = Part::bytes(data)
            .file_name(filename.to_string())
            .mime_str(mime.as_ref())
            .map_err(|e| FolioError::Media(e.to_string()))?;
        let form = Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.folder.clone())
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| FolioError::Media(format!("upload request failed: {}", e)))?;

        let status = response.status();
        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| FolioError::Media(format!("invalid upload response: {}", e)))?;

        if let Some(error) = body.error {
            return Err(FolioError::Media(error.message));
        }
        if !status.is_success() {
            return Err(FolioError::Media(format!("HTTP error: {}", status)));
        }

        let url = body
            .secure_url
            .ok_or_else(|| FolioError::Media("upload response has no URL".to_string()))?;
        tracing::info!(filename, url = %url, "Image uploaded");
        Ok(url)
    }
}

/// Check the file extension and size. Returns the lowercased extension.
pub fn validate_image(filename: &str, size: usize, max_bytes: usize) -> Result<String> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(FolioError::Validation(format!(
            "Unsupported image format. Allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }
    if size == 0 {
        return Err(FolioError::Validation("Image file is empty".to_string()));
    }
    if size > max_bytes {
        return Err(FolioError::Validation(format!(
            "Image exceeds the {} MB limit",
            max_bytes / (1024 * 1024)
        )));
    }
    Ok(extension)
}

/// Sign upload parameters with the account secret.
pub fn sign_params(params: &[(&str, &str)], secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Multipart;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    const MB: usize = 1024 * 1024;

    #[test]
    fn test_validate_image_extension() {
        assert_eq!(validate_image("photo.JPG", 10, MB).unwrap(), "jpg");
        assert_eq!(validate_image("a.b.avif", 10, MB).unwrap(), "avif");
        assert!(validate_image("script.svg", 10, MB).is_err());
        assert!(validate_image("noextension", 10, MB).is_err());
    }

    #[test]
    fn test_validate_image_size() {
        assert!(validate_image("a.png", 0, MB).is_err());
        assert!(validate_image("a.png", MB, MB).is_ok());
        assert!(matches!(
            validate_image("a.png", MB + 1, MB),
            Err(FolioError::Validation(_))
        ));
    }

    #[test]
    fn test_sign_params_sorts_keys() {
        let a = sign_params(&[("timestamp", "1"), ("folder", "x")], "secret");
        let b = sign_params(&[("folder", "x"), ("timestamp", "1")], "secret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let mut hasher = Sha256::new();
        hasher.update(b"folder=x&timestamp=1secret");
        assert_eq!(a, hex::encode(hasher.finalize()));
    }

    #[test]
    fn test_unconfigured_client() {
        assert!(MediaClient::from_config(&MediaConfig::default())
            .unwrap()
            .is_none());
    }

    async fn fake_upload(mut multipart: Multipart) -> Json<Value> {
        let mut fields = Vec::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            fields.push(field.name().unwrap_or_default().to_string());
            let _ = field.bytes().await.unwrap();
        }
        Json(json!({ "secure_url": "https://cdn.test/blogs/images/a.png", "fields": fields }))
    }

    #[tokio::test]
    async fn test_upload_returns_secure_url() {
        let app = Router::new().route("/:cloud/image/upload", post(fake_upload));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = MediaConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            upload_base_url: format!("http://{}", addr),
            ..Default::default()
        };
        let client = MediaClient::from_config(&config).unwrap().unwrap();
        let url = client.upload("a.png", vec![1, 2, 3]).await.unwrap();
        assert_eq!(url, "https://cdn.test/blogs/images/a.png");
    }

    #[tokio::test]
    async fn test_upload_rejects_before_sending() {
        let config = MediaConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            upload_base_url: "http://127.0.0.1:1".to_string(),
            ..Default::default()
        };
        let client = MediaClient::from_config(&config).unwrap().unwrap();
        let err = client.upload("a.exe", vec![1]).await.unwrap_err();
        assert!(matches!(err, FolioError::Validation(_)));
    }
}
