//! Cloudinary relay implementation.

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use crate::metrics::{RELAYS_TOTAL, RELAY_DURATION};

use super::config::RelayConfig;
use super::error::RelayError;
use super::traits::Relay;
use super::types::RelayedAsset;

/// Environment variable consulted when the config carries no credential.
pub const CLOUDINARY_URL_ENV: &str = "CLOUDINARY_URL";

/// Parsed `cloudinary://<key>:<secret>@<cloud>` credential.
#[derive(Clone, PartialEq, Eq)]
pub struct CloudinaryCredential {
    pub api_key: String,
    pub api_secret: String,
    pub cloud_name: String,
}

impl CloudinaryCredential {
    /// Parses a credential URL.
    pub fn parse(raw: &str) -> Result<Self, RelayError> {
        let url = Url::parse(raw.trim())
            .map_err(|e| RelayError::InvalidCredential(format!("not a URL: {}", e)))?;

        if url.scheme() != "cloudinary" {
            return Err(RelayError::InvalidCredential(format!(
                "expected cloudinary:// scheme, got {}://",
                url.scheme()
            )));
        }

        let api_key = url.username();
        let api_secret = url.password().unwrap_or_default();
        let cloud_name = url.host_str().unwrap_or_default();

        if api_key.is_empty() || api_secret.is_empty() || cloud_name.is_empty() {
            return Err(RelayError::InvalidCredential(
                "expected cloudinary://<api_key>:<api_secret>@<cloud_name>".to_string(),
            ));
        }

        Ok(Self {
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            cloud_name: cloud_name.to_string(),
        })
    }

    /// Picks the configured credential, falling back to the environment value.
    pub fn resolve(configured: Option<&str>, env_value: Option<String>) -> Result<Self, RelayError> {
        let raw = configured
            .map(str::to_string)
            .filter(|s| !s.trim().is_empty())
            .or_else(|| env_value.filter(|s| !s.trim().is_empty()))
            .ok_or_else(|| {
                RelayError::ConfigurationMissing(format!(
                    "set relay.cloudinary_url or the {} environment variable",
                    CLOUDINARY_URL_ENV
                ))
            })?;
        Self::parse(&raw)
    }

    /// Request signature over the signed parameters.
    pub fn sign(&self, timestamp: i64) -> String {
        let payload = format!("timestamp={}{}", timestamp, self.api_secret);
        format!("{:x}", Sha256::digest(payload.as_bytes()))
    }
}

impl fmt::Debug for CloudinaryCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudinaryCredential")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("cloud_name", &self.cloud_name)
            .finish()
    }
}

/// Uploads files to Cloudinary's auto-detect upload endpoint.
pub struct CloudinaryRelay {
    client: Client,
    credential: CloudinaryCredential,
    api_base: String,
}

impl CloudinaryRelay {
    /// Builds a relay from config, reading `CLOUDINARY_URL` if needed.
    pub fn from_config(config: &RelayConfig) -> Result<Self, RelayError> {
        let credential = CloudinaryCredential::resolve(
            config.cloudinary_url.as_deref(),
            std::env::var(CLOUDINARY_URL_ENV).ok(),
        )?;
        Self::new(credential, config)
    }

    pub fn new(credential: CloudinaryCredential, config: &RelayConfig) -> Result<Self, RelayError> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        info!(cloud = %credential.cloud_name, "Cloudinary relay configured");

        Ok(Self {
            client,
            credential,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn cloud_name(&self) -> &str {
        &self.credential.cloud_name
    }

    fn upload_url(&self) -> String {
        format!("{}/{}/auto/upload", self.api_base, self.credential.cloud_name)
    }

    async fn upload(&self, path: &Path) -> Result<RelayedAsset, RelayError> {
        let file = file_part(path).await?;

        let timestamp = chrono::Utc::now().timestamp();
        let form = multipart::Form::new()
            .part("file", file)
            .text("api_key", self.credential.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature", self.credential.sign(timestamp))
            .text("signature_algorithm", "sha256");

        debug!(path = %path.display(), "Uploading to Cloudinary");

        let response = self.client.post(self.upload_url()).multipart(form).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        parse_upload_response(status, &body)
    }
}

#[async_trait]
impl Relay for CloudinaryRelay {
    fn name(&self) -> &str {
        "cloudinary"
    }

    async fn relay(&self, path: &Path) -> Result<RelayedAsset, RelayError> {
        let start = Instant::now();
        let result = self.upload(path).await;

        RELAY_DURATION
            .with_label_values(&[self.name()])
            .observe(start.elapsed().as_secs_f64());

        match &result {
            Ok(asset) => {
                RELAYS_TOTAL.with_label_values(&["success"]).inc();
                info!(reference = %asset.reference, "Relayed {}", path.display());
            }
            Err(e) => {
                RELAYS_TOTAL.with_label_values(&["failed"]).inc();
                warn!("Relay of {} failed: {}", path.display(), e);
            }
        }

        result
    }
}

/// Multipart part streaming the file from disk with a known length.
async fn file_part(path: &Path) -> Result<multipart::Part, RelayError> {
    let io_error = |source| RelayError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = tokio::fs::File::open(path).await.map_err(io_error)?;
    let length = file.metadata().await.map_err(io_error)?.len();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());

    Ok(multipart::Part::stream_with_length(reqwest::Body::from(file), length).file_name(file_name))
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    public_id: Option<String>,
    bytes: Option<u64>,
    error: Option<UploadErrorBody>,
}

#[derive(Debug, Deserialize)]
struct UploadErrorBody {
    message: String,
}

fn parse_upload_response(status: u16, body: &str) -> Result<RelayedAsset, RelayError> {
    let parsed: Result<UploadResponse, _> = serde_json::from_str(body);

    if !(200..300).contains(&status) {
        let message = parsed
            .ok()
            .and_then(|r| r.error)
            .map(|e| e.message)
            .unwrap_or_else(|| body.chars().take(200).collect());
        return Err(RelayError::Rejected { status, message });
    }

    let response =
        parsed.map_err(|e| RelayError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    let reference = response
        .secure_url
        .ok_or_else(|| RelayError::MalformedResponse("missing secure_url".to_string()))?;

    Ok(RelayedAsset {
        reference,
        public_id: response.public_id,
        bytes: response.bytes,
    })
}
