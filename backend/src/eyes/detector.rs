use std::path::Path;

use async_trait::async_trait;
use base64::prelude::*;
use reqwest::Client as HttpClient;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Deserializer};
use url::Url;

use crate::config::EyeDetectorConfig;

#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to read image: {0}")]
    Io(#[from] std::io::Error),
    #[error("URL parsing failed: {0}")]
    Url(#[from] url::ParseError),
    #[error("Malformed detector response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// One class-labeled box returned by the detector. Geometry is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Detection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub class: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub confidence: f64,
}

/// A `null` field only disqualifies its own prediction, not the whole body.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct DetectorResponse {
    #[serde(default)]
    predictions: Vec<Detection>,
}

#[async_trait]
pub trait EyeDetector: Send + Sync {
    async fn detect(&self, image: &Path) -> Result<Vec<Detection>, DetectorError>;
}

/// Client for the Roboflow hosted object detection API.
#[derive(Clone)]
pub struct RoboflowDetector {
    http_client: HttpClient,
    endpoint: Url,
}

impl RoboflowDetector {
    pub fn new(config: &EyeDetectorConfig) -> Result<Self, DetectorError> {
        Ok(Self {
            http_client: HttpClient::new(),
            endpoint: Self::endpoint(config)?,
        })
    }

    fn endpoint(config: &EyeDetectorConfig) -> Result<Url, DetectorError> {
        let mut url = Url::parse(&format!(
            "{}/{}",
            config.api_url.trim_end_matches('/'),
            config.model_id.trim_start_matches('/')
        ))?;

        url.query_pairs_mut()
            .append_pair("api_key", &config.api_key)
            .append_pair("confidence", &config.confidence_threshold.to_string())
            .append_pair("overlap", &config.iou_threshold.to_string());

        Ok(url)
    }

    fn parse_response(body: &[u8]) -> Result<Vec<Detection>, serde_json::Error> {
        let response: DetectorResponse = serde_json::from_slice(body)?;
        Ok(response.predictions)
    }
}

#[async_trait]
impl EyeDetector for RoboflowDetector {
    async fn detect(&self, image: &Path) -> Result<Vec<Detection>, DetectorError> {
        let bytes = tokio::fs::read(image).await?;
        let body = BASE64_STANDARD.encode(bytes);

        log::debug!(
            "Sending {} to eye detector at {}{}",
            image.display(),
            self.endpoint.origin().ascii_serialization(),
            self.endpoint.path()
        );

        // The endpoint carries the api key, so reqwest errors lose their URL
        // before they can reach a log line.
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(reqwest::Error::without_url)?;

        let body = response.bytes().await.map_err(reqwest::Error::without_url)?;
        Ok(Self::parse_response(&body)?)
    }
}
