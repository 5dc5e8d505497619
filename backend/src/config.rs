use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
const DEFAULT_TONE_TIMEOUT_SECS: u64 = 120;
const DEFAULT_CONFIDENCE_MIN: f64 = 0.30;
const DEFAULT_ROBOFLOW_API_URL: &str = "https://detect.roboflow.com";
const DEFAULT_ROBOFLOW_MODEL_ID: &str = "dark_circle/1";
const DEFAULT_ROBOFLOW_TIMEOUT_SECS: u64 = 30;

/// Detector-side filtering hints sent with every remote call.
pub const DETECTOR_CONFIDENCE_THRESHOLD: f64 = 0.30;
pub const DETECTOR_IOU_THRESHOLD: f64 = 0.50;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("{key} must be within [0, 1], got {value}")]
    OutOfRange { key: &'static str, value: f64 },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub confidence_min_default: f64,
    pub tone: ToneClassifierConfig,
    /// `None` when no detector credential is present; disables the `eyes` section.
    pub eyes: Option<EyeDetectorConfig>,
}

#[derive(Debug, Clone)]
pub struct ToneClassifierConfig {
    /// Program plus leading arguments; image path and palette are appended.
    pub command: Option<Vec<String>>,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct EyeDetectorConfig {
    pub api_url: String,
    pub api_key: String,
    pub model_id: String,
    pub confidence_threshold: f64,
    pub iou_threshold: f64,
    pub timeout: Duration,
}

impl std::fmt::Debug for EyeDetectorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EyeDetectorConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("model_id", &self.model_id)
            .field("confidence_threshold", &self.confidence_threshold)
            .field("iou_threshold", &self.iou_threshold)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or("PORT", non_empty("PORT"), DEFAULT_PORT)?;
        let upload_dir = non_empty("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join("skintone-uploads"));
        let max_upload_bytes = parse_or(
            "MAX_UPLOAD_BYTES",
            non_empty("MAX_UPLOAD_BYTES"),
            DEFAULT_MAX_UPLOAD_BYTES,
        )?;

        let confidence_min_default = parse_or(
            "CONFIDENCE_MIN_DEFAULT",
            non_empty("CONFIDENCE_MIN_DEFAULT"),
            DEFAULT_CONFIDENCE_MIN,
        )?;
        if !(0.0..=1.0).contains(&confidence_min_default) {
            return Err(ConfigError::OutOfRange {
                key: "CONFIDENCE_MIN_DEFAULT",
                value: confidence_min_default,
            });
        }

        let tone = ToneClassifierConfig {
            command: non_empty("TONE_CLASSIFIER_CMD")
                .map(|cmd| cmd.split_whitespace().map(str::to_string).collect()),
            timeout: Duration::from_secs(parse_or(
                "TONE_CLASSIFIER_TIMEOUT_SECS",
                non_empty("TONE_CLASSIFIER_TIMEOUT_SECS"),
                DEFAULT_TONE_TIMEOUT_SECS,
            )?),
        };

        let eyes = match non_empty("ROBOFLOW_API_KEY") {
            Some(api_key) => Some(EyeDetectorConfig {
                api_url: non_empty("ROBOFLOW_API_URL")
                    .unwrap_or_else(|| DEFAULT_ROBOFLOW_API_URL.to_string()),
                api_key,
                model_id: non_empty("ROBOFLOW_MODEL_ID")
                    .unwrap_or_else(|| DEFAULT_ROBOFLOW_MODEL_ID.to_string()),
                confidence_threshold: DETECTOR_CONFIDENCE_THRESHOLD,
                iou_threshold: DETECTOR_IOU_THRESHOLD,
                timeout: Duration::from_secs(parse_or(
                    "ROBOFLOW_TIMEOUT_SECS",
                    non_empty("ROBOFLOW_TIMEOUT_SECS"),
                    DEFAULT_ROBOFLOW_TIMEOUT_SECS,
                )?),
            }),
            None => None,
        };

        Ok(Self {
            host,
            port,
            upload_dir,
            max_upload_bytes,
            confidence_min_default,
            tone,
            eyes,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}
