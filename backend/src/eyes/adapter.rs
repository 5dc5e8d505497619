use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use shared::EyeAttributeSummary;

use super::detector::{Detection, EyeDetector};
use crate::model::round_hundredths;

pub const DARKCIRCLE_CLASS: &str = "darkcircle";
pub const EYEBAG_CLASS: &str = "Eyebag";

/// Best-effort eye attribute step. Detector failures and timeouts produce
/// the default summary instead of an error.
#[derive(Clone)]
pub struct EyeAttributeAdapter {
    detector: Arc<dyn EyeDetector>,
    timeout: Duration,
}

impl EyeAttributeAdapter {
    pub fn new(detector: Arc<dyn EyeDetector>, timeout: Duration) -> Self {
        Self { detector, timeout }
    }

    pub async fn infer_eye_attributes(
        &self,
        image: &Path,
        confidence_min: f64,
    ) -> EyeAttributeSummary {
        match tokio::time::timeout(self.timeout, self.detector.detect(image)).await {
            Ok(Ok(detections)) => summarize(&detections, confidence_min),
            Ok(Err(e)) => {
                log::warn!("Eye detector failed, returning default eye attributes: {}", e);
                EyeAttributeSummary::default()
            }
            Err(_) => {
                log::warn!(
                    "Eye detector timed out after {:?}, returning default eye attributes",
                    self.timeout
                );
                EyeAttributeSummary::default()
            }
        }
    }
}

pub fn summarize(detections: &[Detection], confidence_min: f64) -> EyeAttributeSummary {
    let max_confidence = |class: &str| {
        detections
            .iter()
            .filter(|d| d.class == class && d.confidence >= confidence_min)
            .map(|d| d.confidence)
            .fold(None, |best: Option<f64>, c| Some(best.map_or(c, |b| b.max(c))))
    };

    let darkcircle = max_confidence(DARKCIRCLE_CLASS);
    let eyebag = max_confidence(EYEBAG_CLASS);

    EyeAttributeSummary {
        darkcircle: darkcircle.is_some(),
        darkcircle_confidence: round_hundredths(darkcircle.unwrap_or(0.0)),
        eyebag: eyebag.is_some(),
        eyebag_confidence: round_hundredths(eyebag.unwrap_or(0.0)),
    }
}
