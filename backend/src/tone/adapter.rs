use std::path::Path;
use std::sync::Arc;

use shared::{TonePalette, ToneResult};

use super::classifier::{RawFace, ToneClassifier, ToneError};
use crate::model::round_hundredths;

/// Skin tone step of a request. Any classifier error is returned to the
/// caller and aborts the request.
#[derive(Clone)]
pub struct ToneAdapter {
    classifier: Arc<dyn ToneClassifier>,
}

impl ToneAdapter {
    pub fn new(classifier: Arc<dyn ToneClassifier>) -> Self {
        Self { classifier }
    }

    pub async fn classify(
        &self,
        image: &Path,
        palette: TonePalette,
    ) -> Result<Vec<ToneResult>, ToneError> {
        let report = self.classifier.process(image, palette).await?;
        Ok(report.faces.into_iter().map(to_tone_result).collect())
    }
}

fn to_tone_result(face: RawFace) -> ToneResult {
    ToneResult {
        label: face.coarse_tone_label.unwrap_or_default(),
        color: face.skin_tone.unwrap_or_default(),
        confidence: face.accuracy.map(round_hundredths),
    }
}
