use shared::{AggregateResponse, EyeAttributeSummary, ToneResult};

/// Builds the response body. Whether `eyes` appears depends only on the
/// startup capability flag, never on how the detector call went.
#[derive(Clone, Copy, Debug)]
pub struct ResultAggregator {
    eye_feature_enabled: bool,
}

impl ResultAggregator {
    pub fn new(eye_feature_enabled: bool) -> Self {
        Self { eye_feature_enabled }
    }

    pub fn eye_feature_enabled(&self) -> bool {
        self.eye_feature_enabled
    }

    pub fn compose(
        &self,
        results: Vec<ToneResult>,
        eyes: Option<EyeAttributeSummary>,
    ) -> AggregateResponse {
        AggregateResponse {
            results,
            eyes: self.eye_feature_enabled.then(|| eyes.unwrap_or_default()),
        }
    }
}
