use std::sync::Arc;

use shared::AggregateResponse;

use crate::aggregate::ResultAggregator;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::eyes::adapter::EyeAttributeAdapter;
use crate::eyes::detector::{DetectorError, RoboflowDetector};
use crate::model::{ClassifyParams, ImageSubmission};
use crate::storage::scoped_store::ScopedImageStore;
use crate::tone::adapter::ToneAdapter;
use crate::tone::classifier::CommandToneClassifier;

/// Runs one classification request end to end: store the upload, classify
/// skin tone, optionally infer eye attributes, then compose the response.
#[derive(Clone)]
pub struct ClassificationService {
    store: ScopedImageStore,
    tone: ToneAdapter,
    eyes: Option<EyeAttributeAdapter>,
    aggregator: ResultAggregator,
    max_upload_bytes: usize,
    confidence_min_default: f64,
}

impl ClassificationService {
    pub fn new(
        store: ScopedImageStore,
        tone: ToneAdapter,
        eyes: Option<EyeAttributeAdapter>,
        max_upload_bytes: usize,
        confidence_min_default: f64,
    ) -> Self {
        let aggregator = ResultAggregator::new(eyes.is_some());
        Self {
            store,
            tone,
            eyes,
            aggregator,
            max_upload_bytes,
            confidence_min_default,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, DetectorError> {
        let tone = ToneAdapter::new(Arc::new(CommandToneClassifier::from_config(&config.tone)));

        let eyes = match &config.eyes {
            Some(eye_config) => Some(EyeAttributeAdapter::new(
                Arc::new(RoboflowDetector::new(eye_config)?),
                eye_config.timeout,
            )),
            None => None,
        };

        Ok(Self::new(
            ScopedImageStore::new(&config.upload_dir),
            tone,
            eyes,
            config.max_upload_bytes,
            config.confidence_min_default,
        ))
    }

    pub fn eye_feature_enabled(&self) -> bool {
        self.aggregator.eye_feature_enabled()
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    pub fn confidence_min_default(&self) -> f64 {
        self.confidence_min_default
    }

    pub async fn classify(
        &self,
        submission: &ImageSubmission,
        params: &ClassifyParams,
    ) -> Result<AggregateResponse, ApiError> {
        let mut image = self
            .store
            .acquire(submission.content(), submission.extension())
            .await?;

        let outcome = async {
            let results = self.tone.classify(image.path(), params.palette).await?;
            log::info!(
                "Classified {} face(s) in {} with palette {}",
                results.len(),
                submission.filename(),
                params.palette
            );

            let eyes = match &self.eyes {
                Some(adapter) => Some(
                    adapter
                        .infer_eye_attributes(image.path(), params.confidence_min)
                        .await,
                ),
                None => None,
            };

            Ok::<_, ApiError>(self.aggregator.compose(results, eyes))
        }
        .await;

        image.release();

        if let Err(ApiError::ClassificationFailure(e)) = &outcome {
            log::error!("Tone classification failed for {}: {}", submission.filename(), e);
        }
        outcome
    }
}
