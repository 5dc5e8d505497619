use std::str::FromStr;

use serde::Deserialize;
use shared::TonePalette;
use strum::IntoEnumIterator;

use crate::error::ApiError;
use crate::storage::validator::{validate_extension, ValidationError};

/// An uploaded image accepted by the validator. Lives for one request.
#[derive(Debug)]
pub struct ImageSubmission {
    filename: String,
    extension: String,
    content: Vec<u8>,
}

impl ImageSubmission {
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Result<Self, ValidationError> {
        let filename = filename.into();
        let extension = validate_extension(&filename)?;
        Ok(Self {
            filename,
            extension,
            content,
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

#[derive(Debug, Deserialize)]
pub struct ClassifyQuery {
    pub tone_palette: Option<String>,
    pub confidence_min: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifyParams {
    pub palette: TonePalette,
    pub confidence_min: f64,
}

impl ClassifyParams {
    pub fn from_query(query: ClassifyQuery, confidence_min_default: f64) -> Result<Self, ApiError> {
        let palette = match query.tone_palette.as_deref().map(str::trim) {
            None | Some("") => TonePalette::default(),
            Some(name) => TonePalette::from_str(name).map_err(|_| {
                let known: Vec<String> = TonePalette::iter().map(|p| p.to_string()).collect();
                ApiError::InvalidRequest(format!(
                    "Unknown tone_palette {:?}. Allowed: {}",
                    name,
                    known.join(", ")
                ))
            })?,
        };

        let confidence_min = query.confidence_min.unwrap_or(confidence_min_default);
        if !(0.0..=1.0).contains(&confidence_min) {
            return Err(ApiError::InvalidRequest(format!(
                "confidence_min must be between 0.0 and 1.0, got {}",
                confidence_min
            )));
        }

        Ok(Self {
            palette,
            confidence_min,
        })
    }
}

/// Rounds to two decimals, ties to even on the exact binary value.
pub fn round_hundredths(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}
