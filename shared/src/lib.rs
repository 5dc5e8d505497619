use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Skin tone judgment for a single detected face.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ToneResult {
    pub label: String,
    pub color: String,
    /// Classifier accuracy on a 0-100 scale, `null` when the classifier gave none.
    pub confidence: Option<f64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct EyeAttributeSummary {
    pub darkcircle: bool,
    pub darkcircle_confidence: f64,
    pub eyebag: bool,
    pub eyebag_confidence: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AggregateResponse {
    pub results: Vec<ToneResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eyes: Option<EyeAttributeSummary>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
pub enum TonePalette {
    #[default]
    Perla,
    Monk,
    YadonOstfeld,
    Proder,
    Bw,
}
