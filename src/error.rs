use thiserror::Error;

/// Failure modes of a prediction request.
///
/// Upstream data problems never appear here: the pre-processor recovers
/// them as an empty dataset, which then surfaces as [`InsufficientData`].
///
/// [`InsufficientData`]: PredictionError::InsufficientData
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    /// Too few bars, rows or windows to train and score a model
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Unexpected failure while fitting or running the model
    #[error("Training or inference failed: {0}")]
    TrainingOrInference(String),
}

impl PredictionError {
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, PredictionError::InsufficientData(_))
    }
}

impl From<anyhow::Error> for PredictionError {
    fn from(e: anyhow::Error) -> Self {
        PredictionError::TrainingOrInference(format!("{:#}", e))
    }
}
