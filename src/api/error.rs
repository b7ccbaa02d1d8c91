// External imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

// Internal imports
use crate::error::PredictionError;
use crate::util::market_data::MarketDataError;

/// Everything a handler can fail with, rendered as `{"error": ...}`
#[derive(Debug)]
pub enum ApiError {
    MissingSymbol,
    Prediction(PredictionError),
    MarketData(MarketDataError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingSymbol => StatusCode::BAD_REQUEST,
            ApiError::Prediction(e) if e.is_insufficient_data() => StatusCode::BAD_REQUEST,
            ApiError::Prediction(_) | ApiError::MarketData(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message; prediction internals stay in the log
    pub fn message(&self) -> String {
        match self {
            ApiError::MissingSymbol => "No symbol provided".to_string(),
            ApiError::Prediction(PredictionError::InsufficientData(_)) => "Not enough data".to_string(),
            ApiError::Prediction(PredictionError::TrainingOrInference(_)) => "Prediction failed".to_string(),
            ApiError::MarketData(e) => e.to_string(),
        }
    }
}

impl From<PredictionError> for ApiError {
    fn from(e: PredictionError) -> Self {
        ApiError::Prediction(e)
    }
}

impl From<MarketDataError> for ApiError {
    fn from(e: MarketDataError) -> Self {
        ApiError::MarketData(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Prediction(e @ PredictionError::TrainingOrInference(_)) => {
                log::error!("Prediction error: {}", e)
            }
            ApiError::Prediction(e) => log::info!("Prediction rejected: {}", e),
            ApiError::MarketData(e) => log::warn!("Market data error: {}", e),
            ApiError::MissingSymbol => {}
        }

        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}
