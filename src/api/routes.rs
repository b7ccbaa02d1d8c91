// External imports
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// Internal imports
use super::error::ApiError;
use super::state::AppState;
use crate::lstm::step_7_signal::Signal;
use crate::pipeline::{self, Forecast};
use crate::util::live_data::{self, Candle};
use crate::util::market_data::MarketDataError;

#[derive(Debug, Deserialize)]
pub struct SymbolQuery {
    pub symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub symbol: Option<String>,
    pub interval: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub accuracy: f64,
    pub f1_score: f64,
    pub rmse: f64,
}

/// `/predict` body; every number rounded to cents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub symbol: String,
    pub predicted_close: f64,
    pub current_price: f64,
    pub signal: Signal,
    pub target: f64,
    pub stop_loss: f64,
    pub confidence: f64,
    pub metrics: MetricsResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveResponse {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub pct_change: f64,
    pub rsi: f64,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl From<Forecast> for PredictionResponse {
    fn from(f: Forecast) -> Self {
        Self {
            symbol: f.symbol,
            predicted_close: round2(f.predicted_close),
            current_price: round2(f.current_price),
            signal: f.signal,
            target: round2(f.target),
            stop_loss: round2(f.stop_loss),
            confidence: round2(f.confidence),
            metrics: MetricsResponse {
                accuracy: round2(f.metrics.accuracy),
                f1_score: round2(f.metrics.f1_score),
                rmse: round2(f.metrics.rmse),
            },
        }
    }
}

/// The requested symbol, unless it is missing or blank
fn given_symbol(symbol: Option<String>) -> Option<String> {
    symbol.filter(|s| !s.trim().is_empty())
}

/// GET /predict?symbol=S
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SymbolQuery>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let symbol = given_symbol(query.symbol).ok_or(ApiError::MissingSymbol)?;
    let forecast = pipeline::predict(
        state.source.clone(),
        &symbol,
        &state.config.pipeline,
        state.config.training_timeout,
    )
    .await?;

    log::info!(
        "{}: {:?} at {:.2} (forecast {:.2}, confidence {:.2})",
        forecast.symbol,
        forecast.signal,
        forecast.current_price,
        forecast.predicted_close,
        forecast.confidence
    );
    Ok(Json(forecast.into()))
}

/// GET /live?symbol=S
pub async fn live(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SymbolQuery>,
) -> Result<Json<LiveResponse>, ApiError> {
    // a missing symbol is a 500 on this route
    let symbol = given_symbol(query.symbol).ok_or(MarketDataError::MissingSymbol)?;
    let snapshot = live_data::live_snapshot(state.source.as_ref(), &symbol).await?;

    Ok(Json(LiveResponse {
        symbol: snapshot.symbol,
        price: round2(snapshot.price),
        change: round2(snapshot.change),
        pct_change: round2(snapshot.pct_change),
        rsi: round2(snapshot.rsi),
        last_updated: snapshot.last_updated,
    }))
}

/// GET /history?symbol=S&interval=I
pub async fn history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<Candle>> {
    let Some(symbol) = given_symbol(query.symbol) else {
        return Json(Vec::new());
    };
    let interval = query.interval.unwrap_or_else(|| "1d".to_string());

    Json(live_data::price_history(state.source.as_ref(), &symbol, &interval).await)
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: state.version.to_string(),
    })
}

/// All routes with permissive CORS and request tracing
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/predict", get(predict))
        .route("/live", get(live))
        .route("/history", get(history))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
