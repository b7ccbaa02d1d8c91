// External imports
use burn::module::AutodiffModule;
use burn_autodiff::Autodiff;
use burn_ndarray::{NdArray, NdArrayDevice};
use polars::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// Internal imports
use crate::config::PipelineConfig;
use crate::constants::{ATR_COLUMN, TARGET_COLUMN};
use crate::error::PredictionError;
use crate::lstm::step_1_tensor_preparation::prepare_dataset;
use crate::lstm::step_4_train_model::train_model_cancellable;
use crate::lstm::step_5_prediction::{denormalize_predictions, predict_next_step, predict_windows};
use crate::lstm::step_6_evaluation::{evaluate_predictions, EvaluationMetrics};
use crate::lstm::step_7_signal::{generate_signal, Signal};
use crate::util::feature_engineering::engineer_features;
use crate::util::market_data::MarketDataSource;
use crate::util::pre_processor::{self, column_values, normalize_symbol, FetchOutcome};

/// CPU backend with autodiff, used to fit every per-request model
pub type TrainingBackend = Autodiff<NdArray<f32>>;
pub type InferenceBackend = NdArray<f32>;

/// Outcome of one prediction request, before any rounding
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub symbol: String,
    pub predicted_close: f64,
    pub current_price: f64,
    pub atr: f64,
    pub signal: Signal,
    pub target: f64,
    pub stop_loss: f64,
    pub confidence: f64,
    pub metrics: EvaluationMetrics,
    pub epochs_run: usize,
}

fn last_value(df: &DataFrame, column: &str) -> Result<f64, PredictionError> {
    column_values(df, column)
        .map_err(|e| PredictionError::TrainingOrInference(e.to_string()))?
        .last()
        .copied()
        .ok_or_else(|| PredictionError::InsufficientData(format!("no rows left in '{}'", column)))
}

/// Runs the CPU-bound part of a prediction on already cleaned bars.
///
/// Features, scalers and the model are all built from scratch for this
/// call; nothing is shared with other requests.
pub fn forecast_from_bars(
    symbol: &str,
    bars: &DataFrame,
    config: &PipelineConfig,
) -> Result<Forecast, PredictionError> {
    forecast_from_bars_cancellable(symbol, bars, config, &AtomicBool::new(false))
}

/// [`forecast_from_bars`] that stops with `TrainingOrInference` once
/// `cancel` is set, either mid-training or before inference starts.
pub fn forecast_from_bars_cancellable(
    symbol: &str,
    bars: &DataFrame,
    config: &PipelineConfig,
    cancel: &AtomicBool,
) -> Result<Forecast, PredictionError> {
    let features = engineer_features(bars, config.min_bars)?;
    let dataset = prepare_dataset(&features, config.sequence_length, config.train_ratio)?;

    let device = NdArrayDevice::default();
    let (model, report) =
        train_model_cancellable::<TrainingBackend>(&dataset, &config.model, &config.training, &device, cancel)?;
    if cancel.load(Ordering::Relaxed) {
        return Err(PredictionError::TrainingOrInference(format!(
            "{}: cancelled after training",
            symbol
        )));
    }
    log::info!(
        "{}: trained {} epochs, best epoch {} (val loss {:.6})",
        symbol,
        report.epochs_run,
        report.best_epoch,
        report.best_val_loss
    );

    // Inference without autodiff, dropout disabled
    let model = model.valid();

    let test_windows: Vec<usize> = dataset.test_windows().collect();
    let scaled = predict_windows::<InferenceBackend>(
        &model,
        &dataset,
        &test_windows,
        config.training.batch_size,
        &device,
    )?;
    let predicted = denormalize_predictions(&dataset, &scaled);
    let truth = dataset.raw_targets(dataset.test_windows());
    let metrics = evaluate_predictions(&truth, &predicted)?;

    let next_scaled = predict_next_step::<InferenceBackend>(&model, &dataset, &device)?;
    let predicted_close = denormalize_predictions(&dataset, &[next_scaled])
        .first()
        .copied()
        .ok_or_else(|| PredictionError::TrainingOrInference("empty next-step prediction".to_string()))?;

    let current_price = last_value(&features, TARGET_COLUMN)?;
    let atr = last_value(&features, ATR_COLUMN)?;
    let trade = generate_signal(predicted_close, current_price, atr, metrics.accuracy);

    Ok(Forecast {
        symbol: symbol.to_string(),
        predicted_close,
        current_price,
        atr,
        signal: trade.signal,
        target: trade.target,
        stop_loss: trade.stop_loss,
        confidence: trade.confidence,
        metrics,
        epochs_run: report.epochs_run,
    })
}

/// Fetches history for `symbol` and forecasts its next close.
///
/// Training runs on the blocking thread pool. Once `timeout` elapses the
/// job is told to stop at its next batch and the call returns
/// `TrainingOrInference` without waiting for it.
pub async fn predict(
    source: Arc<dyn MarketDataSource>,
    symbol: &str,
    config: &PipelineConfig,
    timeout: Duration,
) -> Result<Forecast, PredictionError> {
    let symbol = normalize_symbol(symbol);

    let bars = match pre_processor::fetch_bars(source.as_ref(), &symbol, &config.period, &config.interval).await {
        FetchOutcome::Bars(df) => df,
        FetchOutcome::Empty => {
            return Err(PredictionError::InsufficientData(format!("no bars for {}", symbol)));
        }
        FetchOutcome::Failed(reason) => {
            return Err(PredictionError::InsufficientData(format!(
                "no bars for {} ({})",
                symbol, reason
            )));
        }
    };

    let cancel = Arc::new(AtomicBool::new(false));
    let job_cancel = Arc::clone(&cancel);
    let job_symbol = symbol.clone();
    let job_config = config.clone();
    let job = tokio::task::spawn_blocking(move || {
        forecast_from_bars_cancellable(&job_symbol, &bars, &job_config, &job_cancel)
    });

    match tokio::time::timeout(timeout, job).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(PredictionError::TrainingOrInference(format!(
            "prediction task for {} aborted: {}",
            symbol, join_error
        ))),
        Err(_) => {
            cancel.store(true, Ordering::Relaxed);
            Err(PredictionError::TrainingOrInference(format!(
                "prediction for {} exceeded {:?}",
                symbol, timeout
            )))
        }
    }
}
