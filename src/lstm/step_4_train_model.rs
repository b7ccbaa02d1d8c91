// External imports
use anyhow::{bail, Result};
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};

// Internal imports
use super::step_1_tensor_preparation::ScaledDataset;
use super::step_3_lstm_model_arch::{ModelConfig, PriceForecastLstm};

/// Configuration for training the model
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    pub learning_rate: f64,
    pub batch_size: usize,
    pub epochs: usize,
    /// Epochs without validation improvement before stopping
    pub patience: usize,
    /// Minimum validation loss decrease that counts as an improvement
    pub min_delta: f64,
    /// Seeds weight initialisation, dropout masks and batch shuffling
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            batch_size: 32,
            epochs: 20,
            patience: 5,
            min_delta: 0.0,
            seed: 42,
        }
    }
}

/// What happened during a training run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub epochs_run: usize,
    /// 1-based epoch whose weights were kept
    pub best_epoch: usize,
    pub best_val_loss: f64,
    pub train_losses: Vec<f64>,
    pub val_losses: Vec<f64>,
    pub stopped_early: bool,
}

/// Train the forecasting model on the training windows of `dataset`.
///
/// The held-out test windows act as validation data. Training stops once
/// validation loss has not improved for `patience` epochs, and the weights
/// of the best validation epoch are always the ones returned.
pub fn train_model<B: AutodiffBackend>(
    dataset: &ScaledDataset,
    model_config: &ModelConfig,
    config: &TrainingConfig,
    device: &B::Device,
) -> Result<(PriceForecastLstm<B>, TrainingReport)> {
    train_model_cancellable(dataset, model_config, config, device, &AtomicBool::new(false))
}

/// Same as [`train_model`], but gives up with an error as soon as `cancel`
/// is set. The flag is checked before every batch.
pub fn train_model_cancellable<B: AutodiffBackend>(
    dataset: &ScaledDataset,
    model_config: &ModelConfig,
    config: &TrainingConfig,
    device: &B::Device,
    cancel: &AtomicBool,
) -> Result<(PriceForecastLstm<B>, TrainingReport)> {
    if config.batch_size == 0 || config.epochs == 0 {
        bail!("batch_size and epochs must both be positive");
    }
    if model_config.input_size != dataset.n_features() {
        bail!(
            "model expects {} input features but dataset has {}",
            model_config.input_size,
            dataset.n_features()
        );
    }

    B::seed(config.seed);
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut train_windows: Vec<usize> = dataset.train_windows().collect();
    let test_windows: Vec<usize> = dataset.test_windows().collect();
    if train_windows.is_empty() || test_windows.is_empty() {
        bail!("training needs both training and validation windows");
    }

    log::info!(
        "Training on {} windows, validating on {} (max {} epochs, batch {})",
        train_windows.len(),
        test_windows.len(),
        config.epochs,
        config.batch_size
    );

    // Validation runs on the inner backend so dropout stays off
    let val_features = dataset.window_features::<B::InnerBackend>(&test_windows, device);
    let val_targets = dataset.window_targets::<B::InnerBackend>(&test_windows, device);

    let mut model = model_config.init::<B>(device);
    let mut optimizer = AdamConfig::new().with_epsilon(1e-7).init();

    let mut best_model = model.clone();
    let mut best_val_loss = f64::INFINITY;
    let mut best_epoch = 0;
    let mut epochs_no_improve = 0;
    let mut stopped_early = false;
    let mut train_losses = Vec::with_capacity(config.epochs);
    let mut val_losses = Vec::with_capacity(config.epochs);

    for epoch in 1..=config.epochs {
        train_windows.shuffle(&mut rng);

        let mut epoch_loss = 0.0;
        let mut batches = 0;
        for batch in train_windows.chunks(config.batch_size) {
            if cancel.load(Ordering::Relaxed) {
                log::warn!("Training cancelled during epoch {}", epoch);
                bail!("training cancelled during epoch {}", epoch);
            }
            let features = dataset.window_features::<B>(batch, device);
            let targets = dataset.window_targets::<B>(batch, device);

            let predictions = model.forward(features);
            let loss = model.mse_loss(predictions, targets);
            epoch_loss += loss.clone().into_scalar().elem::<f64>();
            batches += 1;

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optimizer.step(config.learning_rate, model, grads);
        }
        let train_loss = epoch_loss / batches as f64;

        let valid_model = model.valid();
        let val_predictions = valid_model.forward(val_features.clone());
        let val_loss = valid_model
            .mse_loss(val_predictions, val_targets.clone())
            .into_scalar()
            .elem::<f64>();

        if !train_loss.is_finite() || !val_loss.is_finite() {
            bail!("training diverged at epoch {} (train {}, val {})", epoch, train_loss, val_loss);
        }

        log::debug!("Epoch {} - loss: {:.6} - val_loss: {:.6}", epoch, train_loss, val_loss);
        train_losses.push(train_loss);
        val_losses.push(val_loss);

        // Early stopping logic
        if val_loss < best_val_loss - config.min_delta {
            best_val_loss = val_loss;
            best_model = model.clone();
            best_epoch = epoch;
            epochs_no_improve = 0;
        } else {
            epochs_no_improve += 1;
            if epochs_no_improve >= config.patience {
                log::info!(
                    "Early stopping triggered at epoch {} (best val loss = {:.6} at epoch {})",
                    epoch,
                    best_val_loss,
                    best_epoch
                );
                stopped_early = true;
                break;
            }
        }
    }

    let report = TrainingReport {
        epochs_run: train_losses.len(),
        best_epoch,
        best_val_loss,
        train_losses,
        val_losses,
        stopped_early,
    };

    Ok((best_model, report))
}
