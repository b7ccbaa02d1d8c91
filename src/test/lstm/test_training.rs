// External imports
use anyhow::Result;
use burn::module::AutodiffModule;
use burn::tensor::ElementConversion;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// Internal imports
use crate::lstm::step_1_tensor_preparation::{prepare_dataset, ScaledDataset};
use crate::lstm::step_4_train_model::{train_model, train_model_cancellable, TrainingConfig};
use crate::lstm::step_5_prediction::{denormalize_predictions, predict_next_step, predict_windows};
use crate::test::test_utils::{
    bars_frame, small_model_config, small_training_config, synthetic_bars, TestAutodiffBackend,
    TestBackend,
};
use crate::util::feature_engineering::engineer_features;

fn small_dataset() -> Result<ScaledDataset> {
    let bars = bars_frame(&synthetic_bars(400, 0.001, 7));
    let features = engineer_features(&bars, 200)?;
    Ok(prepare_dataset(&features, 15, 0.9)?)
}

#[test]
fn test_training_report_tracks_best_epoch() -> Result<()> {
    let dataset = small_dataset()?;
    let device = Default::default();
    let config = TrainingConfig {
        epochs: 6,
        patience: 1,
        ..small_training_config()
    };

    let (_, report) = train_model::<TestAutodiffBackend>(&dataset, &small_model_config(), &config, &device)?;

    assert_eq!(report.train_losses.len(), report.epochs_run);
    assert_eq!(report.val_losses.len(), report.epochs_run);
    assert!(report.best_epoch >= 1 && report.best_epoch <= report.epochs_run);

    let min_val = report.val_losses.iter().cloned().fold(f64::INFINITY, f64::min);
    assert_eq!(report.best_val_loss, min_val);
    assert_eq!(report.val_losses[report.best_epoch - 1], min_val);

    if report.stopped_early {
        assert_eq!(report.epochs_run - report.best_epoch, config.patience);
    } else {
        assert_eq!(report.epochs_run, config.epochs);
    }
    Ok(())
}

#[test]
fn test_best_weights_are_restored() -> Result<()> {
    let dataset = small_dataset()?;
    let device = Default::default();

    let (model, report) =
        train_model::<TestAutodiffBackend>(&dataset, &small_model_config(), &small_training_config(), &device)?;
    let model = model.valid();

    let test_windows: Vec<usize> = dataset.test_windows().collect();
    let features = dataset.window_features::<TestBackend>(&test_windows, &device);
    let targets = dataset.window_targets::<TestBackend>(&test_windows, &device);
    let loss = model
        .mse_loss(model.forward(features), targets)
        .into_scalar()
        .elem::<f64>();

    assert!(
        (loss - report.best_val_loss).abs() < 1e-5,
        "returned model scores {} but best validation loss was {}",
        loss,
        report.best_val_loss
    );
    Ok(())
}

#[test]
fn test_trained_model_predictions() -> Result<()> {
    let dataset = small_dataset()?;
    let device = Default::default();
    let (model, _) =
        train_model::<TestAutodiffBackend>(&dataset, &small_model_config(), &small_training_config(), &device)?;
    let model = model.valid();

    let test_windows: Vec<usize> = dataset.test_windows().collect();
    // batch size smaller than the window count exercises chunking
    let scaled = predict_windows::<TestBackend>(&model, &dataset, &test_windows, 4, &device)?;
    assert_eq!(scaled.len(), test_windows.len());

    let prices = denormalize_predictions(&dataset, &scaled);
    assert!(prices.iter().all(|p| p.is_finite()));

    let next = predict_next_step::<TestBackend>(&model, &dataset, &device)?;
    assert!(next.is_finite());
    Ok(())
}

#[test]
fn test_training_rejects_mismatched_input_size() -> Result<()> {
    let dataset = small_dataset()?;
    let device = Default::default();
    let mut model_config = small_model_config();
    model_config.input_size = 3;

    let result = train_model::<TestAutodiffBackend>(&dataset, &model_config, &small_training_config(), &device);
    assert!(result.is_err());
    Ok(())
}

#[test]
fn test_cancelled_training_never_updates() -> Result<()> {
    let dataset = small_dataset()?;
    let device = Default::default();
    let cancel = AtomicBool::new(true);

    let err = train_model_cancellable::<TestAutodiffBackend>(
        &dataset,
        &small_model_config(),
        &small_training_config(),
        &device,
        &cancel,
    )
    .unwrap_err();
    assert!(err.to_string().contains("cancelled during epoch 1"), "{}", err);
    Ok(())
}

#[test]
fn test_training_stops_when_cancelled_mid_run() -> Result<()> {
    let dataset = small_dataset()?;
    let device = Default::default();
    // would run for hours if the flag were ignored
    let config = TrainingConfig {
        epochs: 100_000,
        patience: 100_000,
        ..small_training_config()
    };

    let cancel = Arc::new(AtomicBool::new(false));
    let trigger = Arc::clone(&cancel);
    let timer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        trigger.store(true, Ordering::Relaxed);
    });

    let started = Instant::now();
    let result =
        train_model_cancellable::<TestAutodiffBackend>(&dataset, &small_model_config(), &config, &device, &cancel);
    timer.join().unwrap();

    assert!(result.is_err());
    assert!(started.elapsed() < Duration::from_secs(60), "took {:?}", started.elapsed());
    Ok(())
}
