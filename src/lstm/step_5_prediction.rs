// External imports
use anyhow::{ensure, Result};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

// Internal imports
use super::step_1_tensor_preparation::ScaledDataset;
use super::step_3_lstm_model_arch::PriceForecastLstm;

fn tensor_to_vec<B: Backend>(tensor: Tensor<B, 2>) -> Vec<f64> {
    tensor.into_data().iter::<f64>().collect()
}

/// Scaled predictions for the given windows, in window order.
///
/// Windows are fed through the model `batch_size` at a time to bound memory.
pub fn predict_windows<B: Backend>(
    model: &PriceForecastLstm<B>,
    dataset: &ScaledDataset,
    windows: &[usize],
    batch_size: usize,
    device: &B::Device,
) -> Result<Vec<f64>> {
    ensure!(batch_size > 0, "batch_size must be positive");

    let mut predictions = Vec::with_capacity(windows.len());
    for batch in windows.chunks(batch_size) {
        let features = dataset.window_features::<B>(batch, device);
        predictions.extend(tensor_to_vec(model.forward(features)));
    }

    ensure!(
        predictions.len() == windows.len(),
        "model returned {} predictions for {} windows",
        predictions.len(),
        windows.len()
    );
    Ok(predictions)
}

/// Scaled prediction for the step after the most recent window
pub fn predict_next_step<B: Backend>(
    model: &PriceForecastLstm<B>,
    dataset: &ScaledDataset,
    device: &B::Device,
) -> Result<f64> {
    let prediction = tensor_to_vec(model.forward(dataset.future_window::<B>(device)));
    match prediction.as_slice() {
        [value] if value.is_finite() => Ok(*value),
        [value] => anyhow::bail!("non-finite next-step prediction: {}", value),
        other => anyhow::bail!("expected one next-step prediction, got {}", other.len()),
    }
}

/// Convert scaled target values back to prices
pub fn denormalize_predictions(dataset: &ScaledDataset, scaled: &[f64]) -> Vec<f64> {
    dataset.target_scaler().inverse_transform_column(0, scaled)
}
