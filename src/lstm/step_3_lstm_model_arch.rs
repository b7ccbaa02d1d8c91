// External imports
use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig};
use burn::prelude::Backend;
use burn::tensor::Tensor;

// Internal imports
use super::step_2_lstm_cell::Lstm;
use crate::constants::FEATURE_COLUMNS;

/// Layer widths and dropout rates of the forecasting network
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub input_size: usize,
    /// Units per direction of the first, bidirectional, recurrent layer
    pub bidirectional_units: usize,
    pub first_dropout: f64,
    /// Units of the second recurrent layer, which emits its last step only
    pub recurrent_units: usize,
    pub second_dropout: f64,
    pub dense_units: usize,
    pub output_size: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            input_size: FEATURE_COLUMNS.len(),
            bidirectional_units: 100,
            first_dropout: 0.3,
            recurrent_units: 50,
            second_dropout: 0.3,
            dense_units: 25,
            output_size: 1,
        }
    }
}

impl ModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> PriceForecastLstm<B> {
        PriceForecastLstm::new(self, device)
    }
}

/// Stacked LSTM regressor for next-step price forecasting.
///
/// `[batch, seq_len, input_size]` → BiLSTM → dropout → LSTM (last step)
/// → dropout → dense → dense → `[batch, output_size]`.
#[derive(Module, Debug)]
pub struct PriceForecastLstm<B: Backend> {
    bilstm: Lstm<B>,
    dropout1: Dropout,
    lstm: Lstm<B>,
    dropout2: Dropout,
    dense: Linear<B>,
    output: Linear<B>,
}

impl<B: Backend> PriceForecastLstm<B> {
    /// Create a new PriceForecastLstm model
    pub fn new(config: &ModelConfig, device: &B::Device) -> Self {
        let bilstm = Lstm::new(config.input_size, config.bidirectional_units, true, device);
        let lstm = Lstm::new(bilstm.output_size(), config.recurrent_units, false, device);

        Self {
            dropout1: DropoutConfig::new(config.first_dropout).init(),
            dropout2: DropoutConfig::new(config.second_dropout).init(),
            dense: LinearConfig::new(lstm.output_size(), config.dense_units).init(device),
            output: LinearConfig::new(config.dense_units, config.output_size).init(device),
            bilstm,
            lstm,
        }
    }

    /// Forward pass; dropout is only active on autodiff backends
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 2> {
        let sequence = self.bilstm.forward(x);
        let sequence = self.dropout1.forward(sequence);

        let last = self.lstm.forward_last(sequence);
        let last = self.dropout2.forward(last);

        // Linear dense layers, no activation in between
        let hidden = self.dense.forward(last);
        self.output.forward(hidden)
    }

    /// Mean squared error between predictions and targets
    pub fn mse_loss(&self, pred: Tensor<B, 2>, target: Tensor<B, 2>) -> Tensor<B, 1> {
        let diff = pred - target;
        (diff.clone() * diff).mean()
    }
}
