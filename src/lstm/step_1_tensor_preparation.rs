// External crates
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use polars::prelude::*;
use std::ops::Range;

// Internal modules
use crate::constants::{FEATURE_COLUMNS, TARGET_COLUMN};
use crate::error::PredictionError;
use crate::util::pre_processor::column_values;

/// Per-column min-max scaler mapping each column onto [0, 1].
///
/// A constant column has no range; it scales to 0 and inverse-transforms
/// back to its constant value.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    min: Array1<f64>,
    max: Array1<f64>,
}

impl MinMaxScaler {
    /// Fit column minima and maxima over every row of `data`
    pub fn fit(data: ArrayView2<f64>) -> Result<Self, PredictionError> {
        if data.nrows() == 0 {
            return Err(PredictionError::InsufficientData(
                "Cannot fit a scaler on zero rows".to_string(),
            ));
        }

        let min = data.fold_axis(Axis(0), f64::INFINITY, |&acc, &v| acc.min(v));
        let max = data.fold_axis(Axis(0), f64::NEG_INFINITY, |&acc, &v| acc.max(v));
        Ok(Self { min, max })
    }

    pub fn n_features(&self) -> usize {
        self.min.len()
    }

    fn range(&self, col: usize) -> f64 {
        let range = self.max[col] - self.min[col];
        if range.abs() < f64::EPSILON {
            1.0
        } else {
            range
        }
    }

    pub fn transform(&self, data: ArrayView2<f64>) -> Array2<f64> {
        let mut scaled = data.to_owned();
        for (col, mut column) in scaled.axis_iter_mut(Axis(1)).enumerate() {
            let (min, range) = (self.min[col], self.range(col));
            column.mapv_inplace(|v| (v - min) / range);
        }
        scaled
    }

    pub fn inverse_transform(&self, data: ArrayView2<f64>) -> Array2<f64> {
        let mut restored = data.to_owned();
        for (col, mut column) in restored.axis_iter_mut(Axis(1)).enumerate() {
            let (min, range) = (self.min[col], self.range(col));
            column.mapv_inplace(|v| v * range + min);
        }
        restored
    }

    /// Inverse-transform values belonging to a single column
    pub fn inverse_transform_column(&self, col: usize, values: &[f64]) -> Vec<f64> {
        let (min, range) = (self.min[col], self.range(col));
        values.iter().map(|v| v * range + min).collect()
    }
}

/// Scaled feature and target matrices plus the chronological window split.
///
/// Window `w` covers feature rows `[w, w + L)` and predicts the target at
/// row `w + L`, where `L` is the sequence length. Windows `[0, split)` are
/// used for training and `[split, window_count)` are held out for testing.
#[derive(Debug, Clone)]
pub struct ScaledDataset {
    features: Array2<f64>,
    targets: Array2<f64>,
    raw_targets: Vec<f64>,
    feature_scaler: MinMaxScaler,
    target_scaler: MinMaxScaler,
    sequence_length: usize,
    split: usize,
}

impl ScaledDataset {
    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    pub fn window_count(&self) -> usize {
        self.n_rows() - self.sequence_length
    }

    pub fn train_windows(&self) -> Range<usize> {
        0..self.split
    }

    pub fn test_windows(&self) -> Range<usize> {
        self.split..self.window_count()
    }

    /// Row whose target the given window predicts
    pub fn target_row(&self, window: usize) -> usize {
        window + self.sequence_length
    }

    pub fn feature_scaler(&self) -> &MinMaxScaler {
        &self.feature_scaler
    }

    pub fn target_scaler(&self) -> &MinMaxScaler {
        &self.target_scaler
    }

    pub fn scaled_features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn scaled_targets(&self) -> &Array2<f64> {
        &self.targets
    }

    /// Unscaled targets of the given windows, in window order
    pub fn raw_targets(&self, windows: Range<usize>) -> Vec<f64> {
        windows.map(|w| self.raw_targets[self.target_row(w)]).collect()
    }

    /// Feature tensor of shape `[windows, sequence_length, n_features]`
    pub fn window_features<B: Backend>(&self, windows: &[usize], device: &B::Device) -> Tensor<B, 3> {
        self.sequences_to_tensor(windows, device)
    }

    /// Scaled target tensor of shape `[windows, 1]`
    pub fn window_targets<B: Backend>(&self, windows: &[usize], device: &B::Device) -> Tensor<B, 2> {
        let buffer: Vec<f32> = windows
            .iter()
            .map(|&w| self.targets[[self.target_row(w), 0]] as f32)
            .collect();
        let n = buffer.len();
        Tensor::from_data(TensorData::new(buffer, [n, 1]), device)
    }

    /// The most recent `sequence_length` rows, shaped as a single window.
    ///
    /// Its "next" row lies in the future, so no window's ground truth
    /// covers it.
    pub fn future_window<B: Backend>(&self, device: &B::Device) -> Tensor<B, 3> {
        self.sequences_to_tensor(&[self.n_rows() - self.sequence_length], device)
    }

    fn sequences_to_tensor<B: Backend>(&self, starts: &[usize], device: &B::Device) -> Tensor<B, 3> {
        let n_cols = self.n_features();
        let mut buffer = Vec::with_capacity(starts.len() * self.sequence_length * n_cols);

        for &start in starts {
            for row in start..start + self.sequence_length {
                buffer.extend(self.features.row(row).iter().map(|&v| v as f32));
            }
        }

        Tensor::from_data(
            TensorData::new(buffer, [starts.len(), self.sequence_length, n_cols]),
            device,
        )
    }
}

/// Extracts the named columns of a frame into a row-major matrix
pub fn dataframe_to_matrix(df: &DataFrame, columns: &[&str]) -> PolarsResult<Array2<f64>> {
    let mut matrix = Array2::zeros((df.height(), columns.len()));
    for (j, &name) in columns.iter().enumerate() {
        let values = column_values(df, name)?;
        matrix.column_mut(j).assign(&Array1::from(values));
    }
    Ok(matrix)
}

/// Number of training windows for a chronological split
pub fn split_index(window_count: usize, train_ratio: f64) -> usize {
    (window_count as f64 * train_ratio).floor() as usize
}

/// Scales a feature frame and prepares it for windowing
///
/// # Arguments
///
/// * `df` - Feature rows, every indicator defined
/// * `sequence_length` - Number of time steps per window
/// * `train_ratio` - Fraction of windows kept for training (chronological prefix)
///
/// # Returns
///
/// A [`ScaledDataset`] with both scalers fit on the whole history, or
/// `InsufficientData` when the split would leave no training or no test window.
pub fn prepare_dataset(
    df: &DataFrame,
    sequence_length: usize,
    train_ratio: f64,
) -> Result<ScaledDataset, PredictionError> {
    let to_internal = |e: PolarsError| {
        PredictionError::TrainingOrInference(format!("Tensor preparation failed: {}", e))
    };
    let raw_features = dataframe_to_matrix(df, &FEATURE_COLUMNS).map_err(to_internal)?;
    let raw_targets = column_values(df, TARGET_COLUMN).map_err(to_internal)?;

    let n_rows = raw_features.nrows();
    if n_rows <= sequence_length {
        return Err(PredictionError::InsufficientData(format!(
            "{} feature rows cannot fill a {}-step window",
            n_rows, sequence_length
        )));
    }

    let window_count = n_rows - sequence_length;
    let split = split_index(window_count, train_ratio);
    if split == 0 || split >= window_count {
        return Err(PredictionError::InsufficientData(format!(
            "{} windows leave an empty train or test split",
            window_count
        )));
    }

    let target_matrix = Array2::from_shape_vec((n_rows, 1), raw_targets.clone())
        .map_err(|e| PredictionError::TrainingOrInference(e.to_string()))?;

    let feature_scaler = MinMaxScaler::fit(raw_features.view())?;
    let target_scaler = MinMaxScaler::fit(target_matrix.view())?;

    let features = feature_scaler.transform(raw_features.view());
    let targets = target_scaler.transform(target_matrix.view());

    log::debug!(
        "Prepared {} windows ({} train / {} test) over {} rows x {} features",
        window_count,
        split,
        window_count - split,
        n_rows,
        FEATURE_COLUMNS.len()
    );

    Ok(ScaledDataset {
        features,
        targets,
        raw_targets,
        feature_scaler,
        target_scaler,
        sequence_length,
        split,
    })
}
