// External imports
use serde::Serialize;

// Internal imports
use crate::error::PredictionError;

/// Out-of-sample scores for the held-out test windows
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluationMetrics {
    /// Directional accuracy in percent
    pub accuracy: f64,
    pub f1_score: f64,
    pub rmse: f64,
}

/// Up/down labels for consecutive test points.
///
/// Both labels at step `t` compare against the *actual* price at `t - 1`:
/// `actual[t] = truth[t] > truth[t-1]` and `predicted[t] = pred[t] > truth[t-1]`.
/// The returned vectors have one element fewer than the inputs.
pub fn directional_labels(truth: &[f64], predicted: &[f64]) -> (Vec<bool>, Vec<bool>) {
    let actual = truth.windows(2).map(|w| w[1] > w[0]).collect();
    let forecast = truth
        .iter()
        .zip(predicted.iter().skip(1))
        .map(|(prev, pred)| pred > prev)
        .collect();
    (actual, forecast)
}

/// Share of matching labels, in percent
pub fn accuracy_percent(actual: &[bool], predicted: &[bool]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let hits = actual.iter().zip(predicted).filter(|(a, p)| a == p).count();
    hits as f64 / actual.len() as f64 * 100.0
}

/// F1 score with "up" as the positive class.
///
/// With no predicted and no actual positives the score is 1.0.
pub fn f1_score(actual: &[bool], predicted: &[bool]) -> f64 {
    let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);
    for (&a, &p) in actual.iter().zip(predicted) {
        match (a, p) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }

    if tp + fp + fn_ == 0 {
        return 1.0;
    }
    (2 * tp) as f64 / (2 * tp + fp + fn_) as f64
}

pub fn rmse(truth: &[f64], predicted: &[f64]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = truth
        .iter()
        .zip(predicted)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    (sum_sq / truth.len() as f64).sqrt()
}

/// Score unscaled test predictions against the unscaled truth
pub fn evaluate_predictions(truth: &[f64], predicted: &[f64]) -> Result<EvaluationMetrics, PredictionError> {
    if truth.len() != predicted.len() {
        return Err(PredictionError::TrainingOrInference(format!(
            "{} predictions for {} test points",
            predicted.len(),
            truth.len()
        )));
    }
    if truth.len() < 2 {
        return Err(PredictionError::InsufficientData(format!(
            "{} test points cannot be scored for direction",
            truth.len()
        )));
    }

    let (actual, forecast) = directional_labels(truth, predicted);
    let metrics = EvaluationMetrics {
        accuracy: accuracy_percent(&actual, &forecast),
        f1_score: f1_score(&actual, &forecast),
        rmse: rmse(truth, predicted),
    };

    log::info!(
        "Test metrics: accuracy {:.2}%, F1 {:.2}, RMSE {:.4}",
        metrics.accuracy,
        metrics.f1_score,
        metrics.rmse
    );
    Ok(metrics)
}
