use anyhow::Result;
use ndarray::array;

use crate::constants::{FEATURE_COLUMNS, SEQUENCE_LENGTH};
use crate::lstm::step_1_tensor_preparation::{dataframe_to_matrix, prepare_dataset, split_index, MinMaxScaler};
use crate::test::test_utils::{linear_feature_frame, TestBackend};

#[test]
fn test_scaler_round_trip() -> Result<()> {
    let data = array![[1.0, 200.0], [3.0, 100.0], [5.0, 150.0]];
    let scaler = MinMaxScaler::fit(data.view())?;

    let scaled = scaler.transform(data.view());
    assert_eq!(scaled, array![[0.0, 1.0], [0.5, 0.0], [1.0, 0.5]]);

    let restored = scaler.inverse_transform(scaled.view());
    for (a, b) in restored.iter().zip(data.iter()) {
        assert!((a - b).abs() < 1e-9, "round trip drifted: {} vs {}", a, b);
    }
    Ok(())
}

#[test]
fn test_constant_column_scales_to_zero() -> Result<()> {
    let data = array![[7.0], [7.0], [7.0]];
    let scaler = MinMaxScaler::fit(data.view())?;

    let scaled = scaler.transform(data.view());
    assert!(scaled.iter().all(|&v| v == 0.0));
    assert_eq!(scaler.inverse_transform_column(0, &[0.0]), vec![7.0]);
    Ok(())
}

#[test]
fn test_scaler_rejects_empty_input() {
    let data = ndarray::Array2::<f64>::zeros((0, 3));
    let err = MinMaxScaler::fit(data.view()).unwrap_err();
    assert!(err.is_insufficient_data());
}

#[test]
fn test_window_count_and_split() -> Result<()> {
    let df = linear_feature_frame(100);
    let dataset = prepare_dataset(&df, 10, 0.9)?;

    assert_eq!(dataset.window_count(), 90);
    assert_eq!(dataset.train_windows(), 0..81);
    assert_eq!(dataset.test_windows(), 81..90);
    assert_eq!(split_index(90, 0.9), 81);

    // test windows strictly follow training windows
    assert!(dataset.train_windows().end <= dataset.test_windows().start);
    Ok(())
}

#[test]
fn test_default_lookback_windowing() -> Result<()> {
    let rows = 300;
    let dataset = prepare_dataset(&linear_feature_frame(rows), SEQUENCE_LENGTH, 0.9)?;

    assert_eq!(dataset.sequence_length(), 60);
    assert_eq!(dataset.window_count(), rows - 60);
    assert_eq!(dataset.train_windows(), 0..216);
    assert_eq!(dataset.test_windows(), 216..240);
    assert_eq!(dataset.target_row(dataset.window_count() - 1), rows - 1);

    let device = Default::default();
    let features = dataset.window_features::<TestBackend>(&[0, 239], &device);
    assert_eq!(features.dims(), [2, 60, 5]);
    Ok(())
}

#[test]
fn test_dataset_feature_scaler_round_trip() -> Result<()> {
    let df = linear_feature_frame(40);
    let dataset = prepare_dataset(&df, 10, 0.9)?;
    let raw = dataframe_to_matrix(&df, &FEATURE_COLUMNS)?;

    let scaled = dataset.scaled_features();
    assert!(scaled.iter().all(|v| (0.0..=1.0).contains(v)));

    let restored = dataset.feature_scaler().inverse_transform(scaled.view());
    assert_eq!(restored.dim(), raw.dim());
    for (a, b) in restored.iter().zip(raw.iter()) {
        assert!((a - b).abs() < 1e-9, "round trip drifted: {} vs {}", a, b);
    }
    Ok(())
}

#[test]
fn test_window_target_follows_its_slice() -> Result<()> {
    let df = linear_feature_frame(50);
    let dataset = prepare_dataset(&df, 10, 0.8)?;
    let device = Default::default();

    for window in [0usize, 7, dataset.window_count() - 1] {
        assert_eq!(dataset.target_row(window), window + 10);

        let features = dataset.window_features::<TestBackend>(&[window], &device);
        assert_eq!(features.dims(), [1, 10, 5]);
        let values: Vec<f32> = features.into_data().iter::<f32>().collect();
        let expected_first = dataset.scaled_features()[[window, 0]] as f32;
        let expected_last = dataset.scaled_features()[[window + 9, 0]] as f32;
        assert!((values[0] - expected_first).abs() < 1e-6);
        assert!((values[9 * 5] - expected_last).abs() < 1e-6);

        let target = dataset.window_targets::<TestBackend>(&[window], &device);
        assert_eq!(target.dims(), [1, 1]);
        let target: f32 = target.into_data().iter::<f32>().next().unwrap();
        let expected = dataset.scaled_targets()[[window + 10, 0]] as f32;
        assert!((target - expected).abs() < 1e-6);
    }

    // raw targets are the unscaled close of the following row
    let raw = dataset.raw_targets(0..2);
    assert_eq!(raw, vec![20.0, 21.0]);
    Ok(())
}

#[test]
fn test_future_window_is_most_recent_rows() -> Result<()> {
    let df = linear_feature_frame(40);
    let dataset = prepare_dataset(&df, 10, 0.9)?;
    let device = Default::default();

    let future = dataset.future_window::<TestBackend>(&device);
    assert_eq!(future.dims(), [1, 10, 5]);

    let values: Vec<f32> = future.into_data().iter::<f32>().collect();
    // last close scales to 1.0
    assert!((values[values.len() - 5] - 1.0).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_too_few_rows_is_insufficient_data() {
    let err = prepare_dataset(&linear_feature_frame(10), 10, 0.9).unwrap_err();
    assert!(err.is_insufficient_data());

    // a single window cannot be split into train and test
    let err = prepare_dataset(&linear_feature_frame(11), 10, 0.9).unwrap_err();
    assert!(err.is_insufficient_data());
}
