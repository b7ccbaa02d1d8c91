// External imports
use burn::tensor::{Distribution, Tensor};

// Internal imports
use crate::lstm::step_2_lstm_cell::Lstm;
use crate::lstm::step_3_lstm_model_arch::{ModelConfig, PriceForecastLstm};
use crate::test::test_utils::{small_model_config, TestBackend};

#[test]
fn test_lstm_output_shapes() {
    let device = Default::default();
    let x = Tensor::<TestBackend, 3>::random([2, 10, 5], Distribution::Default, &device);

    let bilstm = Lstm::<TestBackend>::new(5, 8, true, &device);
    assert!(bilstm.is_bidirectional());
    assert_eq!(bilstm.output_size(), 16);
    assert_eq!(bilstm.forward(x.clone()).dims(), [2, 10, 16]);
    assert_eq!(bilstm.forward_last(x.clone()).dims(), [2, 16]);

    let lstm = Lstm::<TestBackend>::new(5, 8, false, &device);
    assert_eq!(lstm.hidden_size(), 8);
    assert_eq!(lstm.forward(x.clone()).dims(), [2, 10, 8]);
    assert_eq!(lstm.forward_last(x).dims(), [2, 8]);
}

#[test]
fn test_reverse_direction_is_time_aligned() {
    let device = Default::default();
    let x = Tensor::<TestBackend, 3>::random([1, 6, 3], Distribution::Default, &device);
    let bilstm = Lstm::<TestBackend>::new(3, 4, true, &device);

    // At the last step the reverse pass has only seen that step
    let full: Vec<f32> = bilstm
        .forward(x.clone())
        .narrow(1, 5, 1)
        .narrow(2, 4, 4)
        .into_data()
        .iter::<f32>()
        .collect();
    let single: Vec<f32> = bilstm
        .forward(x.narrow(1, 5, 1))
        .narrow(2, 4, 4)
        .into_data()
        .iter::<f32>()
        .collect();

    for (a, b) in full.iter().zip(&single) {
        assert!((a - b).abs() < 1e-6, "reverse state mismatch: {} vs {}", a, b);
    }
}

#[test]
fn test_forecast_model_emits_one_value_per_window() {
    let device = Default::default();
    let model: PriceForecastLstm<TestBackend> = small_model_config().init(&device);

    let x = Tensor::<TestBackend, 3>::random([3, 12, 5], Distribution::Default, &device);
    let output = model.forward(x);
    assert_eq!(output.dims(), [3, 1]);
    assert!(output.into_data().iter::<f32>().all(|v| v.is_finite()));
}

#[test]
fn test_default_architecture() {
    let config = ModelConfig::default();
    assert_eq!(config.input_size, 5);
    assert_eq!(config.bidirectional_units, 100);
    assert_eq!(config.recurrent_units, 50);
    assert_eq!(config.dense_units, 25);
    assert_eq!(config.output_size, 1);
    assert_eq!(config.first_dropout, 0.3);
    assert_eq!(config.second_dropout, 0.3);
}

#[test]
fn test_mse_loss() {
    let device = Default::default();
    let model: PriceForecastLstm<TestBackend> = small_model_config().init(&device);

    let pred = Tensor::<TestBackend, 2>::from_floats([[1.0], [3.0]], &device);
    let target = Tensor::<TestBackend, 2>::from_floats([[0.0], [1.0]], &device);
    let loss: f32 = model.mse_loss(pred, target).into_scalar();
    assert!((loss - 2.5).abs() < 1e-6);
}
