use crate::lstm::step_6_evaluation::{
    accuracy_percent, directional_labels, evaluate_predictions, f1_score, rmse,
};

#[test]
fn test_directional_labels_use_actual_prior_price() {
    let truth = [100.0, 105.0, 103.0, 108.0];
    let predicted = [101.0, 104.0, 106.0, 107.0];

    let (actual, forecast) = directional_labels(&truth, &predicted);
    assert_eq!(actual, vec![true, false, true]);
    // 104 > 100, 106 > 105, 107 > 103
    assert_eq!(forecast, vec![true, true, true]);
}

#[test]
fn test_directional_labels_ignore_predicted_prior_price() {
    // against the previous prediction (80) this would be "up"
    let (actual, forecast) = directional_labels(&[100.0, 90.0], &[80.0, 95.0]);
    assert_eq!(actual, vec![false]);
    assert_eq!(forecast, vec![false]);
}

#[test]
fn test_accuracy_in_percent() {
    let actual = [true, false, true];
    let predicted = [true, true, true];
    let accuracy = accuracy_percent(&actual, &predicted);
    assert!((accuracy - 200.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_f1_zero_division_scores_one() {
    // no positive predictions and no positive actuals
    assert_eq!(f1_score(&[false, false, false], &[false, false, false]), 1.0);
}

#[test]
fn test_f1_score() {
    // tp = 2, fp = 1, fn = 0
    let f1 = f1_score(&[true, false, true], &[true, true, true]);
    assert!((f1 - 0.8).abs() < 1e-12);

    // a missed positive with no predicted positives is 0, not the zero-division value
    assert_eq!(f1_score(&[true, false], &[false, false]), 0.0);
}

#[test]
fn test_rmse() {
    assert!((rmse(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0])).abs() < 1e-12);
    assert!((rmse(&[0.0, 0.0], &[3.0, 4.0]) - 12.5f64.sqrt()).abs() < 1e-12);
}

#[test]
fn test_evaluate_predictions() {
    let metrics = evaluate_predictions(&[100.0, 105.0, 103.0, 108.0], &[101.0, 104.0, 106.0, 107.0]).unwrap();
    assert!((metrics.accuracy - 200.0 / 3.0).abs() < 1e-9);
    assert!((metrics.f1_score - 0.8).abs() < 1e-12);
    assert!((metrics.rmse - 3.0f64.sqrt()).abs() < 1e-9);
}

#[test]
fn test_fewer_than_two_points_is_insufficient_data() {
    let err = evaluate_predictions(&[100.0], &[101.0]).unwrap_err();
    assert!(err.is_insufficient_data());

    let err = evaluate_predictions(&[], &[]).unwrap_err();
    assert!(err.is_insufficient_data());
}
