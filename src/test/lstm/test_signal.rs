use crate::lstm::step_7_signal::{generate_signal, trend_strength, Signal};

#[test]
fn test_buy_when_forecast_above_current() {
    let trade = generate_signal(102.0, 100.0, 1.5, 55.0);
    assert_eq!(trade.signal, Signal::Buy);
    assert_eq!(trade.target, 103.5);
    assert_eq!(trade.stop_loss, 98.5);
}

#[test]
fn test_equal_forecast_is_sell() {
    let trade = generate_signal(100.0, 100.0, 2.0, 60.0);
    assert_eq!(trade.signal, Signal::Sell);
    assert_eq!(trade.confidence, 60.0);
}

#[test]
fn test_sell_levels() {
    let trade = generate_signal(95.0, 100.0, 3.0, 40.0);
    assert_eq!(trade.signal, Signal::Sell);
    assert_eq!(trade.target, 98.0);
    assert_eq!(trade.stop_loss, 97.0);
    // 5% move adds 50 points
    assert!((trade.confidence - 90.0).abs() < 1e-9);
}

#[test]
fn test_confidence_is_capped() {
    let trade = generate_signal(110.0, 100.0, 1.0, 70.0);
    assert_eq!(trade.confidence, 98.0);
}

#[test]
fn test_trend_strength() {
    assert!((trend_strength(101.0, 100.0) - 10.0).abs() < 1e-9);
    assert!((trend_strength(99.0, 100.0) - 10.0).abs() < 1e-9);
}

#[test]
fn test_signal_serializes_uppercase() {
    assert_eq!(serde_json::to_string(&Signal::Buy).unwrap(), "\"BUY\"");
    assert_eq!(serde_json::to_string(&Signal::Sell).unwrap(), "\"SELL\"");
}
