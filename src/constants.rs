// Raw bar columns
pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const OHLCV_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

// Technical indicators added by the feature engineer
pub const RSI_COLUMN: &str = "rsi_14";
pub const EMA_FAST_COLUMN: &str = "ema_20";
pub const EMA_SLOW_COLUMN: &str = "ema_50";
pub const ATR_COLUMN: &str = "atr_14";

pub const RSI_PERIOD: usize = 14;
pub const EMA_FAST_PERIOD: usize = 20;
pub const EMA_SLOW_PERIOD: usize = 50;
pub const ATR_PERIOD: usize = 14;

// Model input channels, in tensor order
pub const FEATURE_COLUMNS: [&str; 5] = [
    "close",
    RSI_COLUMN,
    EMA_FAST_COLUMN,
    EMA_SLOW_COLUMN,
    "volume",
];

// Prediction target
pub const TARGET_COLUMN: &str = "close";

// Model parameters
pub const SEQUENCE_LENGTH: usize = 60; // Number of time steps to look back

// Data preprocessing
pub const TRAIN_SPLIT_RATIO: f64 = 0.9; // chronological 90/10 split
pub const MIN_BARS_FOR_TRAINING: usize = 200;

// Market data
pub const PREDICTION_PERIOD: &str = "5y";
pub const HISTORY_LIMIT: usize = 200;
pub const INTRADAY_INTERVALS: [&str; 3] = ["15m", "30m", "1h"];

// Signal generation
pub const CONFIDENCE_CAP: f64 = 98.0;
pub const TREND_STRENGTH_MULTIPLIER: f64 = 1000.0;
pub const NEUTRAL_RSI: f64 = 50.0;
