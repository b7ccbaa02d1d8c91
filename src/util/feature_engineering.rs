// External crates
use polars::df;
use polars::prelude::*;

// Local modules
use crate::constants::{
    ATR_COLUMN, ATR_PERIOD, EMA_FAST_COLUMN, EMA_FAST_PERIOD, EMA_SLOW_COLUMN, EMA_SLOW_PERIOD,
    RSI_COLUMN, RSI_PERIOD,
};
use crate::error::PredictionError;

/// Exponential smoothing whose first value is the simple mean of the first
/// `window` defined values.
///
/// `offset` is the number of leading rows that carry no usable value (one for
/// series built from a previous close). Each later row follows
/// `prev + alpha * (x - prev)`, which is polars' `ewm_mean` with `adjust = false`.
fn seeded_ewm(values: &Series, offset: usize, window: usize, alpha: f64) -> PolarsResult<Series> {
    let len = values.len();
    let name = values.name().clone();
    if window == 0 || len < offset + window {
        return Ok(Series::full_null(name, len, &DataType::Float64));
    }

    let seed_row = offset + window - 1;
    let seed = values
        .rolling_mean(RollingOptionsFixedWindow {
            window_size: window,
            min_periods: window,
            ..Default::default()
        })?
        .f64()?
        .get(seed_row);

    let mut seeded = Series::full_null(name.clone(), seed_row, &DataType::Float64);
    seeded.append(&Series::new(name, [seed]))?;
    seeded.append(&values.slice(seed_row as i64 + 1, len - seed_row - 1))?;

    ewm_mean(
        &seeded,
        EWMOptions {
            alpha,
            adjust: false,
            bias: false,
            min_periods: 1,
            ignore_nulls: false,
        },
    )
}

/// Wilder smoothing is an EMA with `alpha = 1 / window`
fn wilder_smoothing(values: &Series, window: usize) -> PolarsResult<Series> {
    seeded_ewm(values, 1, window, 1.0 / window.max(1) as f64)
}

/// Calculates the Exponential Moving Average (EMA).
///
/// The first defined value sits at index `window - 1` and is the simple mean
/// of the first `window` values; after that `alpha = 2 / (window + 1)`.
pub fn calculate_ema(df: &DataFrame, column: &str, window: usize) -> PolarsResult<Series> {
    let series = df.column(column)?.as_materialized_series().cast(&DataType::Float64)?;
    let alpha = 2.0 / (window as f64 + 1.0);
    seeded_ewm(&series, 0, window, alpha)
}

/// Calculates Relative Strength Index (RSI) of `close` with Wilder smoothing.
///
/// The first value sits at index `window`, once `window` price changes exist.
pub fn calculate_rsi(df: &DataFrame, window: usize) -> PolarsResult<Series> {
    let change = col("close") - col("close").shift(lit(1));
    let moves = df
        .clone()
        .lazy()
        .select([
            when(change.clone().gt(lit(0.0)))
                .then(change.clone())
                .otherwise(lit(0.0))
                .alias("gain"),
            when(change.clone().lt(lit(0.0)))
                .then(lit(0.0) - change)
                .otherwise(lit(0.0))
                .alias("loss"),
        ])
        .collect()?;

    let averages = DataFrame::new(vec![
        wilder_smoothing(moves.column("gain")?.as_materialized_series(), window)?.into_column(),
        wilder_smoothing(moves.column("loss")?.as_materialized_series(), window)?.into_column(),
    ])?;

    // flat series is neutral, pure gains saturate
    let rsi = averages
        .lazy()
        .select([when(col("loss").eq(lit(0.0)))
            .then(
                when(col("gain").eq(lit(0.0)))
                    .then(lit(50.0))
                    .otherwise(lit(100.0)),
            )
            .otherwise(lit(100.0) - lit(100.0) / (lit(1.0) + col("gain") / col("loss")))
            .alias("rsi")])
        .collect()?;

    Ok(rsi.column("rsi")?.as_materialized_series().clone())
}

/// Calculates Average True Range (ATR) with Wilder smoothing.
///
/// True range needs a previous close, so the first bar has none and the
/// first ATR value sits at index `window`.
pub fn calculate_atr(df: &DataFrame, window: usize) -> PolarsResult<Series> {
    let prev_close = col("close").shift(lit(1));
    let ranges = df
        .clone()
        .lazy()
        .select([max_horizontal([
            col("high") - col("low"),
            (col("high") - prev_close.clone()).abs(),
            (col("low") - prev_close).abs(),
        ])?
        .alias("true_range")])
        .collect()?;

    wilder_smoothing(ranges.column("true_range")?.as_materialized_series(), window)
}

/// Most recent RSI of a close series, if it is long enough to have one
pub fn latest_rsi(close: &[f64], window: usize) -> PolarsResult<Option<f64>> {
    let df = df!("close" => close)?;
    let rsi = calculate_rsi(&df, window)?;
    Ok(rsi.f64()?.into_iter().last().flatten())
}

/// Adds the momentum, trend and volatility indicators to a bar frame.
///
/// Rows whose indicators are still warming up are dropped, so every
/// returned row has all indicator columns defined.
pub fn add_technical_indicators(df: &DataFrame) -> PolarsResult<DataFrame> {
    let indicators = [
        calculate_rsi(df, RSI_PERIOD)?.with_name(RSI_COLUMN.into()),
        calculate_ema(df, "close", EMA_FAST_PERIOD)?.with_name(EMA_FAST_COLUMN.into()),
        calculate_ema(df, "close", EMA_SLOW_PERIOD)?.with_name(EMA_SLOW_COLUMN.into()),
        calculate_atr(df, ATR_PERIOD)?.with_name(ATR_COLUMN.into()),
    ];

    let columns: Vec<Column> = indicators.into_iter().map(|s| s.into_column()).collect();
    let result = df.hstack(&columns)?;

    result.drop_nulls::<String>(None)
}

/// Feature engineering stage of the prediction pipeline.
///
/// Requires at least `min_bars` bars (normally [`crate::constants::MIN_BARS_FOR_TRAINING`])
/// before any indicator is computed.
pub fn engineer_features(bars: &DataFrame, min_bars: usize) -> Result<DataFrame, PredictionError> {
    if bars.height() < min_bars {
        return Err(PredictionError::InsufficientData(format!(
            "{} bars available, {} required",
            bars.height(),
            min_bars
        )));
    }

    let features = add_technical_indicators(bars)
        .map_err(|e| PredictionError::TrainingOrInference(format!("Feature engineering failed: {}", e)))?;

    log::debug!(
        "Feature engineering kept {} of {} rows",
        features.height(),
        bars.height()
    );
    Ok(features)
}
