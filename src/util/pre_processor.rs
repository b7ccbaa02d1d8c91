// External crates
use chrono::DateTime;
use polars::prelude::*;

// Local modules
use super::market_data::{Bar, MarketDataSource, RawBars};
use crate::constants::{INTRADAY_INTERVALS, OHLCV_COLUMNS, PREDICTION_PERIOD, TIMESTAMP_COLUMN};

/// Result of asking the upstream source for bars.
///
/// A failed fetch is kept distinct from an empty one so it can be logged,
/// but callers treat both as "no data".
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Bars(DataFrame),
    Empty,
    Failed(String),
}

impl FetchOutcome {
    /// The cleaned bar frame, or `None` for empty and failed fetches
    pub fn into_frame(self) -> Option<DataFrame> {
        match self {
            FetchOutcome::Bars(df) => Some(df),
            FetchOutcome::Empty | FetchOutcome::Failed(_) => None,
        }
    }
}

/// Trim and uppercase a ticker symbol
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Longer history gives more stable indicators, so "2y" requests are widened
pub fn resolve_period(period: &str) -> &str {
    if period == "2y" {
        PREDICTION_PERIOD
    } else {
        period
    }
}

/// Lookback period used for chart history at a given bar interval
pub fn history_period(interval: &str) -> &'static str {
    if INTRADAY_INTERVALS.contains(&interval) {
        "1mo"
    } else {
        "1y"
    }
}

/// Fetches bars from `source` and cleans them into a sorted, de-duplicated frame.
///
/// Never fails: upstream errors become [`FetchOutcome::Failed`] and an
/// upstream response without usable rows becomes [`FetchOutcome::Empty`].
pub async fn fetch_bars(
    source: &dyn MarketDataSource,
    symbol: &str,
    period: &str,
    interval: &str,
) -> FetchOutcome {
    let symbol = normalize_symbol(symbol);
    let period = resolve_period(period);

    let raw = match source.fetch_bars(&symbol, period, interval).await {
        Ok(raw) => raw,
        Err(e) => {
            log::warn!("Fetching {} ({} @ {}) failed: {}", symbol, period, interval, e);
            return FetchOutcome::Failed(e.to_string());
        }
    };

    if raw.is_empty() {
        log::info!("No bars returned for {} ({} @ {})", symbol, period, interval);
        return FetchOutcome::Empty;
    }

    match load_and_preprocess(&raw) {
        Ok(df) if df.height() == 0 => FetchOutcome::Empty,
        Ok(df) => {
            log::debug!("Loaded {} clean bars for {}", df.height(), symbol);
            FetchOutcome::Bars(df)
        }
        Err(e) => {
            log::warn!("Cleaning bars for {} failed: {}", symbol, e);
            FetchOutcome::Failed(e.to_string())
        }
    }
}

/// Flattens column-oriented upstream bars into a clean DataFrame
///
/// # Arguments
///
/// * `raw` - Per-column values as returned by the source, possibly with gaps
///
/// # Returns
///
/// A frame with `timestamp` (epoch seconds) and OHLCV columns, sorted by
/// timestamp, with rows containing missing or non-finite values removed and
/// duplicate timestamps collapsed to their last occurrence.
pub fn load_and_preprocess(raw: &RawBars) -> PolarsResult<DataFrame> {
    let n = raw.len();
    let column = |values: &[Option<f64>]| -> Vec<Option<f64>> {
        (0..n)
            .map(|i| values.get(i).copied().flatten().filter(|v| v.is_finite()))
            .collect()
    };

    let mut df = DataFrame::new(vec![
        Series::new(TIMESTAMP_COLUMN.into(), raw.timestamps.clone()).into_column(),
        Series::new(OHLCV_COLUMNS[0].into(), column(&raw.open)).into_column(),
        Series::new(OHLCV_COLUMNS[1].into(), column(&raw.high)).into_column(),
        Series::new(OHLCV_COLUMNS[2].into(), column(&raw.low)).into_column(),
        Series::new(OHLCV_COLUMNS[3].into(), column(&raw.close)).into_column(),
        Series::new(OHLCV_COLUMNS[4].into(), column(&raw.volume)).into_column(),
    ])?;

    // Drop any rows with missing values
    df = df.drop_nulls::<String>(None)?;

    df = df.sort(
        vec![TIMESTAMP_COLUMN],
        SortMultipleOptions::default().with_maintain_order(true),
    )?;

    // Keep the last row of every run of equal timestamps
    let timestamps: Vec<i64> = df.column(TIMESTAMP_COLUMN)?.i64()?.into_no_null_iter().collect();
    let keep: Vec<bool> = (0..timestamps.len())
        .map(|i| i + 1 == timestamps.len() || timestamps[i] != timestamps[i + 1])
        .collect();
    if keep.iter().any(|k| !k) {
        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        df = df.filter(&mask)?;
    }

    Ok(df)
}

/// Reads a single float column into a vector
pub fn column_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<f64>> {
    Ok(df.column(name)?.f64()?.into_no_null_iter().collect())
}

/// Converts a clean bar frame back into rows
pub fn dataframe_to_bars(df: &DataFrame) -> PolarsResult<Vec<Bar>> {
    let timestamps: Vec<i64> = df.column(TIMESTAMP_COLUMN)?.i64()?.into_no_null_iter().collect();
    let open = column_values(df, "open")?;
    let high = column_values(df, "high")?;
    let low = column_values(df, "low")?;
    let close = column_values(df, "close")?;
    let volume = column_values(df, "volume")?;

    timestamps
        .iter()
        .enumerate()
        .map(|(i, &ts)| {
            let timestamp = DateTime::from_timestamp(ts, 0).ok_or_else(|| {
                PolarsError::ComputeError(format!("Invalid timestamp: {}", ts).into())
            })?;
            Ok(Bar {
                timestamp,
                open: open[i],
                high: high[i],
                low: low[i],
                close: close[i],
                volume: volume[i],
            })
        })
        .collect()
}
