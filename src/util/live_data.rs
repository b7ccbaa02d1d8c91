// External crates
use chrono::Local;
use serde::{Deserialize, Serialize};

// Local modules
use super::feature_engineering::latest_rsi;
use super::market_data::{MarketDataError, MarketDataSource, Quote};
use super::pre_processor::{self, column_values, dataframe_to_bars, history_period, normalize_symbol};
use crate::constants::{HISTORY_LIMIT, NEUTRAL_RSI, RSI_PERIOD};

/// Current price snapshot served by `/live`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveSnapshot {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub pct_change: f64,
    pub rsi: f64,
    /// Local wall-clock time, `HH:MM:SS`
    pub last_updated: String,
}

/// One candle as served by `/history`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Epoch milliseconds
    pub date: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Closes of recent daily bars, oldest first; empty when nothing came back
async fn daily_closes(source: &dyn MarketDataSource, symbol: &str, period: &str) -> Vec<f64> {
    pre_processor::fetch_bars(source, symbol, period, "1d")
        .await
        .into_frame()
        .and_then(|df| column_values(&df, "close").ok())
        .unwrap_or_default()
}

/// Quote from the fast path, falling back to the two latest daily closes
async fn quote_with_fallback(source: &dyn MarketDataSource, symbol: &str) -> Result<Quote, MarketDataError> {
    match source.fetch_quote(symbol).await {
        Ok(quote) => Ok(quote),
        Err(e) => {
            log::debug!("Fast quote for {} failed ({}), using daily bars", symbol, e);
            match daily_closes(source, symbol, "5d").await.as_slice() {
                [.., prev, last] => Ok(Quote {
                    last_price: *last,
                    previous_close: *prev,
                }),
                _ => Err(MarketDataError::QuoteUnavailable(symbol.to_string())),
            }
        }
    }
}

/// RSI-14 over one month of daily closes, neutral when the month is too short
pub fn snapshot_rsi(closes: &[f64]) -> f64 {
    if closes.len() <= RSI_PERIOD {
        return NEUTRAL_RSI;
    }
    match latest_rsi(closes, RSI_PERIOD) {
        Ok(rsi) => rsi.unwrap_or(NEUTRAL_RSI),
        Err(e) => {
            log::warn!("RSI calculation failed: {}", e);
            NEUTRAL_RSI
        }
    }
}

pub async fn live_snapshot(source: &dyn MarketDataSource, symbol: &str) -> Result<LiveSnapshot, MarketDataError> {
    let symbol = normalize_symbol(symbol);
    let quote = quote_with_fallback(source, &symbol).await?;

    let change = quote.last_price - quote.previous_close;
    let pct_change = if quote.previous_close != 0.0 {
        change / quote.previous_close * 100.0
    } else {
        0.0
    };
    let rsi = snapshot_rsi(&daily_closes(source, &symbol, "1mo").await);

    Ok(LiveSnapshot {
        symbol,
        price: quote.last_price,
        change,
        pct_change,
        rsi,
        last_updated: Local::now().format("%H:%M:%S").to_string(),
    })
}

/// The most recent candles at `interval`, at most [`HISTORY_LIMIT`] of them.
///
/// Intraday intervals look back one month, everything else one year.
/// Missing data yields an empty list.
pub async fn price_history(source: &dyn MarketDataSource, symbol: &str, interval: &str) -> Vec<Candle> {
    let period = history_period(interval);
    let Some(df) = pre_processor::fetch_bars(source, symbol, period, interval).await.into_frame() else {
        return Vec::new();
    };

    let bars = match dataframe_to_bars(&df) {
        Ok(bars) => bars,
        Err(e) => {
            log::warn!("Converting history for {} failed: {}", symbol, e);
            return Vec::new();
        }
    };

    let skip = bars.len().saturating_sub(HISTORY_LIMIT);
    bars.into_iter()
        .skip(skip)
        .map(|bar| Candle {
            date: bar.timestamp.timestamp_millis(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        })
        .collect()
}
