// External crates
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One trading interval of OHLCV data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Column-oriented bars exactly as an upstream source returns them.
///
/// Values may be missing (`None`) and rows are not guaranteed to be ordered
/// or unique; the pre-processor is responsible for flattening this into
/// clean rows.
#[derive(Debug, Clone, Default)]
pub struct RawBars {
    pub timestamps: Vec<i64>,
    pub open: Vec<Option<f64>>,
    pub high: Vec<Option<f64>>,
    pub low: Vec<Option<f64>>,
    pub close: Vec<Option<f64>>,
    pub volume: Vec<Option<f64>>,
}

impl RawBars {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Build a raw column set from already clean bars
    pub fn from_bars(bars: &[Bar]) -> Self {
        Self {
            timestamps: bars.iter().map(|b| b.timestamp.timestamp()).collect(),
            open: bars.iter().map(|b| Some(b.open)).collect(),
            high: bars.iter().map(|b| Some(b.high)).collect(),
            low: bars.iter().map(|b| Some(b.low)).collect(),
            close: bars.iter().map(|b| Some(b.close)).collect(),
            volume: bars.iter().map(|b| Some(b.volume)).collect(),
        }
    }
}

/// Fast-path quote: last traded price and the previous session close
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub last_price: f64,
    pub previous_close: f64,
}

/// Errors raised by a market data source
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream error for {symbol}: {message}")]
    Upstream { symbol: String, message: String },

    #[error("No data available for symbol: {0}")]
    NoData(String),

    #[error("Quote unavailable for symbol: {0}")]
    QuoteUnavailable(String),

    #[error("No symbol provided")]
    MissingSymbol,
}

/// Black-box source of historical bars and quotes
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch bars covering `period` (e.g. "5y", "1mo") at the given `interval`
    async fn fetch_bars(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<RawBars, MarketDataError>;

    /// Fetch the latest price and the previous close
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, MarketDataError>;
}

pub const YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo Finance v8 chart API client
pub struct YahooFinanceClient {
    client: reqwest::Client,
    base_url: String,
}

impl YahooFinanceClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, MarketDataError> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; price-signal-forecaster)")
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn chart(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<ChartResult, MarketDataError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        log::debug!("Requesting {} range={} interval={}", url, period, interval);

        let response: ChartResponse = self
            .client
            .get(&url)
            .query(&[("range", period), ("interval", interval)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.chart.error {
            return Err(MarketDataError::Upstream {
                symbol: symbol.to_string(),
                message: format!("{}: {}", err.code, err.description),
            });
        }

        response
            .chart
            .result
            .and_then(|mut results| {
                if results.is_empty() {
                    None
                } else {
                    Some(results.swap_remove(0))
                }
            })
            .ok_or_else(|| MarketDataError::NoData(symbol.to_string()))
    }
}

#[async_trait]
impl MarketDataSource for YahooFinanceClient {
    async fn fetch_bars(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<RawBars, MarketDataError> {
        let result = self.chart(symbol, period, interval).await?;
        let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

        Ok(RawBars {
            timestamps: result.timestamp,
            open: quote.open,
            high: quote.high,
            low: quote.low,
            close: quote.close,
            volume: quote.volume,
        })
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let result = self.chart(symbol, "1d", "1d").await?;
        let meta = result.meta;
        let previous_close = meta.previous_close.or(meta.chart_previous_close);

        match (meta.regular_market_price, previous_close) {
            (Some(last_price), Some(previous_close)) if previous_close != 0.0 => Ok(Quote {
                last_price,
                previous_close,
            }),
            _ => Err(MarketDataError::QuoteUnavailable(symbol.to_string())),
        }
    }
}

// Yahoo v8 chart response, only the fields we read

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
    previous_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteColumns {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}
