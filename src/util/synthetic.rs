// External crates
use async_trait::async_trait;
use chrono::{DateTime, Duration, DurationRound, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// Internal modules
use super::market_data::{Bar, MarketDataError, MarketDataSource, Quote, RawBars};

/// Parameters of a seeded random walk
#[derive(Debug, Clone)]
pub struct RandomWalk {
    pub seed: u64,
    pub start_price: f64,
    /// Mean per-bar return, e.g. 0.001 for a steady climb
    pub drift: f64,
    /// Half-width of the uniform per-bar return shock
    pub volatility: f64,
}

impl Default for RandomWalk {
    fn default() -> Self {
        Self {
            seed: 42,
            start_price: 100.0,
            drift: 0.0005,
            volatility: 0.02,
        }
    }
}

/// Generate `num_bars` bars ending at `end`, spaced `step` apart
pub fn generate_bars(walk: &RandomWalk, num_bars: usize, end: DateTime<Utc>, step: Duration) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(walk.seed);
    let mut bars = Vec::with_capacity(num_bars);
    let mut close = walk.start_price;

    for i in 0..num_bars {
        let shock = rng.random_range(-walk.volatility..=walk.volatility);
        let open = close;
        close = (open * (1.0 + walk.drift + shock)).max(0.01);

        let wick = open.max(close) * rng.random_range(0.0..=walk.volatility / 2.0);
        let tail = open.min(close) * rng.random_range(0.0..=walk.volatility / 2.0);
        let volume = rng.random_range(500_000.0..1_500_000.0_f64).round();

        let offset = (num_bars - 1 - i) as i32;
        bars.push(Bar {
            timestamp: end - step * offset,
            open,
            high: open.max(close) + wick,
            low: (open.min(close) - tail).max(0.005),
            close,
            volume,
        });
    }

    bars
}

/// Approximate number of bars a period spans at the given interval
pub fn bars_for_period(period: &str, interval: &str) -> usize {
    let trading_days = match period {
        "1d" => 1,
        "5d" => 5,
        "1mo" => 21,
        "3mo" => 63,
        "6mo" => 126,
        "1y" => 252,
        "2y" => 504,
        "5y" => 1260,
        "10y" | "max" => 2520,
        _ => 252,
    };
    let per_day = match interval {
        "15m" => 26,
        "30m" => 13,
        "1h" => 7,
        _ => 1,
    };
    trading_days * per_day
}

fn interval_step(interval: &str) -> Duration {
    match interval {
        "15m" => Duration::minutes(15),
        "30m" => Duration::minutes(30),
        "1h" => Duration::hours(1),
        "1wk" => Duration::weeks(1),
        _ => Duration::days(1),
    }
}

/// Offline market data source backed by a deterministic random walk.
///
/// Every symbol shares the same walk, so repeated requests see the same
/// series. Used for local runs without network access and in tests.
#[derive(Debug, Clone, Default)]
pub struct SyntheticMarketData {
    walk: RandomWalk,
}

impl SyntheticMarketData {
    pub fn new(walk: RandomWalk) -> Self {
        Self { walk }
    }

    fn series(&self, period: &str, interval: &str) -> Vec<Bar> {
        let step = interval_step(interval);
        let end = Utc::now().duration_trunc(step).unwrap_or_else(|_| Utc::now());
        generate_bars(&self.walk, bars_for_period(period, interval), end, step)
    }
}

#[async_trait]
impl MarketDataSource for SyntheticMarketData {
    async fn fetch_bars(
        &self,
        _symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<RawBars, MarketDataError> {
        Ok(RawBars::from_bars(&self.series(period, interval)))
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let bars = self.series("5d", "1d");
        match bars.as_slice() {
            [.., prev, last] => Ok(Quote {
                last_price: last.close,
                previous_close: prev.close,
            }),
            _ => Err(MarketDataError::QuoteUnavailable(symbol.to_string())),
        }
    }
}
