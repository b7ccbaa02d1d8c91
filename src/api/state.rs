// External imports
use std::sync::Arc;

// Internal imports
use crate::config::{DataSourceKind, ServiceConfig};
use crate::util::market_data::{MarketDataError, MarketDataSource, YahooFinanceClient};
use crate::util::synthetic::SyntheticMarketData;

/// Shared, read-only state handed to every handler.
///
/// Holds configuration and the market data client only; models and
/// scalers live and die inside a single request.
pub struct AppState {
    pub config: ServiceConfig,
    pub source: Arc<dyn MarketDataSource>,
    pub version: &'static str,
}

impl AppState {
    pub fn new(config: ServiceConfig, source: Arc<dyn MarketDataSource>) -> Self {
        Self {
            config,
            source,
            version: crate::build_info::PKG_VERSION,
        }
    }

    /// Build state with the data source named in `config`
    pub fn from_config(config: ServiceConfig) -> Result<Self, MarketDataError> {
        let source: Arc<dyn MarketDataSource> = match config.data_source {
            DataSourceKind::Yahoo => Arc::new(YahooFinanceClient::new(config.yahoo_base_url.clone())?),
            DataSourceKind::Synthetic => Arc::new(SyntheticMarketData::default()),
        };
        Ok(Self::new(config, source))
    }
}
