// External imports
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

// Internal imports
use crate::constants::{
    MIN_BARS_FOR_TRAINING, PREDICTION_PERIOD, SEQUENCE_LENGTH, TRAIN_SPLIT_RATIO,
};
use crate::lstm::step_3_lstm_model_arch::ModelConfig;
use crate::lstm::step_4_train_model::TrainingConfig;
use crate::util::market_data::YAHOO_BASE_URL;

/// Where bars and quotes come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceKind {
    Yahoo,
    Synthetic,
}

impl FromStr for DataSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yahoo" => Ok(DataSourceKind::Yahoo),
            "synthetic" => Ok(DataSourceKind::Synthetic),
            other => Err(format!("unknown market data source '{}'", other)),
        }
    }
}

/// Everything one prediction run needs besides the bars themselves
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub period: String,
    pub interval: String,
    pub min_bars: usize,
    pub sequence_length: usize,
    pub train_ratio: f64,
    pub model: ModelConfig,
    pub training: TrainingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            period: PREDICTION_PERIOD.to_string(),
            interval: "1d".to_string(),
            min_bars: MIN_BARS_FOR_TRAINING,
            sequence_length: SEQUENCE_LENGTH,
            train_ratio: TRAIN_SPLIT_RATIO,
            model: ModelConfig::default(),
            training: TrainingConfig::default(),
        }
    }
}

/// Process-level settings read once at startup.
///
/// # Environment variables
///
/// - `API_HOST` (default `0.0.0.0`)
/// - `API_PORT` (default `5000`)
/// - `TRAINING_TIMEOUT_SECS` (default `300`)
/// - `MARKET_DATA_SOURCE`: `yahoo` or `synthetic` (default `yahoo`)
/// - `YAHOO_BASE_URL`
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub training_timeout: Duration,
    pub data_source: DataSourceKind,
    pub yahoo_base_url: String,
    pub pipeline: PipelineConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            training_timeout: Duration::from_secs(300),
            data_source: DataSourceKind::Yahoo,
            yahoo_base_url: YAHOO_BASE_URL.to_string(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var("API_HOST").unwrap_or(defaults.host);
        let port = std::env::var("API_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);
        let training_timeout = std::env::var("TRAINING_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.training_timeout);
        let data_source = match std::env::var("MARKET_DATA_SOURCE") {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                log::warn!("{}, falling back to yahoo", e);
                DataSourceKind::Yahoo
            }),
            Err(_) => defaults.data_source,
        };
        let yahoo_base_url = std::env::var("YAHOO_BASE_URL").unwrap_or(defaults.yahoo_base_url);

        Self {
            host,
            port,
            training_timeout,
            data_source,
            yahoo_base_url,
            pipeline: defaults.pipeline,
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}
