// External imports
use serde::{Deserialize, Serialize};

// Internal imports
use crate::constants::{CONFIDENCE_CAP, TREND_STRENGTH_MULTIPLIER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
}

/// Trade levels derived from a next-step forecast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeSignal {
    pub signal: Signal,
    pub target: f64,
    pub stop_loss: f64,
    /// Directional accuracy boosted by trend strength, capped at 98.
    /// A heuristic score, not a probability.
    pub confidence: f64,
}

/// `|forecast - current| / current`, scaled into accuracy points
pub fn trend_strength(forecast: f64, current: f64) -> f64 {
    if current == 0.0 {
        return 0.0;
    }
    (forecast - current).abs() / current * TREND_STRENGTH_MULTIPLIER
}

pub fn generate_signal(forecast: f64, current: f64, atr: f64, accuracy: f64) -> TradeSignal {
    let signal = if forecast > current { Signal::Buy } else { Signal::Sell };

    TradeSignal {
        signal,
        target: forecast + atr,
        stop_loss: current - atr,
        confidence: (accuracy + trend_strength(forecast, current)).min(CONFIDENCE_CAP),
    }
}
