//! Rule-based trading signals derived from indicator values.

use crate::types::{
    IndicatorSnapshot, Recommendation, Signal, SignalKind, SignalLabel, SignalStrength,
    TradeAction,
};

/// RSI below this is oversold.
pub const RSI_OVERSOLD: f64 = 30.0;
/// RSI above this is overbought.
pub const RSI_OVERBOUGHT: f64 = 70.0;
/// Confidence contributed by each vote on the winning side.
const VOTE_WEIGHT: f64 = 40.0;
/// Confidence reported for a tied (Hold) vote.
const HOLD_CONFIDENCE: f64 = 50.0;

/// Evaluate the signal rule table against a snapshot.
///
/// Each row fires independently, so zero, one, or both indicators can
/// contribute; no signal at all means both are in their neutral zones.
pub fn evaluate(snapshot: &IndicatorSnapshot) -> Vec<Signal> {
    let mut signals = Vec::new();

    if snapshot.rsi < RSI_OVERSOLD {
        signals.push(Signal {
            kind: SignalKind::Rsi,
            label: SignalLabel::Oversold,
            strength: SignalStrength::Strong,
            action: TradeAction::Buy,
        });
    } else if snapshot.rsi > RSI_OVERBOUGHT {
        signals.push(Signal {
            kind: SignalKind::Rsi,
            label: SignalLabel::Overbought,
            strength: SignalStrength::Strong,
            action: TradeAction::Sell,
        });
    }

    if snapshot.macd_histogram > 0.0 && snapshot.macd > snapshot.macd_signal {
        signals.push(Signal {
            kind: SignalKind::Macd,
            label: SignalLabel::Bullish,
            strength: SignalStrength::Medium,
            action: TradeAction::Buy,
        });
    } else if snapshot.macd_histogram < 0.0 && snapshot.macd < snapshot.macd_signal {
        signals.push(Signal {
            kind: SignalKind::Macd,
            label: SignalLabel::Bearish,
            strength: SignalStrength::Medium,
            action: TradeAction::Sell,
        });
    }

    signals
}

/// Aggregate majority vote over the fired signals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vote {
    pub recommendation: Recommendation,
    pub confidence: f64,
}

/// Unweighted majority vote: each signal counts once regardless of strength,
/// and ties (including no signals at all) resolve to Hold at confidence 50.
pub fn tally(signals: &[Signal]) -> Vote {
    let buys = signals
        .iter()
        .filter(|s| s.action == TradeAction::Buy)
        .count();
    let sells = signals
        .iter()
        .filter(|s| s.action == TradeAction::Sell)
        .count();

    if buys > sells {
        Vote {
            recommendation: Recommendation::Buy,
            confidence: (buys as f64 * VOTE_WEIGHT).min(100.0),
        }
    } else if sells > buys {
        Vote {
            recommendation: Recommendation::Sell,
            confidence: (sells as f64 * VOTE_WEIGHT).min(100.0),
        }
    } else {
        Vote {
            recommendation: Recommendation::Hold,
            confidence: HOLD_CONFIDENCE,
        }
    }
}
