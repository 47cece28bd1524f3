use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Direction of the forecasted price move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

impl Trend {
    /// Get display label for this trend.
    pub fn label(&self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
        }
    }
}

/// A single forecasted day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_price: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Prediction interval width relative to the predicted price,
    /// (upper - lower) / predicted. Stored raw: it can leave [0, 1] for
    /// volatile or near-zero-price series, and consumers clamp if needed.
    pub interval_width_ratio: f64,
}

/// Multi-day price forecast for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub symbol: String,
    pub current_price: f64,
    /// Predicted price at the final horizon day.
    pub predicted_price: f64,
    pub trend: Trend,
    pub change_percent: f64,
    /// Model confidence (0-100), inverse of average interval width.
    pub confidence_score: f64,
    pub points: Vec<ForecastPoint>,
    pub horizon_days: u32,
    pub generated_at: DateTime<Utc>,
}

/// Indicator that produced a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalKind {
    Rsi,
    Macd,
}

impl SignalKind {
    /// Get display label for this kind.
    pub fn label(&self) -> &'static str {
        match self {
            SignalKind::Rsi => "RSI",
            SignalKind::Macd => "MACD",
        }
    }
}

/// Market condition a signal describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalLabel {
    Oversold,
    Overbought,
    Bullish,
    Bearish,
}

impl SignalLabel {
    /// Get display label for this condition.
    pub fn label(&self) -> &'static str {
        match self {
            SignalLabel::Oversold => "OVERSOLD",
            SignalLabel::Overbought => "OVERBOUGHT",
            SignalLabel::Bullish => "BULLISH",
            SignalLabel::Bearish => "BEARISH",
        }
    }
}

/// How decisive a signal is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStrength {
    Weak,
    Medium,
    Strong,
}

/// Suggested direction for a single signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

/// A discrete categorical signal derived from one indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub label: SignalLabel,
    pub strength: SignalStrength,
    pub action: TradeAction,
}

/// Aggregate vote across all fired signals: Buy, Sell, or Hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
}

impl Recommendation {
    /// Get display label for this recommendation.
    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::Buy => "BUY",
            Recommendation::Sell => "SELL",
            Recommendation::Hold => "HOLD",
        }
    }
}

/// Final fused recommendation across forecast and technical signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    StrongBuy,
    Buy,
    Sell,
    StrongSell,
    Hold,
}

impl Verdict {
    /// Get display label for this verdict.
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::StrongBuy => "STRONG_BUY",
            Verdict::Buy => "BUY",
            Verdict::Sell => "SELL",
            Verdict::StrongSell => "STRONG_SELL",
            Verdict::Hold => "HOLD",
        }
    }
}

impl From<Recommendation> for Verdict {
    fn from(action: Recommendation) -> Self {
        match action {
            Recommendation::Buy => Verdict::Buy,
            Recommendation::Sell => Verdict::Sell,
            Recommendation::Hold => Verdict::Hold,
        }
    }
}

/// Latest RSI and MACD values derived from a price series.
///
/// Stateless: recomputed on every call from the series, never stored apart
/// from the analysis that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSnapshot {
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
}

impl IndicatorSnapshot {
    /// Neutral snapshot used when the series is too short for an indicator.
    pub fn neutral() -> Self {
        Self {
            rsi: 50.0,
            macd: 0.0,
            macd_signal: 0.0,
            macd_histogram: 0.0,
        }
    }

    /// Copy with every value rounded to two decimals for display.
    pub fn rounded(&self) -> Self {
        Self {
            rsi: round2(self.rsi),
            macd: round2(self.macd),
            macd_signal: round2(self.macd_signal),
            macd_histogram: round2(self.macd_histogram),
        }
    }
}

/// Technical-indicator analysis for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalAnalysis {
    pub symbol: String,
    pub indicators: IndicatorSnapshot,
    pub signals: Vec<Signal>,
    pub recommendation: Recommendation,
    /// Vote confidence (0-100).
    pub confidence: f64,
    pub generated_at: DateTime<Utc>,
}

/// Structured justification for a combined recommendation.
///
/// Carries the numeric parameters rather than rendered text; the sentence is
/// produced by [`Reason::describe`] at the serialization boundary, keeping
/// wording out of the analysis path.
#[derive(Debug, Clone, PartialEq)]
pub enum Reason {
    /// Forecast direction and magnitude over the horizon.
    ForecastMove {
        trend: Trend,
        change_percent: f64,
        horizon_days: u32,
    },
    /// RSI left the neutral [30, 70] band.
    RsiOversold { rsi: f64 },
    RsiOverbought { rsi: f64 },
    /// MACD histogram sign.
    MacdMomentum { bullish: bool },
    /// One entry per strong-strength signal.
    StrongSignal { kind: SignalKind, label: SignalLabel },
}

impl Reason {
    /// Render the reason as a human-readable sentence.
    pub fn describe(&self) -> String {
        match self {
            Reason::ForecastMove {
                trend: Trend::Up,
                change_percent,
                horizon_days,
            } => format!(
                "Model projects a {:.2}% rise over the next {} days",
                change_percent.abs(),
                horizon_days
            ),
            Reason::ForecastMove {
                trend: Trend::Down,
                change_percent,
                horizon_days,
            } => format!(
                "Model projects a {:.2}% decline over the next {} days",
                change_percent.abs(),
                horizon_days
            ),
            Reason::RsiOversold { rsi } => {
                format!("RSI at {:.2} signals oversold conditions (potential rebound)", rsi)
            }
            Reason::RsiOverbought { rsi } => {
                format!("RSI at {:.2} signals overbought conditions (potential pullback)", rsi)
            }
            Reason::MacdMomentum { bullish: true } => "MACD shows bullish momentum".to_string(),
            Reason::MacdMomentum { bullish: false } => "MACD shows bearish momentum".to_string(),
            Reason::StrongSignal { kind, label } => {
                format!("{}: {}", kind.label(), label.label())
            }
        }
    }
}

impl Serialize for Reason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.describe())
    }
}

/// Forecast and technical analysis fused into one recommendation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedAnalysis {
    pub symbol: String,
    pub forecast: Forecast,
    pub technical: TechnicalAnalysis,
    pub final_recommendation: Verdict,
    pub final_confidence: f64,
    /// At most five, highest-priority first.
    pub reasons: Vec<Reason>,
    pub generated_at: DateTime<Utc>,
}

/// Round to two decimal places for display values.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
