//! RSI and MACD computed over a daily close series.
//!
//! Callers consume only the latest value of each indicator, but the full
//! series is always computed so the last point matches the textbook
//! definitions exactly.

use crate::types::{IndicatorSnapshot, PriceSeries};

/// RSI lookback window.
pub const RSI_PERIOD: usize = 14;
/// MACD fast EMA span.
pub const MACD_FAST: usize = 12;
/// MACD slow EMA span.
pub const MACD_SLOW: usize = 26;
/// MACD signal-line EMA span.
pub const MACD_SIGNAL: usize = 9;

/// Recursive exponential moving average with smoothing factor
/// alpha = 2 / (span + 1), seeded with the first value (no SMA warm-up).
///
/// Output has the same length as the input; empty input yields empty output.
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let Some(&first) = values.first() else {
        return Vec::new();
    };

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    out.push(first);

    for &value in &values[1..] {
        let prev = out[out.len() - 1];
        out.push(alpha * value + (1.0 - alpha) * prev);
    }

    out
}

/// Full RSI series using a simple rolling mean of gains and losses over
/// `period` samples (not the exponential Wilder smoothing).
///
/// One output value per close from index `period` onward; fewer than
/// `period + 1` closes yield an empty series and the caller falls back to
/// the neutral 50. When the rolling average loss is zero the RSI saturates
/// at 100 rather than dividing by zero.
pub fn rsi(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() < period + 1 {
        return Vec::new();
    }

    let mut gains = Vec::with_capacity(closes.len() - 1);
    let mut losses = Vec::with_capacity(closes.len() - 1);

    for i in 1..closes.len() {
        let change = closes[i] - closes[i - 1];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(-change);
        }
    }

    let mut out = Vec::with_capacity(gains.len() + 1 - period);
    for end in period..=gains.len() {
        let avg_gain: f64 = gains[end - period..end].iter().sum::<f64>() / period as f64;
        let avg_loss: f64 = losses[end - period..end].iter().sum::<f64>() / period as f64;

        if avg_loss == 0.0 {
            out.push(100.0);
        } else {
            let rs = avg_gain / avg_loss;
            out.push(100.0 - 100.0 / (1.0 + rs));
        }
    }

    out
}

/// MACD line, signal line, and histogram, all full series.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// MACD over a close series: macd = EMA(fast) - EMA(slow), signal =
/// EMA(macd, signal_period), histogram = macd - signal.
///
/// Because both EMAs are seeded from the first value, every output series
/// has the same length as the input.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdSeries {
    let fast_ema = ema(closes, fast);
    let slow_ema = ema(closes, slow);

    let macd_line: Vec<f64> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema(&macd_line, signal_period);
    let histogram = macd_line
        .iter()
        .zip(signal_line.iter())
        .map(|(m, s)| m - s)
        .collect();

    MacdSeries {
        macd: macd_line,
        signal: signal_line,
        histogram,
    }
}

/// Latest indicator values for a series, with the soft fallbacks: too few
/// closes for the RSI window yields the neutral 50, and fewer than
/// `MACD_SLOW + MACD_SIGNAL` closes yields zeroed MACD components. These are
/// degenerate-but-valid outputs, not errors.
pub fn snapshot(series: &PriceSeries) -> IndicatorSnapshot {
    let closes = series.closes();

    let rsi_value = rsi(&closes, RSI_PERIOD).last().copied().unwrap_or(50.0);

    let (macd_value, signal_value, histogram_value) = if closes.len() < MACD_SLOW + MACD_SIGNAL {
        (0.0, 0.0, 0.0)
    } else {
        let series = macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        (
            series.macd.last().copied().unwrap_or(0.0),
            series.signal.last().copied().unwrap_or(0.0),
            series.histogram.last().copied().unwrap_or(0.0),
        )
    };

    IndicatorSnapshot {
        rsi: rsi_value,
        macd: macd_value,
        macd_signal: signal_value,
        macd_histogram: histogram_value,
    }
}
