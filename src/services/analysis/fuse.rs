//! Fuses the forecast trend with the technical vote into one recommendation.

use chrono::Utc;

use super::signals::{RSI_OVERBOUGHT, RSI_OVERSOLD};
use crate::types::analysis::round2;
use crate::types::{
    CombinedAnalysis, Forecast, Reason, Recommendation, SignalStrength, TechnicalAnalysis, Trend,
    Verdict,
};

/// Confidence bonus when the forecast and the technicals agree (or the
/// technicals abstain), capped at 100.
const AGREEMENT_BONUS: f64 = 15.0;
/// Fixed confidence when the two inputs point opposite ways.
const CONFLICT_CONFIDENCE: f64 = 50.0;
/// Reasons are truncated to this many, highest priority first.
const MAX_REASONS: usize = 5;

/// Combine a forecast and a technical analysis for the same symbol.
pub fn combine(forecast: Forecast, technical: TechnicalAnalysis) -> CombinedAnalysis {
    let (final_recommendation, final_confidence) = verdict(&forecast, &technical);
    let reasons = build_reasons(&forecast, &technical);

    CombinedAnalysis {
        symbol: forecast.symbol.clone(),
        forecast,
        technical,
        final_recommendation,
        final_confidence: round2(final_confidence),
        reasons,
        generated_at: Utc::now(),
    }
}

/// The fusion table. Branches are evaluated in order and the first match
/// wins: agreement (or a Hold abstention) upgrades the forecast direction to
/// its Strong form with a confidence bonus, a direct conflict drops to Hold
/// at fixed confidence.
fn verdict(forecast: &Forecast, technical: &TechnicalAnalysis) -> (Verdict, f64) {
    let pred_action = match forecast.trend {
        Trend::Up => Recommendation::Buy,
        Trend::Down => Recommendation::Sell,
    };
    let tech_action = technical.recommendation;
    let averaged = (forecast.confidence_score + technical.confidence) / 2.0;

    if pred_action == Recommendation::Buy
        && matches!(tech_action, Recommendation::Buy | Recommendation::Hold)
    {
        (Verdict::StrongBuy, (averaged + AGREEMENT_BONUS).min(100.0))
    } else if pred_action == Recommendation::Sell
        && matches!(tech_action, Recommendation::Sell | Recommendation::Hold)
    {
        (Verdict::StrongSell, (averaged + AGREEMENT_BONUS).min(100.0))
    } else if pred_action == tech_action {
        // Not reachable after the two branches above for the current signal
        // set; kept so the table stays total if a third vote source appears.
        (Verdict::from(pred_action), averaged)
    } else {
        (Verdict::Hold, CONFLICT_CONFIDENCE)
    }
}

/// Reasons in priority order: the forecast move first, then the RSI zone if
/// it left the neutral band, then MACD momentum if the histogram is signed,
/// then one entry per strong signal.
fn build_reasons(forecast: &Forecast, technical: &TechnicalAnalysis) -> Vec<Reason> {
    let mut reasons = Vec::new();

    reasons.push(Reason::ForecastMove {
        trend: forecast.trend,
        change_percent: forecast.change_percent,
        horizon_days: forecast.horizon_days,
    });

    let snapshot = &technical.indicators;
    if snapshot.rsi < RSI_OVERSOLD {
        reasons.push(Reason::RsiOversold { rsi: snapshot.rsi });
    } else if snapshot.rsi > RSI_OVERBOUGHT {
        reasons.push(Reason::RsiOverbought { rsi: snapshot.rsi });
    }

    if snapshot.macd_histogram > 0.0 {
        reasons.push(Reason::MacdMomentum { bullish: true });
    } else if snapshot.macd_histogram < 0.0 {
        reasons.push(Reason::MacdMomentum { bullish: false });
    }

    for signal in &technical.signals {
        if signal.strength == SignalStrength::Strong {
            reasons.push(Reason::StrongSignal {
                kind: signal.kind,
                label: signal.label,
            });
        }
    }

    reasons.truncate(MAX_REASONS);
    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IndicatorSnapshot, Signal, SignalKind, SignalLabel, TradeAction};

    fn forecast(trend: Trend, confidence: f64) -> Forecast {
        let (predicted, change) = match trend {
            Trend::Up => (105.0, 5.0),
            Trend::Down => (95.0, -5.0),
        };
        Forecast {
            symbol: "TEST".to_string(),
            current_price: 100.0,
            predicted_price: predicted,
            trend,
            change_percent: change,
            confidence_score: confidence,
            points: Vec::new(),
            horizon_days: 7,
            generated_at: Utc::now(),
        }
    }

    fn technical(recommendation: Recommendation, confidence: f64) -> TechnicalAnalysis {
        TechnicalAnalysis {
            symbol: "TEST".to_string(),
            indicators: IndicatorSnapshot::neutral(),
            signals: Vec::new(),
            recommendation,
            confidence,
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_fusion_table_exhaustive() {
        // Every (forecast trend, technical vote) pair against the table.
        let grid = [
            (Trend::Up, Recommendation::Buy, Verdict::StrongBuy),
            (Trend::Up, Recommendation::Hold, Verdict::StrongBuy),
            (Trend::Up, Recommendation::Sell, Verdict::Hold),
            (Trend::Down, Recommendation::Sell, Verdict::StrongSell),
            (Trend::Down, Recommendation::Hold, Verdict::StrongSell),
            (Trend::Down, Recommendation::Buy, Verdict::Hold),
        ];

        for (trend, tech, expected) in grid {
            let combined = combine(forecast(trend, 80.0), technical(tech, 60.0));
            assert_eq!(
                combined.final_recommendation, expected,
                "trend {:?} with tech {:?}",
                trend, tech
            );

            let expected_confidence = match expected {
                Verdict::StrongBuy | Verdict::StrongSell => (80.0 + 60.0) / 2.0 + 15.0,
                Verdict::Hold => 50.0,
                other => panic!("table produced unexpected verdict {:?}", other),
            };
            assert_eq!(
                combined.final_confidence, expected_confidence,
                "trend {:?} with tech {:?}",
                trend, tech
            );
        }
    }

    #[test]
    fn test_agreement_confidence_caps_at_100() {
        let combined = combine(
            forecast(Trend::Up, 96.0),
            technical(Recommendation::Buy, 98.0),
        );
        assert_eq!(combined.final_recommendation, Verdict::StrongBuy);
        assert_eq!(combined.final_confidence, 100.0);
    }

    #[test]
    fn test_conflict_confidence_is_fixed() {
        // Confidence inputs must not leak into the conflict branch.
        let combined = combine(
            forecast(Trend::Up, 99.0),
            technical(Recommendation::Sell, 99.0),
        );
        assert_eq!(combined.final_recommendation, Verdict::Hold);
        assert_eq!(combined.final_confidence, 50.0);
    }

    #[test]
    fn test_confidence_rounded_to_two_decimals() {
        let combined = combine(
            forecast(Trend::Up, 70.333),
            technical(Recommendation::Buy, 60.111),
        );
        // avg 65.222 + 15 = 80.222
        assert_eq!(combined.final_confidence, 80.22);
    }

    #[test]
    fn test_first_reason_is_forecast_move() {
        let combined = combine(
            forecast(Trend::Down, 70.0),
            technical(Recommendation::Sell, 40.0),
        );
        assert!(matches!(
            combined.reasons[0],
            Reason::ForecastMove {
                trend: Trend::Down,
                ..
            }
        ));
    }

    #[test]
    fn test_rsi_and_macd_reasons_when_outside_neutral_zones() {
        let mut tech = technical(Recommendation::Sell, 40.0);
        tech.indicators = IndicatorSnapshot {
            rsi: 78.5,
            macd: -1.0,
            macd_signal: -0.5,
            macd_histogram: -0.5,
        };

        let combined = combine(forecast(Trend::Down, 70.0), tech);
        assert!(combined
            .reasons
            .iter()
            .any(|r| matches!(r, Reason::RsiOverbought { rsi } if *rsi == 78.5)));
        assert!(combined
            .reasons
            .iter()
            .any(|r| matches!(r, Reason::MacdMomentum { bullish: false })));
    }

    #[test]
    fn test_neutral_indicators_add_no_reasons() {
        let combined = combine(
            forecast(Trend::Up, 70.0),
            technical(Recommendation::Hold, 50.0),
        );
        // Neutral snapshot: only the forecast sentence.
        assert_eq!(combined.reasons.len(), 1);
    }

    #[test]
    fn test_reasons_truncated_to_five() {
        let strong = |label, action| Signal {
            kind: SignalKind::Rsi,
            label,
            strength: SignalStrength::Strong,
            action,
        };
        let mut tech = technical(Recommendation::Sell, 80.0);
        tech.indicators = IndicatorSnapshot {
            rsi: 85.0,
            macd: -2.0,
            macd_signal: -1.0,
            macd_histogram: -1.0,
        };
        // Four strong signals on top of forecast + RSI + MACD reasons.
        tech.signals = vec![
            strong(SignalLabel::Overbought, TradeAction::Sell),
            strong(SignalLabel::Overbought, TradeAction::Sell),
            strong(SignalLabel::Bearish, TradeAction::Sell),
            strong(SignalLabel::Bearish, TradeAction::Sell),
        ];

        let combined = combine(forecast(Trend::Down, 70.0), tech);
        assert_eq!(combined.reasons.len(), 5);
        // Truncation keeps the priority order: forecast, RSI zone, MACD.
        assert!(matches!(combined.reasons[0], Reason::ForecastMove { .. }));
        assert!(matches!(combined.reasons[1], Reason::RsiOverbought { .. }));
        assert!(matches!(combined.reasons[2], Reason::MacdMomentum { .. }));
        assert!(matches!(combined.reasons[3], Reason::StrongSignal { .. }));
        assert!(matches!(combined.reasons[4], Reason::StrongSignal { .. }));
    }

    #[test]
    fn test_combined_carries_symbol_and_inputs() {
        let combined = combine(
            forecast(Trend::Up, 80.0),
            technical(Recommendation::Buy, 60.0),
        );
        assert_eq!(combined.symbol, "TEST");
        assert_eq!(combined.forecast.trend, Trend::Up);
        assert_eq!(combined.technical.recommendation, Recommendation::Buy);
    }
}
