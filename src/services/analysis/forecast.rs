//! Additive decomposition price forecaster.
//!
//! Fits piecewise-linear trend plus weekly and daily Fourier seasonality to
//! the close series (no yearly component: the lookback window is far too
//! short to estimate one). The trend may bend at up to 25 candidate
//! changepoints spread over the first 80% of history, with the rate
//! adjustments shrunk by a conservative ridge penalty so the fit favors
//! smooth trends over chasing recent noise. Prediction intervals widen with
//! the square root of horizon (95%, z = 1.96) around the residual error of
//! the fit.

use std::f64::consts::PI;

use chrono::{Duration, NaiveDate, Utc};

use crate::error::{AppError, Result};
use crate::types::analysis::round2;
use crate::types::{Forecast, ForecastPoint, PriceSeries, Trend, MIN_HISTORY_POINTS};

/// Maximum number of trend changepoints.
const CHANGEPOINT_COUNT: usize = 25;
/// Fraction of history eligible for changepoints.
const CHANGEPOINT_RANGE: f64 = 0.8;
/// Prior scale for changepoint rate adjustments; the ridge penalty is its
/// inverse square, so a small scale means a stiff trend.
const CHANGEPOINT_PRIOR_SCALE: f64 = 0.05;
/// Prior scale for seasonal coefficients.
const SEASONALITY_PRIOR_SCALE: f64 = 10.0;
/// Weekly seasonality: period in days and Fourier order.
const WEEKLY_PERIOD: f64 = 7.0;
const WEEKLY_ORDER: usize = 3;
/// Daily seasonality: inert at one sample per day, but part of the
/// decomposition and cheap to carry with the shared Fourier basis.
const DAILY_PERIOD: f64 = 1.0;
const DAILY_ORDER: usize = 4;
/// Near-zero penalty keeping the intercept and base slope unconstrained
/// while guaranteeing a positive-definite system.
const BASE_PENALTY: f64 = 1e-8;
/// z-score for a 95% prediction interval.
const Z_95: f64 = 1.96;

/// Forecast `horizon_days` daily closes beyond the end of the series.
///
/// Fails with `InsufficientData` before any fitting work when the series is
/// shorter than [`MIN_HISTORY_POINTS`], and with `Computation` when the fit
/// degenerates numerically.
pub fn run(symbol: &str, series: &PriceSeries, horizon_days: u32) -> Result<Forecast> {
    if series.len() < MIN_HISTORY_POINTS {
        return Err(AppError::InsufficientData(format!(
            "forecast for {} needs at least {} daily closes, got {}",
            symbol,
            MIN_HISTORY_POINTS,
            series.len()
        )));
    }

    let model = DecompositionModel::fit(series)?;

    // len >= MIN_HISTORY_POINTS, so a last point exists.
    let (last_date, current_price) = match series.last() {
        Some(point) => (point.date, point.close),
        None => {
            return Err(AppError::InsufficientData(format!(
                "no history available for {}",
                symbol
            )))
        }
    };

    let mut points = Vec::with_capacity(horizon_days as usize);
    for day in 1..=horizon_days {
        let date = last_date + Duration::days(i64::from(day));
        let predicted = model.predict(date);
        if !predicted.is_finite() {
            return Err(AppError::Computation(format!(
                "forecast for {} produced a non-finite prediction",
                symbol
            )));
        }

        let half_width = Z_95 * model.sigma * f64::from(day).sqrt();
        let lower_bound = predicted - half_width;
        let upper_bound = predicted + half_width;

        points.push(ForecastPoint {
            date,
            predicted_price: predicted,
            lower_bound,
            upper_bound,
            // Raw ratio, deliberately unclamped: it can leave [0, 1] for
            // volatile or near-zero predictions and consumers clamp instead.
            interval_width_ratio: (upper_bound - lower_bound) / predicted,
        });
    }

    let Some(final_point) = points.last() else {
        return Err(AppError::BadRequest(
            "forecast horizon must be at least one day".to_string(),
        ));
    };

    let predicted_price = final_point.predicted_price;
    let trend = if predicted_price > current_price {
        Trend::Up
    } else {
        Trend::Down
    };
    let change_percent = (predicted_price - current_price) / current_price * 100.0;

    let avg_width = points
        .iter()
        .map(|p| p.upper_bound - p.lower_bound)
        .sum::<f64>()
        / points.len() as f64;
    let confidence_score = (100.0 - avg_width / current_price * 100.0).clamp(0.0, 100.0);

    Ok(Forecast {
        symbol: symbol.to_string(),
        current_price,
        predicted_price,
        trend,
        change_percent: round2(change_percent),
        confidence_score: round2(confidence_score),
        points,
        horizon_days,
        generated_at: Utc::now(),
    })
}

/// Fitted decomposition model.
struct DecompositionModel {
    coefficients: Vec<f64>,
    changepoints: Vec<f64>,
    first_date: NaiveDate,
    span_days: f64,
    value_scale: f64,
    /// Residual standard error of the fit, in price units.
    sigma: f64,
}

impl DecompositionModel {
    fn fit(series: &PriceSeries) -> Result<Self> {
        let points = series.points();
        let first_date = points[0].date;

        // Observation times in days since the first close. The trend uses
        // time scaled to [0, 1] over the history span; the Fourier terms
        // need real day units to keep their periods meaningful.
        let t_days: Vec<f64> = points
            .iter()
            .map(|p| (p.date - first_date).num_days() as f64)
            .collect();
        let span_days = t_days[t_days.len() - 1].max(1.0);
        let t_scaled: Vec<f64> = t_days.iter().map(|t| t / span_days).collect();

        let value_scale = points
            .iter()
            .map(|p| p.close)
            .fold(f64::MIN, f64::max)
            .max(f64::EPSILON);
        let y: Vec<f64> = points.iter().map(|p| p.close / value_scale).collect();

        let changepoints = changepoint_times(&t_scaled);

        let rows: Vec<Vec<f64>> = t_scaled
            .iter()
            .zip(t_days.iter())
            .map(|(&ts, &td)| basis_row(ts, td, &changepoints))
            .collect();
        let penalties = penalty_diagonal(changepoints.len());

        let dim = penalties.len();
        let mut normal = vec![vec![0.0; dim]; dim];
        let mut rhs = vec![0.0; dim];
        for (row, &target) in rows.iter().zip(y.iter()) {
            for i in 0..dim {
                rhs[i] += row[i] * target;
                for j in 0..=i {
                    normal[i][j] += row[i] * row[j];
                }
            }
        }
        for i in 0..dim {
            for j in 0..i {
                normal[j][i] = normal[i][j];
            }
            normal[i][i] += penalties[i];
        }

        let coefficients = cholesky_solve(&normal, &rhs).ok_or_else(|| {
            AppError::Computation("trend fit produced a degenerate linear system".to_string())
        })?;

        let mut ssr = 0.0;
        for (row, point) in rows.iter().zip(points.iter()) {
            let fitted = dot(row, &coefficients) * value_scale;
            let residual = point.close - fitted;
            ssr += residual * residual;
        }
        let sigma = (ssr / (points.len() as f64 - 2.0)).sqrt();
        if !sigma.is_finite() {
            return Err(AppError::Computation(
                "trend fit produced non-finite residuals".to_string(),
            ));
        }

        Ok(Self {
            coefficients,
            changepoints,
            first_date,
            span_days,
            value_scale,
            sigma,
        })
    }

    /// Predicted close for a date. Dates past the end of history extend the
    /// trend at its final piecewise rate; every changepoint stays active.
    fn predict(&self, date: NaiveDate) -> f64 {
        let t_day = (date - self.first_date).num_days() as f64;
        let row = basis_row(t_day / self.span_days, t_day, &self.changepoints);
        dot(&row, &self.coefficients) * self.value_scale
    }
}

/// Candidate changepoint locations (in scaled time): evenly spaced over the
/// observations in the first `CHANGEPOINT_RANGE` of history.
fn changepoint_times(t_scaled: &[f64]) -> Vec<f64> {
    let hist_size = (t_scaled.len() as f64 * CHANGEPOINT_RANGE).floor() as usize;
    if hist_size < 2 {
        return Vec::new();
    }

    let count = CHANGEPOINT_COUNT.min(hist_size - 1);
    let mut times = Vec::with_capacity(count);
    for j in 1..=count {
        let idx = ((j * (hist_size - 1)) as f64 / count as f64).round() as usize;
        let t = t_scaled[idx];
        if t > 0.0 && times.last().is_none_or(|&prev| t > prev) {
            times.push(t);
        }
    }
    times
}

/// One design-matrix row: intercept, base slope, changepoint hinges, then
/// weekly and daily Fourier terms.
fn basis_row(t_scaled: f64, t_days: f64, changepoints: &[f64]) -> Vec<f64> {
    let mut row = Vec::with_capacity(2 + changepoints.len() + 2 * (WEEKLY_ORDER + DAILY_ORDER));
    row.push(1.0);
    row.push(t_scaled);
    for &cp in changepoints {
        row.push((t_scaled - cp).max(0.0));
    }
    push_fourier(&mut row, t_days, WEEKLY_PERIOD, WEEKLY_ORDER);
    push_fourier(&mut row, t_days, DAILY_PERIOD, DAILY_ORDER);
    row
}

fn push_fourier(row: &mut Vec<f64>, t_days: f64, period: f64, order: usize) {
    for k in 1..=order {
        let angle = 2.0 * PI * k as f64 * t_days / period;
        row.push(angle.sin());
        row.push(angle.cos());
    }
}

/// Ridge penalty per coefficient, matching the basis_row layout.
fn penalty_diagonal(changepoint_count: usize) -> Vec<f64> {
    let mut penalties = vec![BASE_PENALTY; 2];
    penalties.extend(std::iter::repeat_n(
        1.0 / (CHANGEPOINT_PRIOR_SCALE * CHANGEPOINT_PRIOR_SCALE),
        changepoint_count,
    ));
    penalties.extend(std::iter::repeat_n(
        1.0 / (SEASONALITY_PRIOR_SCALE * SEASONALITY_PRIOR_SCALE),
        2 * (WEEKLY_ORDER + DAILY_ORDER),
    ));
    penalties
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Solve `A x = b` for symmetric positive-definite `A` by Cholesky
/// factorization. Returns `None` when the matrix is not positive definite
/// or the factorization degenerates numerically.
fn cholesky_solve(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if !(sum > 0.0 && sum.is_finite()) {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // Forward substitution: L y = b.
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[i][k] * y[k];
        }
        y[i] = sum / l[i][i];
    }

    // Back substitution: L^T x = y.
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for k in i + 1..n {
            sum -= l[k][i] * x[k];
        }
        x[i] = sum / l[i][i];
    }

    if x.iter().any(|v| !v.is_finite()) {
        return None;
    }
    Some(x)
}
