use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Minimum number of daily observations required before any model runs.
pub const MIN_HISTORY_POINTS: usize = 30;

/// A single daily close observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// A normalized daily close series: strictly ascending dates, one point per
/// date, every close finite and positive.
///
/// All analysis code assumes these invariants, so the only way to build a
/// series is through [`PriceSeries::from_points`], which enforces them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Normalize raw observations into a series.
    ///
    /// Points with a non-finite or non-positive close are dropped. When the
    /// input repeats a date, the observation appearing later in the input
    /// wins. The result is sorted by date ascending.
    pub fn from_points(points: Vec<PricePoint>) -> Self {
        let mut by_date: BTreeMap<NaiveDate, PricePoint> = BTreeMap::new();
        for point in points {
            if point.close.is_finite() && point.close > 0.0 {
                by_date.insert(point.date, point);
            }
        }
        Self {
            points: by_date.into_values().collect(),
        }
    }

    /// Keep only the trailing window of points whose date falls within
    /// `days` calendar days of the newest observation.
    pub fn trailing(self, days: u32) -> Self {
        let Some(last) = self.points.last() else {
            return self;
        };
        let cutoff = last.date - chrono::Duration::days(i64::from(days));
        Self {
            points: self
                .points
                .into_iter()
                .filter(|p| p.date >= cutoff)
                .collect(),
        }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Close values in date order.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }
}
