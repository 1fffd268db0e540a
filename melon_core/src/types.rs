//! Value types shared by the series builder and the deviation computer.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{GrowthError, Result};

/// Fitted logistic growth parameters for one metric in one season.
///
/// `l` is the saturation value (negative for inverted metrics), `k` the
/// steepness and `t0` the inflection day. No sign constraint is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelParameters {
    #[serde(rename = "L")]
    pub l: f64,
    pub k: f64,
    pub t0: f64,
}

impl ModelParameters {
    pub const fn new(l: f64, k: f64, t0: f64) -> Self {
        Self { l, k, t0 }
    }

    /// Reject non-finite fields so `NaN` never reaches a series.
    pub fn validate(&self, metric: &str) -> Result<()> {
        for (field, value) in [("L", self.l), ("k", self.k), ("t0", self.t0)] {
            if !value.is_finite() {
                return Err(GrowthError::InvalidParameter {
                    metric: metric.to_string(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }

    /// Expected metric value `t` days after pollination.
    #[inline]
    pub fn evaluate(&self, t: f64) -> f64 {
        crate::sigmoid::evaluate(t, self)
    }
}

/// Metric name -> fitted parameters. `None` marks a metric known to have no
/// model this season; its series carries no ideal values.
pub type ModelSet = BTreeMap<String, Option<ModelParameters>>;

/// One day's measurement of one melon, keyed by `(melon_id, target_date)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub melon_id: String,
    pub target_date: NaiveDate,
    pub dap: u32,
    pub metrics: BTreeMap<String, f64>,
    /// Deviation precomputed upstream, when the data source provides one.
    pub deviation: Option<BTreeMap<String, f64>>,
    /// Ideal values the data source evaluated for this day, if any.
    pub ideal: Option<BTreeMap<String, f64>>,
}

impl Observation {
    pub fn new(melon_id: impl Into<String>, target_date: NaiveDate, dap: u32) -> Self {
        Self {
            melon_id: melon_id.into(),
            target_date,
            dap,
            metrics: BTreeMap::new(),
            deviation: None,
            ideal: None,
        }
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    pub fn with_ideal(mut self, name: impl Into<String>, value: f64) -> Self {
        self.ideal
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value);
        self
    }

    pub fn with_deviation(mut self, name: impl Into<String>, value: f64) -> Self {
        self.deviation
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub dap: u32,
    /// `month/day` of `pollination_date + dap`; display only.
    pub date_label: String,
    pub ideal: Option<f64>,
    pub actual: Option<f64>,
}

/// Dense per-day series for one metric, indexed by DAP `0..=horizon`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSeries {
    pub metric: String,
    pub label: String,
    pub has_model: bool,
    pub points: Vec<SeriesPoint>,
}

impl MetricSeries {
    pub fn at(&self, dap: u32) -> Option<&SeriesPoint> {
        self.points.get(dap as usize)
    }

    /// Points that carry an actual measurement.
    pub fn observed(&self) -> impl Iterator<Item = &SeriesPoint> {
        self.points.iter().filter(|p| p.actual.is_some())
    }
}
