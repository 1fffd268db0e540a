//! Dense ideal trajectories with actual observations overlaid by DAP.
//!
//! A `SeriesSet` is always rebuilt in full from its inputs; there is no
//! incremental update path, so a stale ideal/actual pair cannot survive a
//! change of models, observations or pollination date.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::{GrowthCfg, MetricCatalog};
use crate::error::{GrowthError, GrowthWarning, Result};
use crate::sigmoid;
use crate::types::{MetricSeries, ModelSet, Observation, SeriesPoint};
use crate::util::{date_at, date_label, parse_date};

/// Upper bound on the horizon accepted by the builder (days).
pub const MAX_HORIZON_DAYS: i64 = 3650;

/// All metric series for one melon over one horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSet {
    pub pollination_date: NaiveDate,
    pub horizon_days: u32,
    /// `month/day` label per DAP, `labels[dap]`.
    pub labels: Vec<String>,
    /// Canonical metric order, then unknown metrics lexically.
    pub series: Vec<MetricSeries>,
    pub warnings: Vec<GrowthWarning>,
}

impl SeriesSet {
    pub fn get(&self, metric: &str) -> Option<&MetricSeries> {
        self.series.iter().find(|s| s.metric == metric)
    }

    pub fn metrics(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|s| s.metric.as_str())
    }

    pub fn date_label(&self, dap: u32) -> Option<&str> {
        self.labels.get(dap as usize).map(String::as_str)
    }

    /// Actual values aligned at `dap`, for metrics that have one.
    pub fn actual_at(&self, dap: u32) -> BTreeMap<String, f64> {
        self.series
            .iter()
            .filter_map(|s| Some((s.metric.clone(), s.at(dap)?.actual?)))
            .collect()
    }

    /// Ideal value at `dap` for every metric; `None` where no model exists
    /// or `dap` lies past the horizon.
    pub fn ideal_at(&self, dap: u32) -> BTreeMap<String, Option<f64>> {
        self.series
            .iter()
            .map(|s| (s.metric.clone(), s.at(dap).and_then(|p| p.ideal)))
            .collect()
    }
}

/// Ideal value for every metric in `models` at an arbitrary DAP, independent
/// of any horizon.
pub fn ideal_values(models: &ModelSet, dap: u32) -> BTreeMap<String, Option<f64>> {
    models
        .iter()
        .map(|(metric, params)| {
            (
                metric.clone(),
                params.map(|p| sigmoid::evaluate(f64::from(dap), &p)),
            )
        })
        .collect()
}

fn check_horizon(horizon_days: i64) -> Result<u32> {
    if !(0..=MAX_HORIZON_DAYS).contains(&horizon_days) {
        return Err(GrowthError::InvalidHorizon(horizon_days));
    }
    u32::try_from(horizon_days).map_err(|_| GrowthError::InvalidHorizon(horizon_days))
}

/// Builds `SeriesSet`s for a fixed horizon and metric catalog.
#[derive(Debug, Clone)]
pub struct GrowthSeriesBuilder {
    horizon_days: i64,
    catalog: MetricCatalog,
}

impl Default for GrowthSeriesBuilder {
    fn default() -> Self {
        Self::new(GrowthCfg::default().horizon_days, MetricCatalog::default())
    }
}

impl GrowthSeriesBuilder {
    pub fn new(horizon_days: i64, catalog: MetricCatalog) -> Self {
        Self {
            horizon_days,
            catalog,
        }
    }

    pub fn from_cfg(cfg: &GrowthCfg, catalog: MetricCatalog) -> Self {
        Self::new(cfg.horizon_days, catalog)
    }

    pub fn horizon_days(&self) -> i64 {
        self.horizon_days
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    /// Parse `pollination_date` and build; see `build_from_date`.
    pub fn build(
        &self,
        pollination_date: &str,
        models: &ModelSet,
        observations: &[Observation],
    ) -> Result<SeriesSet> {
        // Horizon is checked before the date so a bad horizon is reported
        // regardless of the other inputs.
        check_horizon(self.horizon_days)?;
        let pollination = parse_date(pollination_date)?;
        self.build_from_date(pollination, models, observations)
    }

    /// Build one dense series per metric over DAP `0..=horizon`.
    ///
    /// All-or-nothing: any invalid input fails the whole build.
    pub fn build_from_date(
        &self,
        pollination: NaiveDate,
        models: &ModelSet,
        observations: &[Observation],
    ) -> Result<SeriesSet> {
        let horizon = check_horizon(self.horizon_days)?;

        for (metric, params) in models {
            if let Some(p) = params {
                p.validate(metric)?;
            }
        }
        for obs in observations {
            if let Some((metric, _)) = obs.metrics.iter().find(|(_, v)| !v.is_finite()) {
                return Err(GrowthError::InvalidObservation {
                    dap: obs.dap,
                    metric: metric.clone(),
                });
            }
        }

        let labels = (0..=horizon)
            .map(|d| date_at(pollination, d).map(date_label))
            .collect::<Result<Vec<_>>>()?;

        let mut warnings = Vec::new();

        // DAP -> first observation at that DAP, in input order.
        let mut by_dap: Vec<Option<&Observation>> = vec![None; labels.len()];
        for obs in observations {
            match by_dap.get_mut(obs.dap as usize) {
                None => warnings.push(GrowthWarning::BeyondHorizon { dap: obs.dap }),
                Some(slot) if slot.is_none() => *slot = Some(obs),
                Some(_) => warnings.push(GrowthWarning::DuplicateDap { dap: obs.dap }),
            }
        }

        let mut names: BTreeSet<&str> = models.keys().map(String::as_str).collect();
        // Off-catalog observation metrics, warned once each even when a model
        // exists for them.
        let mut flagged: BTreeSet<&str> = BTreeSet::new();
        for obs in observations {
            for metric in obs.metrics.keys() {
                names.insert(metric.as_str());
                if !self.catalog.contains(metric) && flagged.insert(metric.as_str()) {
                    warnings.push(GrowthWarning::MetricMismatch {
                        metric: metric.clone(),
                        first_dap: obs.dap,
                    });
                }
            }
        }

        let series = self
            .catalog
            .sorted(names)
            .into_iter()
            .map(|metric| {
                let params = models.get(metric).copied().flatten();
                let ideal = params.map(|p| sigmoid::trajectory(&p, horizon));
                let points = labels
                    .iter()
                    .zip(&by_dap)
                    .zip(0u32..)
                    .map(|((label, obs), dap)| SeriesPoint {
                        dap,
                        date_label: label.clone(),
                        ideal: ideal.as_ref().and_then(|v| v.get(dap as usize).copied()),
                        actual: obs.and_then(|o| o.metrics.get(metric).copied()),
                    })
                    .collect();
                MetricSeries {
                    metric: metric.to_string(),
                    label: self.catalog.label(metric).to_string(),
                    has_model: params.is_some(),
                    points,
                }
            })
            .collect();

        Ok(SeriesSet {
            pollination_date: pollination,
            horizon_days: horizon,
            labels,
            series,
            warnings,
        })
    }
}

/// Build with the default metric catalog.
pub fn build(
    pollination_date: &str,
    horizon_days: i64,
    models: &ModelSet,
    observations: &[Observation],
) -> Result<SeriesSet> {
    GrowthSeriesBuilder::new(horizon_days, MetricCatalog::default()).build(
        pollination_date,
        models,
        observations,
    )
}
