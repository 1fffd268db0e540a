//! Assemble one melon's growth view from collaborator sources.
//!
//! Sources are borrowed for the lifetime of the reporter, so tests and the
//! CLI decide what backs them; nothing here constructs a client.

use chrono::NaiveDate;
use melon_traits::{ModelSource, ObservationSource, RegistrySource};
use serde::Serialize;

use crate::config::{GrowthCfg, MetricCatalog};
use crate::conversions::model_set;
use crate::deviation::{
    DeviationComputer, DeviationMismatch, DeviationRecord, reconcile, reconcile_ideals,
};
use crate::error::{GrowthError, GrowthWarning, Result};
use crate::registry::{MelonInfo, MelonRegistry};
use crate::series::{GrowthSeriesBuilder, SeriesSet};
use crate::types::{ModelSet, Observation};
use crate::util::{dap_between, date_label};

/// Which observed day the report focuses on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DaySelector {
    /// Most recent `target_date`.
    #[default]
    Latest,
    Date(NaiveDate),
    Dap(u32),
}

/// Deviations for the selected day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayView {
    pub target_date: NaiveDate,
    pub dap: u32,
    pub date_label: String,
    pub deviations: Vec<DeviationRecord>,
    /// Disagreements with the source's own deviation field; `None` when the
    /// source supplied none for this day.
    pub mismatches: Option<Vec<DeviationMismatch>>,
    /// Disagreements with the source's own ideal values; `None` when the
    /// source supplied none for this day.
    pub ideal_mismatches: Option<Vec<DeviationMismatch>>,
}

impl DayView {
    /// Total disagreements with upstream deltas and ideals.
    pub fn mismatch_count(&self) -> usize {
        self.mismatches.as_ref().map_or(0, Vec::len)
            + self.ideal_mismatches.as_ref().map_or(0, Vec::len)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthReport {
    pub melon: MelonInfo,
    pub series: SeriesSet,
    /// Observed target dates, ascending.
    pub dates: Vec<NaiveDate>,
    pub current: Option<DayView>,
    /// Series warnings followed by DAP/date disagreements.
    pub warnings: Vec<GrowthWarning>,
}

impl GrowthReport {
    /// DAP of the selected day, 0 when nothing was observed.
    pub fn current_dap(&self) -> u32 {
        self.current.as_ref().map_or(0, |d| d.dap)
    }
}

pub struct GrowthReporter<'a> {
    models: &'a dyn ModelSource,
    observations: &'a dyn ObservationSource,
    builder: GrowthSeriesBuilder,
    deviations: DeviationComputer,
    tolerance: f64,
}

impl<'a> GrowthReporter<'a> {
    pub fn new(
        models: &'a dyn ModelSource,
        observations: &'a dyn ObservationSource,
        cfg: &GrowthCfg,
        catalog: MetricCatalog,
    ) -> Self {
        Self {
            models,
            observations,
            builder: GrowthSeriesBuilder::from_cfg(cfg, catalog.clone()),
            deviations: DeviationComputer::new(catalog),
            tolerance: cfg.deviation_tolerance,
        }
    }

    /// Ideal models for `season`, keyed by metric.
    pub fn models_for(&self, season: &str) -> Result<ModelSet> {
        let records = self.models.ideal_models(season).map_err(|e| {
            GrowthError::Source(format!("ideal models for season '{season}': {e}"))
        })?;
        model_set(&records)
    }

    /// Observations for `melon_id`, ascending by `target_date`.
    pub fn observations_for(&self, melon_id: &str) -> Result<Vec<Observation>> {
        let records = self.observations.growth_summaries(melon_id).map_err(|e| {
            GrowthError::Source(format!("growth summaries for melon '{melon_id}': {e}"))
        })?;
        let mut out = records
            .iter()
            .map(Observation::try_from)
            .collect::<Result<Vec<_>>>()?;
        out.sort_by_key(|o| o.target_date);
        Ok(out)
    }

    pub fn report(&self, melon: &MelonInfo, day: DaySelector) -> Result<GrowthReport> {
        let models = self.models_for(&melon.season)?;
        let observations = self.observations_for(&melon.id)?;
        tracing::debug!(
            melon = %melon.id,
            season = %melon.season,
            models = models.len(),
            observations = observations.len(),
            "building growth report"
        );

        let series = self
            .builder
            .build(&melon.pollination_date, &models, &observations)?;

        let mut warnings = series.warnings.clone();
        for o in &observations {
            let derived = dap_between(series.pollination_date, o.target_date);
            if derived != i64::from(o.dap) {
                warnings.push(GrowthWarning::DapMismatch {
                    target_date: o.target_date,
                    stated: o.dap,
                    derived,
                });
            }
        }

        let selected = match day {
            DaySelector::Latest => observations.last(),
            DaySelector::Date(d) => observations.iter().find(|o| o.target_date == d),
            DaySelector::Dap(n) => observations.iter().find(|o| o.dap == n),
        };
        let current = selected.map(|o| self.day_view(o, &models));

        Ok(GrowthReport {
            melon: melon.clone(),
            dates: observations.iter().map(|o| o.target_date).collect(),
            series,
            current,
            warnings,
        })
    }

    /// One `DayView` per observation, ascending by `target_date`.
    pub fn day_views(&self, melon: &MelonInfo) -> Result<Vec<DayView>> {
        let models = self.models_for(&melon.season)?;
        let observations = self.observations_for(&melon.id)?;
        Ok(observations
            .iter()
            .map(|o| self.day_view(o, &models))
            .collect())
    }

    fn day_view(&self, obs: &Observation, models: &ModelSet) -> DayView {
        let deviations = self.deviations.for_observation(obs, models);
        let mismatches = obs
            .deviation
            .as_ref()
            .map(|ext| reconcile(&deviations, ext, self.tolerance));
        let ideal_mismatches = obs
            .ideal
            .as_ref()
            .map(|ext| reconcile_ideals(&deviations, ext, self.tolerance));
        DayView {
            target_date: obs.target_date,
            dap: obs.dap,
            date_label: date_label(obs.target_date),
            deviations,
            mismatches,
            ideal_mismatches,
        }
    }
}

/// Fetch the device map and reduce it to distinct melons.
pub fn load_registry(source: &dyn RegistrySource) -> Result<MelonRegistry> {
    let records = source
        .device_maps()
        .map_err(|e| GrowthError::Source(format!("device registry: {e}")))?;
    Ok(MelonRegistry::from_device_maps(&records))
}
