//! Subcommand execution: load inputs, run the growth engine, print results.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use eyre::{Result, WrapErr};
use melon_config::{Config, GrowthSummaryRecord};
use melon_core::report::load_registry;
use melon_core::sources::{InMemoryModels, InMemoryRegistry, InMemorySummaries};
use melon_core::{GrowthCfg, GrowthReport, GrowthReporter, MelonInfo, MelonRegistry, MetricCatalog};
use serde_json::json;

use crate::cli::{DayArgs, InputArgs};
use crate::render;

/// Recomputed deviations disagree with the ones stored upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckFailed {
    pub mismatches: usize,
    pub days: usize,
}

impl fmt::Display for CheckFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} deviation mismatch(es) on {} observed day(s)",
            self.mismatches, self.days
        )
    }
}

impl std::error::Error for CheckFailed {}

/// Inputs for one melon, already validated at the boundary.
struct Inputs {
    models: InMemoryModels,
    summaries: InMemorySummaries,
    melon: MelonInfo,
}

fn load_inputs(input: &InputArgs) -> Result<Inputs> {
    let models = melon_config::load_models_path(&input.models)?;
    let summaries = match &input.summaries {
        Some(path) => melon_config::load_summaries_path(path)?,
        None => Vec::new(),
    };
    let melon = resolve_melon(input, &summaries)?;
    if melon.season.is_empty() {
        let seasons: BTreeSet<&str> = models
            .iter()
            .map(|m| m.season.as_str())
            .filter(|s| !s.is_empty())
            .collect();
        if seasons.len() > 1 {
            let list: Vec<&str> = seasons.into_iter().collect();
            eyre::bail!(
                "no season known for melon '{}' and the ideal models cover several ({}); pass --season",
                melon.id,
                list.join(", ")
            );
        }
    }
    tracing::info!(
        melon = %melon.id,
        season = %melon.season,
        models = models.len(),
        summaries = summaries.len(),
        "inputs loaded"
    );
    Ok(Inputs {
        models: InMemoryModels::new(models),
        summaries: InMemorySummaries::new(summaries),
        melon,
    })
}

fn registry_from(path: &Path) -> Result<MelonRegistry> {
    let records = melon_config::load_registry_path(path)?;
    Ok(load_registry(&InMemoryRegistry::new(records))?)
}

/// Pick the melon from the registry, or assemble one from the flags and the
/// melon's own summary records when no registry is given.
fn resolve_melon(input: &InputArgs, summaries: &[GrowthSummaryRecord]) -> Result<MelonInfo> {
    let mut melon = match &input.registry {
        Some(path) => {
            let registry = registry_from(path)?;
            match &input.melon {
                Some(id) => registry.require(id)?.clone(),
                None => registry
                    .first()
                    .cloned()
                    .ok_or_else(|| eyre::eyre!("device registry {path:?} lists no melons"))?,
            }
        }
        None => {
            if input.pollination_date.is_none() {
                eyre::bail!("either --registry or --pollination-date is required");
            }
            let id = input
                .melon
                .clone()
                .or_else(|| summaries.first().map(|s| s.melon_id.clone()))
                .unwrap_or_default();
            let season = summaries
                .iter()
                .filter(|s| s.melon_id == id)
                .find_map(|s| s.season.clone().filter(|v| !v.is_empty()))
                .unwrap_or_default();
            MelonInfo {
                id,
                season,
                pollination_date: String::new(),
                device_camera_id: String::new(),
            }
        }
    };
    if let Some(season) = &input.season {
        melon.season = season.clone();
    }
    if let Some(date) = &input.pollination_date {
        melon.pollination_date = date.clone();
    }
    Ok(melon)
}

fn growth_cfg(cfg: &Config, input: &InputArgs) -> GrowthCfg {
    let mut growth = GrowthCfg::from(&cfg.growth);
    if let Some(h) = input.horizon {
        growth.horizon_days = h;
    }
    growth
}

fn log_warnings(report: &GrowthReport) {
    for w in &report.warnings {
        tracing::warn!(melon = %report.melon.id, "{w}");
    }
}

pub fn run_series(cfg: &Config, input: &InputArgs, metric: Option<&str>, json: bool) -> Result<()> {
    let inputs = load_inputs(input)?;
    let reporter = GrowthReporter::new(
        &inputs.models,
        &inputs.summaries,
        &growth_cfg(cfg, input),
        MetricCatalog::from(cfg),
    );
    let report = reporter.report(&inputs.melon, Default::default())?;
    log_warnings(&report);

    if let Some(m) = metric
        && report.series.get(m).is_none()
    {
        eyre::bail!("metric '{m}' has neither a model nor observations");
    }
    if json {
        let series: Vec<_> = report
            .series
            .series
            .iter()
            .filter(|s| metric.is_none_or(|m| s.metric == m))
            .collect();
        let out = json!({
            "melon": report.melon,
            "pollination_date": report.series.pollination_date,
            "horizon_days": report.series.horizon_days,
            "current_dap": report.current_dap(),
            "series": series,
            "warnings": report.warnings,
        });
        println!("{out}");
    } else {
        print!("{}", render::series(&report, metric));
    }
    Ok(())
}

pub fn run_deviations(cfg: &Config, input: &InputArgs, day: DayArgs, json: bool) -> Result<()> {
    let inputs = load_inputs(input)?;
    let catalog = MetricCatalog::from(cfg);
    let reporter = GrowthReporter::new(
        &inputs.models,
        &inputs.summaries,
        &growth_cfg(cfg, input),
        catalog.clone(),
    );
    let report = reporter.report(&inputs.melon, day.selector())?;
    log_warnings(&report);

    if json {
        let out = json!({
            "melon": report.melon,
            "dates": report.dates,
            "current_dap": report.current_dap(),
            "current": report.current,
            "warnings": report.warnings,
        });
        println!("{out}");
    } else {
        print!("{}", render::deviations(&report, &catalog));
    }
    Ok(())
}

pub fn run_check(cfg: &Config, input: &InputArgs, json: bool) -> Result<()> {
    let inputs = load_inputs(input)?;
    let reporter = GrowthReporter::new(
        &inputs.models,
        &inputs.summaries,
        &growth_cfg(cfg, input),
        MetricCatalog::from(cfg),
    );
    // Building the series validates the pollination date and horizon too.
    let report = reporter.report(&inputs.melon, Default::default())?;
    log_warnings(&report);
    let views = reporter
        .day_views(&inputs.melon)
        .wrap_err("recompute deviations")?;

    let mismatches: usize = views.iter().map(|v| v.mismatch_count()).sum();
    let days = views.iter().filter(|v| v.mismatch_count() > 0).count();

    if json {
        let out = json!({
            "melon": report.melon,
            "days": views,
            "warnings": report.warnings,
            "mismatches": mismatches,
        });
        println!("{out}");
    } else {
        print!("{}", render::check(&report.melon, &views));
    }

    if mismatches > 0 {
        return Err(CheckFailed { mismatches, days }.into());
    }
    Ok(())
}

pub fn run_melons(registry: &Path, json: bool) -> Result<()> {
    let registry = registry_from(registry)?;
    if json {
        let melons: Vec<&MelonInfo> = registry.iter().collect();
        println!("{}", serde_json::to_string(&melons)?);
    } else {
        print!("{}", render::melons(&registry));
    }
    Ok(())
}
