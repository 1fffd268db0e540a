//! Plain-text tables for terminal output.

use std::fmt::Write as _;

use melon_core::{DayView, GrowthReport, HealthSignal, MelonInfo, MelonRegistry, MetricCatalog};

fn value(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}

fn signal_name(s: HealthSignal) -> &'static str {
    match s {
        HealthSignal::Above => "above",
        HealthSignal::OnTarget => "on target",
        HealthSignal::Below => "below",
    }
}

fn header(out: &mut String, melon: &MelonInfo) {
    let id = if melon.id.is_empty() { "(unnamed)" } else { &melon.id };
    let season = if melon.season.is_empty() { "any" } else { &melon.season };
    let _ = writeln!(out, "melon {id}  season {season}  pollinated {}", melon.pollination_date);
}

pub fn series(report: &GrowthReport, metric: Option<&str>) -> String {
    let mut out = String::new();
    header(&mut out, &report.melon);
    let _ = writeln!(
        out,
        "horizon {} days  current DAP {}",
        report.series.horizon_days,
        report.current_dap()
    );
    for s in &report.series.series {
        if metric.is_some_and(|m| m != s.metric) {
            continue;
        }
        let model = if s.has_model { "" } else { "  (no model)" };
        let _ = writeln!(out, "\n{} [{}]{model}", s.label, s.metric);
        let _ = writeln!(out, "{:>4}  {:<6} {:>14} {:>14}", "DAP", "date", "ideal", "actual");
        for p in &s.points {
            let _ = writeln!(
                out,
                "{:>4}  {:<6} {:>14} {:>14}",
                p.dap,
                p.date_label,
                value(p.ideal),
                value(p.actual)
            );
        }
    }
    out
}

pub fn deviations(report: &GrowthReport, catalog: &MetricCatalog) -> String {
    let mut out = String::new();
    header(&mut out, &report.melon);
    let Some(day) = &report.current else {
        out.push_str("no observation for the selected day\n");
        return out;
    };
    let _ = writeln!(out, "{} (DAP {})", day.target_date, day.dap);
    if day.deviations.is_empty() {
        out.push_str("no metric has both a measurement and an ideal value\n");
        return out;
    }
    let _ = writeln!(
        out,
        "{:<24} {:>14} {:>14} {:>12}  {:<10} status",
        "metric", "actual", "ideal", "delta", "signal"
    );
    for d in &day.deviations {
        let status = if d.favorable { "favorable" } else { "unfavorable" };
        let _ = writeln!(
            out,
            "{:<24} {:>14.2} {:>14.2} {:>12}  {:<10} {status}",
            catalog.label(&d.metric),
            d.actual,
            d.ideal,
            d.signed_delta(),
            signal_name(d.signal)
        );
    }
    out
}

pub fn check(melon: &MelonInfo, views: &[DayView]) -> String {
    let mut out = String::new();
    header(&mut out, melon);
    if views.is_empty() {
        out.push_str("no observations\n");
    }
    for v in views {
        match v.mismatches.as_deref() {
            None => {
                let _ = writeln!(out, "{} (DAP {}): no stored deviation", v.target_date, v.dap);
            }
            Some([]) => {
                let _ = writeln!(out, "{} (DAP {}): ok", v.target_date, v.dap);
            }
            Some(gaps) => {
                for g in gaps {
                    let _ = writeln!(
                        out,
                        "{} (DAP {}): {} computed {:.6} stored {:.6}",
                        v.target_date, v.dap, g.metric, g.computed, g.external
                    );
                }
            }
        }
        for g in v.ideal_mismatches.iter().flatten() {
            let _ = writeln!(
                out,
                "{} (DAP {}): {} ideal {:.6} stored ideal {:.6}",
                v.target_date, v.dap, g.metric, g.computed, g.external
            );
        }
    }
    out
}

pub fn melons(registry: &MelonRegistry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<16} {:<16} {:<12} camera", "melon", "season", "pollinated");
    for m in registry.iter() {
        let _ = writeln!(
            out,
            "{:<16} {:<16} {:<12} {}",
            m.id, m.season, m.pollination_date, m.device_camera_id
        );
    }
    out
}
