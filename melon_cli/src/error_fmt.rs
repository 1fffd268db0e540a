//! Human-readable error descriptions and structured JSON error formatting.

use melon_core::GrowthError;

use crate::commands::CheckFailed;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(cf) = err.downcast_ref::<CheckFailed>() {
        return format!(
            "What happened: {cf}.\nLikely causes: The stored deviations were computed with different model parameters or a different pollination date.\nHow to fix: Confirm the season's models and the melon's pollination date, then regenerate the summaries."
        );
    }

    if let Some(ge) = err.downcast_ref::<GrowthError>() {
        return match ge {
            GrowthError::InvalidParameter { metric, field, value } => format!(
                "What happened: Model for '{metric}' has a non-finite {field} ({value}).\nLikely causes: A failed curve fit exported NaN or infinity.\nHow to fix: Refit or remove that metric's model for the season."
            ),
            GrowthError::InvalidDate(d) => format!(
                "What happened: Pollination date is invalid ({d}).\nLikely causes: Missing date in the device map or a typo in --pollination-date.\nHow to fix: Use YYYY-MM-DD, e.g. 2025-04-01."
            ),
            GrowthError::InvalidHorizon(h) => format!(
                "What happened: Horizon of {h} days is out of range.\nLikely causes: A negative or very large --horizon.\nHow to fix: Pass a value between 0 and {}.",
                melon_core::MAX_HORIZON_DAYS
            ),
            GrowthError::InvalidObservation { dap, metric } => format!(
                "What happened: Observation at DAP {dap} has a non-finite '{metric}'.\nLikely causes: A broken measurement in the growth summaries.\nHow to fix: Fix or drop that record and rerun."
            ),
            GrowthError::UnknownMelon(id) => format!(
                "What happened: Melon '{id}' is not in the device registry.\nLikely causes: Typo in --melon or an outdated registry file.\nHow to fix: Run `melon melons --registry <FILE>` to list known ids."
            ),
            GrowthError::Source(msg) => format!(
                "What happened: A data source failed ({msg}).\nLikely causes: The file or service behind it is unavailable.\nHow to fix: Check the input paths and retry."
            ),
        };
    }

    // String-based heuristics for errors coming from the loaders or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("must have headers") {
        return "Invalid headers in ideal model CSV. Expected 'season,metric_name,L,k,t0'.".to_string();
    }

    if lower.starts_with("growth.")
        || lower.starts_with("metrics[")
        || lower.starts_with("logging.")
        || lower.contains("config")
    {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
        );
    }

    if lower.contains("--registry or --pollination-date") {
        return format!("{msg}.\nHow to fix: Pass --registry <FILE> or --pollination-date YYYY-MM-DD.");
    }

    if lower.contains("pass --season") {
        return format!(
            "What happened: {msg}.\nLikely causes: The summaries carry no season and no registry was given.\nHow to fix: Pass --season with one of the listed seasons."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per error kind; everything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<CheckFailed>().is_some() {
        return 6;
    }
    if let Some(ge) = err.downcast_ref::<GrowthError>() {
        return match ge {
            GrowthError::InvalidParameter { .. }
            | GrowthError::InvalidDate(_)
            | GrowthError::InvalidHorizon(_)
            | GrowthError::InvalidObservation { .. } => 3,
            GrowthError::UnknownMelon(_) => 4,
            GrowthError::Source(_) => 5,
        };
    }
    1
}

/// Stable `reason` names for JSON output.
pub fn error_reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<CheckFailed>().is_some() {
        return "CheckFailed";
    }
    match err.downcast_ref::<GrowthError>() {
        Some(GrowthError::InvalidParameter { .. }) => "InvalidParameter",
        Some(GrowthError::InvalidDate(_)) => "InvalidDate",
        Some(GrowthError::InvalidHorizon(_)) => "InvalidHorizon",
        Some(GrowthError::InvalidObservation { .. }) => "InvalidObservation",
        Some(GrowthError::UnknownMelon(_)) => "UnknownMelon",
        Some(GrowthError::Source(_)) => "Source",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = error_reason_name(err);
    let details = match err.downcast_ref::<GrowthError>() {
        Some(GrowthError::InvalidParameter { metric, field, .. }) => {
            Some(json!({ "metric": metric, "field": field }))
        }
        Some(GrowthError::InvalidHorizon(h)) => {
            Some(json!({ "horizon_days": h, "max": melon_core::MAX_HORIZON_DAYS }))
        }
        Some(GrowthError::InvalidObservation { dap, metric }) => {
            Some(json!({ "dap": dap, "metric": metric }))
        }
        Some(GrowthError::UnknownMelon(id)) => Some(json!({ "melon": id })),
        _ => err
            .downcast_ref::<CheckFailed>()
            .map(|cf| json!({ "mismatches": cf.mismatches, "days": cf.days })),
    };

    let obj = match details {
        Some(d) => json!({ "reason": reason, "details": d, "message": humanize(err) }),
        None => json!({ "reason": reason, "message": humanize(err) }),
    };
    obj.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_melon_maps_to_exit_code_and_reason() {
        let err: eyre::Report = GrowthError::UnknownMelon("m9".into()).into();
        assert_eq!(exit_code_for_error(&err), 4);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "UnknownMelon");
        assert_eq!(v["details"]["melon"], "m9");
        assert!(humanize(&err).contains("melon melons"));
    }

    #[test]
    fn check_failure_has_its_own_code() {
        let err: eyre::Report = CheckFailed {
            mismatches: 2,
            days: 1,
        }
        .into();
        assert_eq!(exit_code_for_error(&err), 6);
        assert!(format_error_json(&err).contains("\"mismatches\":2"));
    }

    #[test]
    fn config_errors_are_explained() {
        let err = eyre::eyre!("growth.horizon_days must be <= 366");
        assert_eq!(exit_code_for_error(&err), 1);
        assert!(humanize(&err).starts_with("What happened: Configuration is invalid"));
    }

    #[test]
    fn season_ambiguity_points_at_the_flag() {
        let err = eyre::eyre!(
            "no season known for melon 'm1' and the ideal models cover several (2024-autumn, 2025-spring); pass --season"
        );
        let text = humanize(&err);
        assert!(text.starts_with("What happened: no season known"));
        assert!(text.contains("Pass --season"));
        assert_eq!(exit_code_for_error(&err), 1);
    }
}
