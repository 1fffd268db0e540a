//! Calendar helpers. Dates only derive DAP and labels; nothing aligns on them.

use chrono::{DateTime, Datelike, Days, NaiveDate};

use crate::error::{GrowthError, Result};

/// Format used by the data sources for `targetDate` / `pollinationDate`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a pollination or target date.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD` and RFC 3339 timestamps (date part).
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        return Ok(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y/%m/%d") {
        return Ok(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    Err(GrowthError::InvalidDate(format!(
        "'{s}' is not a calendar date (expected YYYY-MM-DD)"
    )))
}

/// Whole days from pollination to `target`; negative before pollination.
#[inline]
pub fn dap_between(pollination: NaiveDate, target: NaiveDate) -> i64 {
    target.signed_duration_since(pollination).num_days()
}

/// `pollination + dap` days.
pub fn date_at(pollination: NaiveDate, dap: u32) -> Result<NaiveDate> {
    pollination
        .checked_add_days(Days::new(u64::from(dap)))
        .ok_or_else(|| {
            GrowthError::InvalidDate(format!("{pollination} + {dap} days is out of range"))
        })
}

/// `month/day` without zero padding, e.g. `1/5`.
pub fn date_label(date: NaiveDate) -> String {
    format!("{}/{}", date.month(), date.day())
}
