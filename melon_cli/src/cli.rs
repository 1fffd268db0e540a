//! CLI argument definitions and shared statics.

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use melon_core::DaySelector;
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "melon", version, about = "Melon growth-curve CLI")]
pub struct Cli {
    /// Path to config TOML; built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print results and errors as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Where the models, observations and melon come from.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Ideal models (.csv with `season,metric_name,L,k,t0`, or .json)
    #[arg(long, value_name = "FILE")]
    pub models: PathBuf,

    /// Growth summaries JSON; ideal curves only when omitted
    #[arg(long, value_name = "FILE")]
    pub summaries: Option<PathBuf>,

    /// Device map JSON listing melons and their pollination dates
    #[arg(long, value_name = "FILE")]
    pub registry: Option<PathBuf>,

    /// Melon id; defaults to the first melon in the registry
    #[arg(long, value_name = "ID")]
    pub melon: Option<String>,

    /// Season used to pick models; overrides the registry
    #[arg(long, value_name = "SEASON")]
    pub season: Option<String>,

    /// Pollination date (YYYY-MM-DD); overrides the registry
    #[arg(long = "pollination-date", value_name = "DATE")]
    pub pollination_date: Option<String>,

    /// Last DAP of the ideal curve; overrides growth.horizon_days
    #[arg(long, value_name = "DAYS", allow_negative_numbers = true)]
    pub horizon: Option<i64>,
}

#[derive(Args, Debug, Clone, Copy, Default)]
pub struct DayArgs {
    /// Observation date to inspect
    #[arg(long, value_name = "DATE")]
    pub date: Option<NaiveDate>,

    /// Observation DAP to inspect
    #[arg(long, value_name = "DAP", conflicts_with = "date")]
    pub dap: Option<u32>,
}

impl DayArgs {
    pub fn selector(self) -> DaySelector {
        match (self.date, self.dap) {
            (Some(d), _) => DaySelector::Date(d),
            (None, Some(n)) => DaySelector::Dap(n),
            (None, None) => DaySelector::Latest,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ideal trajectory with actual measurements overlaid by DAP
    Series {
        #[command(flatten)]
        input: InputArgs,
        /// Only print this metric
        #[arg(long, value_name = "NAME")]
        metric: Option<String>,
    },
    /// Deviation from the ideal for one observed day (latest by default)
    Deviations {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        day: DayArgs,
    },
    /// Compare recomputed deviations with the ones stored in the summaries
    Check {
        #[command(flatten)]
        input: InputArgs,
    },
    /// List the melons in a device map
    Melons {
        #[arg(long, value_name = "FILE")]
        registry: PathBuf,
    },
}
