#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Growth-curve modelling and comparison engine.
//!
//! Everything here is a pure, synchronous transformation over immutable
//! inputs; outputs are freshly allocated and `Send + Sync`, so builds for
//! different melons can run concurrently without locking.
//!
//! ## Architecture
//!
//! - **Sigmoid**: expected metric value from fitted `{L, k, t0}` (`sigmoid` module)
//! - **Series**: dense ideal trajectory over DAP `0..=horizon` with actual
//!   observations overlaid by DAP (`series` module)
//! - **Deviation**: signed delta and favourability per metric (`deviation` module)
//! - **Configuration**: horizon, canonical metric order, policies (`config` module)
//! - **Report**: fetches from collaborator sources and assembles a melon's view
//!   (`report` module)
//!
//! DAP (days after pollination) is the only alignment key between ideal and
//! actual data; calendar dates are used to derive DAP and for labels.

pub mod config;
pub mod conversions;
pub mod deviation;
pub mod error;
pub mod mocks;
pub mod registry;
pub mod report;
pub mod series;
pub mod sigmoid;
pub mod sources;
pub mod types;
pub mod util;

pub use config::{Favorability, GrowthCfg, MetricCatalog, MetricSpec};
pub use deviation::{
    DeviationComputer, DeviationMismatch, DeviationRecord, HealthSignal, compute_deviations,
    reconcile, reconcile_ideals,
};
pub use error::{GrowthError, GrowthWarning, Result};
pub use registry::{MelonInfo, MelonRegistry};
pub use report::{DaySelector, DayView, GrowthReport, GrowthReporter};
pub use series::{GrowthSeriesBuilder, MAX_HORIZON_DAYS, SeriesSet, build};
pub use sigmoid::evaluate;
pub use types::{MetricSeries, ModelParameters, ModelSet, Observation, SeriesPoint};
