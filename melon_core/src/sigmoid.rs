//! Logistic growth curve `L / (1 + exp(-k (t - t0)))`.

use crate::types::ModelParameters;

/// Largest argument for which `f64::exp` is finite.
const EXP_OVERFLOW_ARG: f64 = 709.782_712_893_384;
/// Below this argument `f64::exp` underflows to zero.
const EXP_UNDERFLOW_ARG: f64 = -745.133_219_101_941_1;

/// Expected metric value at elapsed day `t`.
///
/// Total for every input: the denominator is always >= 1, an overflowing
/// exponent saturates to `0.0`, an underflowing one to `L`, and a `NaN`
/// exponent (`k == 0` with an infinite `t`) to the flat curve value `L / 2`.
#[inline]
pub fn evaluate(t: f64, params: &ModelParameters) -> f64 {
    let arg = -params.k * (t - params.t0);
    if arg.is_nan() {
        return params.l / 2.0;
    }
    if arg > EXP_OVERFLOW_ARG {
        return 0.0;
    }
    if arg < EXP_UNDERFLOW_ARG {
        return params.l;
    }
    params.l / (1.0 + arg.exp())
}

/// Ideal values for DAP `0..=horizon_days`.
pub fn trajectory(params: &ModelParameters, horizon_days: u32) -> Vec<f64> {
    (0..=horizon_days)
        .map(|d| evaluate(f64::from(d), params))
        .collect()
}
