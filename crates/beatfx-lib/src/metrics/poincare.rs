use crate::error::{DegenerateReason, Diagnostics};
use serde::{Deserialize, Serialize};
use std::f64::consts::SQRT_2;

/// Poincaré ellipse axes derived from SDRR and RMSSD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Poincare {
    /// Short-term variability (minor axis)
    pub sd1: f64,
    /// Long-term variability (major axis)
    pub sd2: f64,
}

/// `SD1 = RMSSD / √2`, `SD2 = √(2·SDRR² − SD1²)`.
///
/// A negative radicand leaves `sd2` as `NaN` and records it in `diag`; it is
/// never clamped to zero.
pub fn compute_poincare(sdrr: f64, rmssd: f64, diag: &mut Diagnostics) -> Poincare {
    let sd1 = rmssd / SQRT_2;
    let radicand = 2.0 * sdrr * sdrr - sd1 * sd1;
    let sd2 = if radicand < 0.0 {
        diag.check("SD2", f64::NAN, DegenerateReason::NegativeRadicand)
    } else {
        radicand.sqrt()
    };
    Poincare { sd1, sd2 }
}
