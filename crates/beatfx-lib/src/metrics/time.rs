use super::stats::{diffs, kurtosis, mean, median, rms, skewness, std_dev};
use crate::error::{ratio, DegenerateReason, Diagnostics, HrvError};
use serde::{Deserialize, Serialize};

/// Time-domain statistics over one interval series.
///
/// The same structure is produced for absolute RR intervals (ms) and for
/// relative intervals (dimensionless); `hr`, `pnn25` and `pnn50` only carry
/// physiological meaning for the former.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeDomain {
    pub n: usize,
    pub mean: f64,
    pub median: f64,
    pub sdrr: f64,
    pub rmssd: f64,
    pub sdsd: f64,
    pub sdrr_rmssd: f64,
    pub hr: f64,
    pub pnn25: f64,
    pub pnn50: f64,
    pub kurtosis: f64,
    pub skewness: f64,
}

/// Percentage of successive differences whose magnitude exceeds `threshold`.
fn pnn(differences: &[f64], threshold: f64) -> f64 {
    let count = differences.iter().filter(|d| d.abs() > threshold).count();
    count as f64 / differences.len() as f64 * 100.0
}

/// Computes [`TimeDomain`] over `rr`; undefined fields are recorded in `diag`
/// under their feature key followed by `suffix`.
pub fn compute_time_domain_with(
    rr: &[f64],
    suffix: &str,
    diag: &mut Diagnostics,
) -> Result<TimeDomain, HrvError> {
    if rr.len() < 2 {
        return Err(HrvError::insufficient(2, rr.len(), "RR intervals"));
    }
    let d = diffs(rr);
    let sdrr = std_dev(rr);
    let rmssd = rms(&d);
    let mean = mean(rr);
    let name = |key: &str| format!("{key}{suffix}");
    // HR is only reported for absolute intervals
    let hr = if suffix.is_empty() {
        diag.check("HR", ratio(60000.0, mean), DegenerateReason::ZeroDenominator)
    } else {
        ratio(60000.0, mean)
    };
    Ok(TimeDomain {
        n: rr.len(),
        mean,
        median: median(rr),
        sdrr,
        rmssd,
        sdsd: std_dev(&d),
        sdrr_rmssd: diag.check(
            &name("SDRR_RMSSD"),
            ratio(sdrr, rmssd),
            DegenerateReason::ZeroDenominator,
        ),
        hr,
        pnn25: pnn(&d, 25.0),
        pnn50: pnn(&d, 50.0),
        kurtosis: diag.check(&name("KURT"), kurtosis(rr), DegenerateReason::ZeroVariance),
        skewness: diag.check(&name("SKEW"), skewness(rr), DegenerateReason::ZeroVariance),
    })
}

/// Time-domain statistics of an RR series (ms); at least two intervals are required.
pub fn compute_time_domain(rr: &[f64]) -> Result<(TimeDomain, Diagnostics), HrvError> {
    let mut diag = Diagnostics::new();
    let td = compute_time_domain_with(rr, "", &mut diag)?;
    Ok((td, diag))
}
