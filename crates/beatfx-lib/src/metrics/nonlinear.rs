use crate::config::{HiguchiConfig, SampleEntropyConfig};
use crate::error::{DegenerateReason, Diagnostics};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Nonlinear {
    pub sampen: f64,
    pub higuchi: f64,
}

/// Sample entropy and Higuchi dimension of `rr`. The entropy tolerance is
/// `r_factor * sdrr`.
pub fn compute_nonlinear(
    rr: &[f64],
    sdrr: f64,
    sampen_cfg: &SampleEntropyConfig,
    higuchi_cfg: &HiguchiConfig,
    diag: &mut Diagnostics,
) -> Nonlinear {
    let r = sampen_cfg.r_factor * sdrr;
    log::debug!("sample entropy m={} r={r:.3}", sampen_cfg.m);
    let sampen_reason = if rr.len() < sampen_cfg.m + 2 {
        DegenerateReason::SeriesTooShort
    } else {
        DegenerateReason::NoTemplateMatches
    };
    Nonlinear {
        sampen: diag.check("sampen", sample_entropy(rr, sampen_cfg.m, r), sampen_reason),
        higuchi: diag.check(
            "higuci",
            higuchi_fd(rr, higuchi_cfg.k_max),
            DegenerateReason::TooFewScales,
        ),
    }
}

/// `-ln(A / B)` where B counts template pairs of length `m` within Chebyshev
/// distance `r` and A the pairs that still match at length `m + 1`. Both
/// counts use the same `n - m` template starts and exclude self-matches.
/// `NaN` when either count is zero.
pub fn sample_entropy(data: &[f64], m: usize, r: f64) -> f64 {
    if m == 0 || data.len() < m + 2 {
        return f64::NAN;
    }
    let starts = data.len() - m;
    let mut count_m = 0u64;
    let mut count_m1 = 0u64;
    for i in 0..starts {
        for j in (i + 1)..starts {
            if max_diff(data, i, j, m) <= r {
                count_m += 1;
                if (data[i + m] - data[j + m]).abs() <= r {
                    count_m1 += 1;
                }
            }
        }
    }
    if count_m == 0 || count_m1 == 0 {
        return f64::NAN;
    }
    -(count_m1 as f64 / count_m as f64).ln()
}

fn max_diff(data: &[f64], i: usize, j: usize, length: usize) -> f64 {
    data[i..i + length]
        .iter()
        .zip(data[j..j + length].iter())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max)
}

/// Higuchi fractal dimension: slope of `ln L(k)` against `ln(1/k)` for
/// `k = 1..=k_max` (capped at `n / 2`). `NaN` with fewer than two scales of
/// non-zero curve length.
pub fn higuchi_fd(data: &[f64], k_max: usize) -> f64 {
    let n = data.len();
    let k_max = k_max.min(n / 2);
    let mut points = Vec::with_capacity(k_max);
    for k in 1..=k_max {
        let mut total = 0.0;
        let mut offsets = 0;
        for m in 0..k {
            let steps = (n - 1 - m) / k;
            if steps == 0 {
                continue;
            }
            let length: f64 = (1..=steps)
                .map(|i| (data[m + i * k] - data[m + (i - 1) * k]).abs())
                .sum();
            let norm = (n - 1) as f64 / (steps * k) as f64;
            total += length * norm / k as f64;
            offsets += 1;
        }
        if offsets == 0 {
            continue;
        }
        let curve = total / offsets as f64;
        if curve > 0.0 && curve.is_finite() {
            points.push(((1.0 / k as f64).ln(), curve.ln()));
        }
    }
    if points.len() < 2 {
        return f64::NAN;
    }
    slope(&points)
}

/// Least-squares slope through `(x, y)` points.
fn slope(points: &[(f64, f64)]) -> f64 {
    let n = points.len() as f64;
    let (mut sum_x, mut sum_y, mut sum_xx, mut sum_xy) = (0.0, 0.0, 0.0, 0.0);
    for &(x, y) in points {
        sum_x += x;
        sum_y += y;
        sum_xx += x * x;
        sum_xy += x * y;
    }
    let denom = n * sum_xx - sum_x * sum_x;
    if denom.abs() < f64::EPSILON {
        return f64::NAN;
    }
    (n * sum_xy - sum_x * sum_y) / denom
}
