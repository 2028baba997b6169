//! Descriptive statistics shared by the HRV metrics.
//!
//! Dispersion uses the sample (n - 1) estimator. A single value has no
//! spread, so its standard deviation is 0 rather than undefined. Shape
//! statistics use population central moments.

pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

pub fn median(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

pub fn std_dev(data: &[f64]) -> f64 {
    match data.len() {
        0 => f64::NAN,
        1 => 0.0,
        n => {
            let m = mean(data);
            (data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n as f64 - 1.0)).sqrt()
        }
    }
}

pub fn rms(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    (data.iter().map(|x| x * x).sum::<f64>() / data.len() as f64).sqrt()
}

pub fn diffs(data: &[f64]) -> Vec<f64> {
    data.windows(2).map(|w| w[1] - w[0]).collect()
}

fn central_moment(data: &[f64], mean: f64, order: i32) -> f64 {
    data.iter().map(|x| (x - mean).powi(order)).sum::<f64>() / data.len() as f64
}

/// Excess kurtosis `m4 / m2^2 - 3`; `NaN` when the data has no spread.
pub fn kurtosis(data: &[f64]) -> f64 {
    let m = mean(data);
    let m2 = central_moment(data, m, 2);
    if !(m2 > 0.0) {
        return f64::NAN;
    }
    central_moment(data, m, 4) / (m2 * m2) - 3.0
}

/// Skewness `m3 / m2^1.5`; `NaN` when the data has no spread.
pub fn skewness(data: &[f64]) -> f64 {
    let m = mean(data);
    let m2 = central_moment(data, m, 2);
    if !(m2 > 0.0) {
        return f64::NAN;
    }
    central_moment(data, m, 3) / m2.powf(1.5)
}

#[cfg(test)]
pub(crate) fn assert_close(actual: f64, expected: f64, tol: f64) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tol,
        "expected {expected}, got {actual} (diff {diff} > tol {tol})"
    );
}
