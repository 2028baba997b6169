//! Frequency-domain HRV.
//!
//! The default periodogram treats beat index as uniform time with unit
//! spacing, so its frequencies are in cycles per beat rather than Hz. RR
//! intervals are not evenly spaced in wall-clock time; this is a known
//! approximation. [`SpectralMethod::Welch`] resamples onto a uniform grid
//! first and reports Hz.

use super::stats::mean;
use crate::config::SpectralMethod;
use crate::error::{ratio, DegenerateReason, Diagnostics, HrvError};
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Band edges, each half-open `(low, high]`.
pub const VLF_BAND: (f64, f64) = (0.003, 0.04);
pub const LF_BAND: (f64, f64) = (0.04, 0.15);
pub const HF_BAND: (f64, f64) = (0.15, 0.4);

/// Welch segment length in seconds.
const WELCH_SEGMENT_S: f64 = 64.0;

/// Highest accepted resampling rate for the Welch path, Hz.
pub const MAX_INTERP_FS: f64 = 1000.0;

/// Upper bound on the resampled grid (about 4.6 hours at 1 kHz).
const MAX_RESAMPLED_POINTS: f64 = 16_777_216.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    pub vlf: f64,
    pub vlf_pct: f64,
    pub lf: f64,
    pub lf_pct: f64,
    pub lf_nu: f64,
    pub hf: f64,
    pub hf_pct: f64,
    pub hf_nu: f64,
    pub tp: f64,
    pub lf_hf: f64,
    pub hf_lf: f64,
}

impl Spectrum {
    /// Derives totals and ratios from the three band powers.
    pub fn from_bands(vlf: f64, lf: f64, hf: f64, diag: &mut Diagnostics) -> Self {
        let tp = vlf + lf + hf;
        let mut pct = |key: &str, band: f64| {
            diag.check(key, ratio(band, tp) * 100.0, DegenerateReason::ZeroDenominator)
        };
        let vlf_pct = pct("VLF_PCT", vlf);
        let lf_pct = pct("LF_PCT", lf);
        let hf_pct = pct("HF_PCT", hf);
        let zero = DegenerateReason::ZeroDenominator;
        Self {
            vlf,
            vlf_pct,
            lf,
            lf_pct,
            lf_nu: diag.check("LF_NU", ratio(lf, lf + hf), zero),
            hf,
            hf_pct,
            hf_nu: diag.check("HF_NU", ratio(hf, lf + hf), zero),
            tp,
            lf_hf: diag.check("LF_HF", ratio(lf, hf), zero),
            hf_lf: diag.check("HF_LF", ratio(hf, lf), zero),
        }
    }
}

/// One-sided power spectrum: bin frequencies and their powers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerSpectrum {
    pub freqs: Vec<f64>,
    pub powers: Vec<f64>,
}

impl PowerSpectrum {
    /// Sum of bin powers with `low < f <= high`.
    pub fn band_power(&self, band: (f64, f64)) -> f64 {
        self.freqs
            .iter()
            .zip(&self.powers)
            .filter(|(f, _)| **f > band.0 && **f <= band.1)
            .map(|(_, p)| *p)
            .sum()
    }

    pub fn points(&self) -> Vec<[f64; 2]> {
        self.freqs
            .iter()
            .zip(&self.powers)
            .map(|(&f, &p)| [f, p])
            .collect()
    }
}

pub fn power_spectrum(rr: &[f64], method: SpectralMethod) -> Result<PowerSpectrum, HrvError> {
    if rr.len() < 2 {
        return Err(HrvError::insufficient(2, rr.len(), "RR intervals"));
    }
    match method {
        SpectralMethod::Periodogram => periodogram(rr),
        SpectralMethod::Welch { interp_fs } => welch_psd(rr, interp_fs),
    }
}

/// Band powers and derived ratios; undefined ratios are recorded in `diag`.
pub fn compute_spectrum(
    rr: &[f64],
    method: SpectralMethod,
    diag: &mut Diagnostics,
) -> Result<Spectrum, HrvError> {
    let psd = power_spectrum(rr, method)?;
    Ok(Spectrum::from_bands(
        psd.band_power(VLF_BAND),
        psd.band_power(LF_BAND),
        psd.band_power(HF_BAND),
        diag,
    ))
}

/// Squared DFT magnitudes of the mean-removed series, bins `k / n` for `k = 0..=n/2`.
fn periodogram(rr: &[f64]) -> Result<PowerSpectrum, HrvError> {
    let n = rr.len();
    let m = mean(rr);
    let mut planner = RealFftPlanner::<f64>::new();
    let r2c = planner.plan_fft_forward(n);
    let mut frame: Vec<f64> = rr.iter().map(|x| x - m).collect();
    let mut spectrum = r2c.make_output_vec();
    r2c.process(&mut frame, &mut spectrum)
        .map_err(|e| HrvError::Fft(e.to_string()))?;
    let freqs = (0..spectrum.len()).map(|k| k as f64 / n as f64).collect();
    let powers = spectrum.iter().map(|c| c.norm_sqr()).collect();
    Ok(PowerSpectrum { freqs, powers })
}

fn welch_psd(rr: &[f64], fs: f64) -> Result<PowerSpectrum, HrvError> {
    if !(fs > 0.0 && fs <= MAX_INTERP_FS) {
        return Err(HrvError::InvalidConfig(format!(
            "welch interp_fs {fs} must be in (0, {MAX_INTERP_FS}] Hz"
        )));
    }
    let signal = interpolate_rr(rr, fs)?;
    let n = signal.len();
    if n < 4 {
        return Err(HrvError::insufficient(4, n, "resampled points"));
    }
    let window = ((fs * WELCH_SEGMENT_S) as usize).clamp(4, n);
    let step = (window / 2).max(1);
    let taper = hann(window);
    let taper_energy: f64 = taper.iter().map(|w| w * w).sum();
    let mut planner = RealFftPlanner::<f64>::new();
    let r2c = planner.plan_fft_forward(window);
    let mut spectrum = r2c.make_output_vec();
    let mut powers = vec![0.0; spectrum.len()];
    let mut segments = 0;
    let mut pos = 0;
    while pos + window <= n {
        let slice = &signal[pos..pos + window];
        let m = mean(slice);
        let mut frame: Vec<f64> = slice
            .iter()
            .zip(&taper)
            .map(|(x, w)| (x - m) * w)
            .collect();
        r2c.process(&mut frame, &mut spectrum)
            .map_err(|e| HrvError::Fft(e.to_string()))?;
        for (k, val) in spectrum.iter().enumerate() {
            let one_sided = if k == 0 || (window % 2 == 0 && k == window / 2) {
                1.0
            } else {
                2.0
            };
            powers[k] += one_sided * val.norm_sqr() / (fs * taper_energy);
        }
        segments += 1;
        pos += step;
    }
    let df = fs / window as f64;
    // density averaged over segments, times bin width, so bands sum to ms²
    for p in powers.iter_mut() {
        *p *= df / segments as f64;
    }
    log::debug!("welch: {segments} segment(s) of {window} samples at {fs} Hz");
    let freqs = (0..powers.len()).map(|k| k as f64 * df).collect();
    Ok(PowerSpectrum { freqs, powers })
}

/// Linearly resamples RR values (ms) onto a uniform grid in seconds.
///
/// The grid size is checked before anything is allocated; non-finite or
/// non-positive intervals and recordings too long for the grid are rejected.
fn interpolate_rr(rr: &[f64], fs: f64) -> Result<Vec<f64>, HrvError> {
    if let Some(bad) = rr.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
        return Err(HrvError::InvalidInput(format!(
            "RR interval {bad} cannot be resampled"
        )));
    }
    let mut times = Vec::with_capacity(rr.len());
    let mut acc = 0.0;
    for interval in rr {
        acc += interval / 1000.0;
        times.push(acc);
    }
    let (start, end) = (times[0], times[times.len() - 1]);
    let points = ((end - start) * fs).floor() + 1.0;
    if !(points.is_finite() && points <= MAX_RESAMPLED_POINTS) {
        return Err(HrvError::InvalidInput(format!(
            "{:.1} s of RR data at {fs} Hz exceeds the {MAX_RESAMPLED_POINTS} point resampling limit",
            end - start
        )));
    }
    let n = points as usize;
    let mut signal = Vec::with_capacity(n);
    let mut idx = 0;
    for i in 0..n {
        let t = start + i as f64 / fs;
        while idx + 2 < times.len() && times[idx + 1] < t {
            idx += 1;
        }
        let (t0, t1) = (times[idx], times[idx + 1]);
        let frac = if t1 > t0 { ((t - t0) / (t1 - t0)).clamp(0.0, 1.0) } else { 0.0 };
        signal.push(rr[idx] + frac * (rr[idx + 1] - rr[idx]));
    }
    Ok(signal)
}

fn hann(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / size as f64).cos()))
        .collect()
}
