//! Merges every HRV stage into the flat record consumed by the scoring layer.
//!
//! Field names follow the keys of the normalization tables used downstream,
//! including the historical `higuci` spelling.

use crate::config::FeatureConfig;
use crate::error::{Degeneracy, Diagnostics, HrvError};
use crate::metrics::{
    compute_nonlinear, compute_poincare, compute_spectrum, time::compute_time_domain_with,
};
use crate::signal::{BeatSample, RRSeries, RRWindow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(rename = "MEAN_RR")]
    pub mean_rr: f64,
    #[serde(rename = "MEDIAN_RR")]
    pub median_rr: f64,
    #[serde(rename = "SDRR")]
    pub sdrr: f64,
    #[serde(rename = "RMSSD")]
    pub rmssd: f64,
    #[serde(rename = "SDSD")]
    pub sdsd: f64,
    #[serde(rename = "SDRR_RMSSD")]
    pub sdrr_rmssd: f64,
    #[serde(rename = "HR")]
    pub hr: f64,
    #[serde(rename = "pNN25")]
    pub pnn25: f64,
    #[serde(rename = "pNN50")]
    pub pnn50: f64,
    #[serde(rename = "SD1")]
    pub sd1: f64,
    #[serde(rename = "SD2")]
    pub sd2: f64,
    #[serde(rename = "KURT")]
    pub kurt: f64,
    #[serde(rename = "SKEW")]
    pub skew: f64,
    #[serde(rename = "MEAN_REL_RR")]
    pub mean_rel_rr: f64,
    #[serde(rename = "MEDIAN_REL_RR")]
    pub median_rel_rr: f64,
    #[serde(rename = "SDRR_REL_RR")]
    pub sdrr_rel_rr: f64,
    #[serde(rename = "RMSSD_REL_RR")]
    pub rmssd_rel_rr: f64,
    #[serde(rename = "SDSD_REL_RR")]
    pub sdsd_rel_rr: f64,
    #[serde(rename = "SDRR_RMSSD_REL_RR")]
    pub sdrr_rmssd_rel_rr: f64,
    #[serde(rename = "KURT_REL_RR")]
    pub kurt_rel_rr: f64,
    #[serde(rename = "SKEW_REL_RR")]
    pub skew_rel_rr: f64,
    #[serde(rename = "VLF")]
    pub vlf: f64,
    #[serde(rename = "VLF_PCT")]
    pub vlf_pct: f64,
    #[serde(rename = "LF")]
    pub lf: f64,
    #[serde(rename = "LF_PCT")]
    pub lf_pct: f64,
    #[serde(rename = "LF_NU")]
    pub lf_nu: f64,
    #[serde(rename = "HF")]
    pub hf: f64,
    #[serde(rename = "HF_PCT")]
    pub hf_pct: f64,
    #[serde(rename = "HF_NU")]
    pub hf_nu: f64,
    #[serde(rename = "TP")]
    pub tp: f64,
    #[serde(rename = "LF_HF")]
    pub lf_hf: f64,
    #[serde(rename = "HF_LF")]
    pub hf_lf: f64,
    pub sampen: f64,
    pub higuci: f64,
    /// Features emitted as `NaN`, with the reason.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Degeneracy>,
}

impl FeatureRecord {
    /// Every feature key in emission order.
    pub const KEYS: [&'static str; 34] = [
        "MEAN_RR",
        "MEDIAN_RR",
        "SDRR",
        "RMSSD",
        "SDSD",
        "SDRR_RMSSD",
        "HR",
        "pNN25",
        "pNN50",
        "SD1",
        "SD2",
        "KURT",
        "SKEW",
        "MEAN_REL_RR",
        "MEDIAN_REL_RR",
        "SDRR_REL_RR",
        "RMSSD_REL_RR",
        "SDSD_REL_RR",
        "SDRR_RMSSD_REL_RR",
        "KURT_REL_RR",
        "SKEW_REL_RR",
        "VLF",
        "VLF_PCT",
        "LF",
        "LF_PCT",
        "LF_NU",
        "HF",
        "HF_PCT",
        "HF_NU",
        "TP",
        "LF_HF",
        "HF_LF",
        "sampen",
        "higuci",
    ];

    fn values(&self) -> [f64; 34] {
        [
            self.mean_rr,
            self.median_rr,
            self.sdrr,
            self.rmssd,
            self.sdsd,
            self.sdrr_rmssd,
            self.hr,
            self.pnn25,
            self.pnn50,
            self.sd1,
            self.sd2,
            self.kurt,
            self.skew,
            self.mean_rel_rr,
            self.median_rel_rr,
            self.sdrr_rel_rr,
            self.rmssd_rel_rr,
            self.sdsd_rel_rr,
            self.sdrr_rmssd_rel_rr,
            self.kurt_rel_rr,
            self.skew_rel_rr,
            self.vlf,
            self.vlf_pct,
            self.lf,
            self.lf_pct,
            self.lf_nu,
            self.hf,
            self.hf_pct,
            self.hf_nu,
            self.tp,
            self.lf_hf,
            self.hf_lf,
            self.sampen,
            self.higuci,
        ]
    }

    /// Closed key → value mapping, `NaN` kept for undefined features.
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        Self::KEYS.iter().copied().zip(self.values()).collect()
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        Self::KEYS
            .iter()
            .position(|k| *k == key)
            .map(|idx| self.values()[idx])
    }

    pub fn is_degenerate(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Full pipeline: beat samples → filtered RR intervals → feature record.
pub fn extract_features(
    samples: &[BeatSample],
    cfg: &FeatureConfig,
) -> Result<FeatureRecord, HrvError> {
    cfg.validate()?;
    let window = RRWindow {
        min_ms: cfg.min_rr_ms,
        max_ms: cfg.max_rr_ms,
    };
    let rr = RRSeries::from_beats(samples, window)?;
    features_from_rr(&rr, cfg)
}

/// Feature record for callers that already hold accepted RR intervals.
pub fn features_from_rr(rr: &RRSeries, cfg: &FeatureConfig) -> Result<FeatureRecord, HrvError> {
    cfg.validate()?;
    if rr.len() < cfg.min_intervals {
        return Err(HrvError::insufficient(
            cfg.min_intervals,
            rr.len(),
            "accepted RR intervals",
        ));
    }
    let mut diag = Diagnostics::new();
    let td = compute_time_domain_with(&rr.rr, "", &mut diag)?;
    let rel = compute_time_domain_with(&rr.relative(), "_REL_RR", &mut diag)?;
    let poincare = compute_poincare(td.sdrr, td.rmssd, &mut diag);
    let spectrum = compute_spectrum(&rr.rr, cfg.spectral, &mut diag)?;
    let nonlinear = compute_nonlinear(
        &rr.rr,
        td.sdrr,
        &cfg.sample_entropy,
        &cfg.higuchi,
        &mut diag,
    );

    if cfg.strict && !diag.is_empty() {
        return Err(HrvError::DegenerateComputation(diag.into_vec()));
    }

    Ok(FeatureRecord {
        mean_rr: td.mean,
        median_rr: td.median,
        sdrr: td.sdrr,
        rmssd: td.rmssd,
        sdsd: td.sdsd,
        sdrr_rmssd: td.sdrr_rmssd,
        hr: td.hr,
        pnn25: td.pnn25,
        pnn50: td.pnn50,
        sd1: poincare.sd1,
        sd2: poincare.sd2,
        kurt: td.kurtosis,
        skew: td.skewness,
        mean_rel_rr: rel.mean,
        median_rel_rr: rel.median,
        sdrr_rel_rr: rel.sdrr,
        rmssd_rel_rr: rel.rmssd,
        sdsd_rel_rr: rel.sdsd,
        sdrr_rmssd_rel_rr: rel.sdrr_rmssd,
        kurt_rel_rr: rel.kurtosis,
        skew_rel_rr: rel.skewness,
        vlf: spectrum.vlf,
        vlf_pct: spectrum.vlf_pct,
        lf: spectrum.lf,
        lf_pct: spectrum.lf_pct,
        lf_nu: spectrum.lf_nu,
        hf: spectrum.hf,
        hf_pct: spectrum.hf_pct,
        hf_nu: spectrum.hf_nu,
        tp: spectrum.tp,
        lf_hf: spectrum.lf_hf,
        hf_lf: spectrum.hf_lf,
        sampen: nonlinear.sampen,
        higuci: nonlinear.higuchi,
        diagnostics: diag.into_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpectralMethod;
    use crate::error::DegenerateReason;
    use crate::metrics::stats::assert_close;
    use crate::metrics::Poincare;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn lenient() -> FeatureConfig {
        FeatureConfig {
            min_intervals: 2,
            ..FeatureConfig::default()
        }
    }

    fn beats_from_times(times: &[f64]) -> Vec<BeatSample> {
        times.iter().map(|&t| BeatSample::new(t, 72.0)).collect()
    }

    fn jittered_beats(seed: u64, count: usize) -> Vec<BeatSample> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut t = 0.0;
        let mut beats = Vec::with_capacity(count);
        for i in 0..count {
            beats.push(BeatSample::new(t, 70.0));
            let breathing = 40.0 * (i as f64 * 0.9).sin();
            t += 820.0 + breathing + rng.gen_range(-30.0..30.0);
        }
        beats
    }

    #[test]
    fn regular_beats_scenario() {
        let beats = beats_from_times(&[0.0, 800.0, 1600.0, 2400.0, 3200.0]);
        let rec = extract_features(&beats, &lenient()).unwrap();
        assert_eq!(rec.mean_rr, 800.0);
        assert_eq!(rec.sdrr, 0.0);
        assert_eq!(rec.rmssd, 0.0);
        assert_eq!(rec.hr, 75.0);
        assert_eq!(rec.pnn25, 0.0);
        assert_eq!(rec.pnn50, 0.0);
        assert_eq!(rec.sd1, 0.0);
        assert_eq!(rec.sd2, 0.0);
        assert!(rec.sdrr_rmssd.is_nan());
        assert!(rec.tp == 0.0 && rec.lf_hf.is_nan());
        assert!(rec.is_degenerate());
        let flagged: Vec<&str> = rec.diagnostics.iter().map(|d| d.feature.as_str()).collect();
        assert!(flagged.contains(&"SDRR_RMSSD"));
        assert!(flagged.contains(&"LF_HF"));
        assert!(!flagged.contains(&"SD2"));
    }

    #[test]
    fn single_remaining_interval_is_insufficient() {
        let beats = beats_from_times(&[0.0, 800.0, 5000.0]);
        let err = extract_features(&beats, &lenient()).unwrap_err();
        assert!(matches!(
            err,
            HrvError::InsufficientData { needed: 2, found: 1, .. }
        ));
    }

    #[test]
    fn default_policy_needs_ten_intervals() {
        let err = extract_features(&jittered_beats(1, 8), &FeatureConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            HrvError::InsufficientData { needed: 10, found: 7, .. }
        ));
        assert!(extract_features(&jittered_beats(1, 11), &FeatureConfig::default()).is_ok());
    }

    #[test]
    fn too_few_samples() {
        let err = extract_features(&beats_from_times(&[0.0]), &lenient()).unwrap_err();
        assert!(matches!(err, HrvError::InsufficientData { needed: 2, .. }));
    }

    #[test]
    fn record_invariants_on_realistic_series() {
        let rec = extract_features(&jittered_beats(42, 240), &FeatureConfig::default()).unwrap();
        assert!(rec.diagnostics.is_empty(), "{:?}", rec.diagnostics);
        assert_close(rec.mean_rel_rr, 0.0, 1e-12);
        assert!(rec.pnn25 >= rec.pnn50);
        assert_close(rec.vlf_pct + rec.lf_pct + rec.hf_pct, 100.0, 1e-9);
        assert_close(rec.lf_nu + rec.hf_nu, 1.0, 1e-12);
        assert_close(rec.hr, 60000.0 / rec.mean_rr, 1e-9);
        assert_close(rec.sdrr_rel_rr, rec.sdrr / rec.mean_rr, 1e-12);
        assert!(rec.sampen.is_finite() && rec.sampen > 0.0);
        assert!(rec.higuci > 1.0 && rec.higuci < 2.5);
    }

    #[test]
    fn poincare_round_trip_is_exact() {
        let rec = extract_features(&jittered_beats(9, 120), &FeatureConfig::default()).unwrap();
        let mut diag = Diagnostics::new();
        let Poincare { sd1, sd2 } = compute_poincare(rec.sdrr, rec.rmssd, &mut diag);
        assert_eq!(sd1.to_bits(), rec.sd1.to_bits());
        assert_eq!(sd2.to_bits(), rec.sd2.to_bits());
    }

    #[test]
    fn nonlinear_features_are_reproducible() {
        let beats = jittered_beats(77, 150);
        let a = extract_features(&beats, &FeatureConfig::default()).unwrap();
        let b = extract_features(&beats, &FeatureConfig::default()).unwrap();
        assert_eq!(a.sampen.to_bits(), b.sampen.to_bits());
        assert_eq!(a.higuci.to_bits(), b.higuci.to_bits());
    }

    #[test]
    fn strict_mode_rejects_degenerate_records() {
        let beats = beats_from_times(&[0.0, 800.0, 1600.0, 2400.0, 3200.0]);
        let cfg = FeatureConfig {
            strict: true,
            ..lenient()
        };
        match extract_features(&beats, &cfg) {
            Err(HrvError::DegenerateComputation(items)) => {
                assert!(items
                    .iter()
                    .any(|d| d.feature == "KURT" && d.reason == DegenerateReason::ZeroVariance));
            }
            other => panic!("expected degenerate error, got {other:?}"),
        }
    }

    #[test]
    fn map_has_closed_key_set() {
        let rec = extract_features(&jittered_beats(3, 60), &FeatureConfig::default()).unwrap();
        let map = rec.to_map();
        assert_eq!(map.len(), 34);
        assert_eq!(map["MEAN_RR"], rec.mean_rr);
        assert_eq!(rec.get("higuci"), Some(rec.higuci));
        assert_eq!(rec.get("DFA"), None);

        let json = serde_json::to_value(&rec).unwrap();
        let obj = json.as_object().unwrap();
        for key in FeatureRecord::KEYS {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(obj.contains_key("diagnostics"), rec.is_degenerate());
    }

    #[test]
    fn welch_config_changes_only_spectral_fields() {
        let beats = jittered_beats(21, 400);
        let base = extract_features(&beats, &FeatureConfig::default()).unwrap();
        let cfg = FeatureConfig {
            spectral: SpectralMethod::Welch { interp_fs: 4.0 },
            ..FeatureConfig::default()
        };
        let welch = extract_features(&beats, &cfg).unwrap();
        assert_eq!(base.rmssd, welch.rmssd);
        assert_eq!(base.sampen.to_bits(), welch.sampen.to_bits());
        assert_ne!(base.tp, welch.tp);
        assert_close(welch.lf_nu + welch.hf_nu, 1.0, 1e-12);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = FeatureConfig {
            min_rr_ms: 3000.0,
            ..FeatureConfig::default()
        };
        let err = extract_features(&jittered_beats(1, 30), &cfg).unwrap_err();
        assert!(matches!(err, HrvError::InvalidConfig(_)));
    }
}
