use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a feature could not be given a finite value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateReason {
    /// A ratio whose denominator was exactly zero.
    ZeroDenominator,
    /// A square root over a negative radicand.
    NegativeRadicand,
    /// A moment-based statistic over a series without spread.
    ZeroVariance,
    /// Sample entropy found no matching templates.
    NoTemplateMatches,
    /// The series is shorter than the estimator's embedding needs.
    SeriesTooShort,
    /// Higuchi regression had fewer than two usable scales.
    TooFewScales,
}

impl fmt::Display for DegenerateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DegenerateReason::ZeroDenominator => "zero denominator",
            DegenerateReason::NegativeRadicand => "negative radicand",
            DegenerateReason::ZeroVariance => "zero variance",
            DegenerateReason::NoTemplateMatches => "no template matches",
            DegenerateReason::SeriesTooShort => "series too short",
            DegenerateReason::TooFewScales => "too few scales",
        };
        f.write_str(text)
    }
}

/// Tag attached to every feature that was emitted as `NaN`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degeneracy {
    pub feature: String,
    pub reason: DegenerateReason,
}

impl Degeneracy {
    pub fn new(feature: impl Into<String>, reason: DegenerateReason) -> Self {
        Self {
            feature: feature.into(),
            reason,
        }
    }
}

impl fmt::Display for Degeneracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.feature, self.reason)
    }
}

#[derive(Debug, Error)]
pub enum HrvError {
    #[error("insufficient data: need at least {needed} {what}, found {found}")]
    InsufficientData {
        needed: usize,
        found: usize,
        what: &'static str,
    },
    #[error("degenerate computation: {}", join(.0))]
    DegenerateComputation(Vec<Degeneracy>),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("fft error: {0}")]
    Fft(String),
}

impl HrvError {
    pub(crate) fn insufficient(needed: usize, found: usize, what: &'static str) -> Self {
        HrvError::InsufficientData {
            needed,
            found,
            what,
        }
    }
}

fn join(items: &[Degeneracy]) -> String {
    items
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Collects degeneracies while a stage is computed.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    items: Vec<Degeneracy>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `value` unchanged, flagging `feature` when it is `NaN`.
    pub fn check(&mut self, feature: &str, value: f64, reason: DegenerateReason) -> f64 {
        if value.is_nan() {
            log::warn!("{feature} is undefined: {reason}");
            self.items.push(Degeneracy::new(feature, reason));
        }
        value
    }

    pub fn push(&mut self, degeneracy: Degeneracy) {
        self.items.push(degeneracy);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Degeneracy> {
        self.items
    }
}

/// Divides, returning `NaN` instead of an infinity or a silent zero.
pub(crate) fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        f64::NAN
    } else {
        num / den
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_with_zero_denominator_is_nan() {
        assert!(ratio(1.0, 0.0).is_nan());
        assert!(ratio(0.0, 0.0).is_nan());
        assert_eq!(ratio(3.0, 2.0), 1.5);
    }

    #[test]
    fn diagnostics_only_flag_nan() {
        let mut diag = Diagnostics::new();
        diag.check("LF_HF", 2.0, DegenerateReason::ZeroDenominator);
        assert!(diag.is_empty());
        diag.check("HF_LF", f64::NAN, DegenerateReason::ZeroDenominator);
        let items = diag.into_vec();
        assert_eq!(items, vec![Degeneracy::new("HF_LF", DegenerateReason::ZeroDenominator)]);
    }

    #[test]
    fn degenerate_error_lists_fields() {
        let err = HrvError::DegenerateComputation(vec![
            Degeneracy::new("SD2", DegenerateReason::NegativeRadicand),
            Degeneracy::new("KURT", DegenerateReason::ZeroVariance),
        ]);
        assert_eq!(
            err.to_string(),
            "degenerate computation: SD2 (negative radicand), KURT (zero variance)"
        );
    }
}
