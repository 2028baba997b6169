use crate::error::HrvError;
use serde::{Deserialize, Serialize};

/// A single detected beat as delivered by the acquisition layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeatSample {
    /// Timestamp in milliseconds
    pub time: f64,
    /// Heart rate or raw sensor value; only carried along
    #[serde(default)]
    pub value: f64,
}

impl BeatSample {
    pub fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

/// Physiological plausibility window for RR intervals, exclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RRWindow {
    pub min_ms: f64,
    pub max_ms: f64,
}

impl Default for RRWindow {
    fn default() -> Self {
        Self {
            min_ms: 250.0,
            max_ms: 2000.0,
        }
    }
}

impl RRWindow {
    pub fn accepts(&self, dt: f64) -> bool {
        dt > self.min_ms && dt < self.max_ms
    }
}

/// RR intervals (milliseconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RRSeries {
    pub rr: Vec<f64>,
}

impl RRSeries {
    pub fn new(rr: Vec<f64>) -> Self {
        Self { rr }
    }

    /// Differences between adjacent beats, keeping only those inside `window`.
    ///
    /// Out-of-order pairs give a negative difference and are dropped like any
    /// other implausible interval.
    pub fn from_beats(samples: &[BeatSample], window: RRWindow) -> Result<Self, HrvError> {
        if samples.len() < 2 {
            return Err(HrvError::insufficient(2, samples.len(), "beat samples"));
        }
        let raw = samples.windows(2).map(|w| w[1].time - w[0].time).collect();
        Ok(Self::new(raw).within(window))
    }

    /// Keeps only the intervals inside `window`.
    pub fn within(self, window: RRWindow) -> Self {
        let total = self.rr.len();
        let rr: Vec<f64> = self.rr.into_iter().filter(|&dt| window.accepts(dt)).collect();
        let dropped = total - rr.len();
        if dropped > 0 {
            log::debug!(
                "dropped {dropped} of {total} intervals outside ({}, {}) ms",
                window.min_ms,
                window.max_ms
            );
        }
        Self { rr }
    }

    pub fn len(&self) -> usize {
        self.rr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rr.is_empty()
    }

    pub fn mean(&self) -> f64 {
        crate::metrics::stats::mean(&self.rr)
    }

    /// `(rr - mean) / mean` for every interval, same order.
    pub fn relative(&self) -> Vec<f64> {
        let mean = self.mean();
        self.rr.iter().map(|rr| (rr - mean) / mean).collect()
    }

    /// Successive differences `rr[i] - rr[i-1]`.
    pub fn successive_differences(&self) -> Vec<f64> {
        crate::metrics::stats::diffs(&self.rr)
    }

    /// Beat timestamps reproducing these intervals, starting at `start`.
    pub fn to_beats(&self, start: f64) -> Vec<BeatSample> {
        let mut acc = start;
        let mut beats = Vec::with_capacity(self.rr.len() + 1);
        beats.push(BeatSample::new(acc, 0.0));
        for interval in &self.rr {
            acc += interval;
            beats.push(BeatSample::new(acc, 60000.0 / interval));
        }
        beats
    }
}

/// Free-function form of [`RRSeries::from_beats`] with the default window.
pub fn extract_intervals(samples: &[BeatSample]) -> Result<RRSeries, HrvError> {
    RRSeries::from_beats(samples, RRWindow::default())
}
