//! Heart-rate-variability feature extraction.
//!
//! Beat timestamps are filtered into RR intervals and reduced to a flat
//! [`FeatureRecord`] of time-domain, frequency-domain and non-linear
//! statistics. Every stage is a pure function of its input.
//!
//! ```
//! use beatfx_lib::{extract_features, BeatSample, FeatureConfig};
//!
//! let beats: Vec<BeatSample> = (0..40)
//!     .scan(0.0, |t, i| {
//!         *t += 800.0 + 25.0 * (i as f64 * 0.7).sin();
//!         Some(BeatSample::new(*t, 74.0))
//!     })
//!     .collect();
//! let record = extract_features(&beats, &FeatureConfig::default()).unwrap();
//! assert!(record.pnn25 >= record.pnn50);
//! ```

pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod metrics;
pub mod signal;

pub use config::{FeatureConfig, HiguchiConfig, SampleEntropyConfig, SpectralMethod};
pub use error::{DegenerateReason, Degeneracy, HrvError};
pub use features::{extract_features, features_from_rr, FeatureRecord};
pub use metrics::*;
pub use signal::*;
