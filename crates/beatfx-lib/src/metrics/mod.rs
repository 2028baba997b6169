pub mod nonlinear;
pub mod poincare;
pub mod spectral;
pub mod stats;
pub mod time;

pub use nonlinear::{compute_nonlinear, higuchi_fd, sample_entropy, Nonlinear};
pub use poincare::{compute_poincare, Poincare};
pub use spectral::{compute_spectrum, power_spectrum, PowerSpectrum, Spectrum};
pub use time::{compute_time_domain, TimeDomain};
