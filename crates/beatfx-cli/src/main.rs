use anyhow::{Context, Result};
use beatfx_lib::{
    error::Diagnostics,
    extract_features,
    io::{beats as beats_io, text as text_io},
    metrics::{
        compute_nonlinear, compute_poincare, compute_time_domain, power_spectrum,
        spectral::{Spectrum, HF_BAND, LF_BAND, VLF_BAND},
        TimeDomain,
    },
    signal::{BeatSample, RRSeries, RRWindow},
    Degeneracy, FeatureConfig, SpectralMethod,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "beatfx",
    version,
    about = "beatfx: heart-rate-variability feature extraction"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter beat timestamps (CSV or JSON) into RR intervals
    Intervals {
        #[arg(long)]
        input: Option<PathBuf>,
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Time-domain HRV from newline-delimited RR intervals (ms)
    ///
    /// Intervals outside --min-rr-ms/--max-rr-ms are dropped before analysis.
    HrvTime {
        #[arg(long)]
        input: Option<PathBuf>,
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Frequency-domain HRV (periodogram, or Welch when --welch-fs is given)
    ///
    /// Intervals outside --min-rr-ms/--max-rr-ms are dropped before analysis.
    HrvPsd {
        #[arg(long)]
        input: Option<PathBuf>,
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long)]
        welch_fs: Option<f64>,
        /// Include the raw spectrum points in the output
        #[arg(long)]
        points: bool,
    },
    /// Nonlinear HRV metrics (Poincaré, SampEn, Higuchi)
    ///
    /// Intervals outside --min-rr-ms/--max-rr-ms are dropped before analysis.
    HrvNonlinear {
        #[arg(long)]
        input: Option<PathBuf>,
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Full feature record from beat timestamps
    Features {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        min_intervals: Option<usize>,
        /// Fail instead of emitting undefined features
        #[arg(long)]
        strict: bool,
    },
}

/// Plausibility window for RR intervals, exclusive on both ends.
#[derive(Args, Clone, Copy)]
struct WindowArgs {
    #[arg(long, default_value_t = 250.0)]
    min_rr_ms: f64,
    #[arg(long, default_value_t = 2000.0)]
    max_rr_ms: f64,
}

impl WindowArgs {
    fn window(self) -> RRWindow {
        RRWindow {
            min_ms: self.min_rr_ms,
            max_ms: self.max_rr_ms,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Intervals { input, window } => cmd_intervals(input.as_deref(), window)?,
        Commands::HrvTime { input, window } => cmd_hrv_time(input.as_deref(), window)?,
        Commands::HrvPsd {
            input,
            window,
            welch_fs,
            points,
        } => cmd_hrv_psd(input.as_deref(), window, welch_fs, points)?,
        Commands::HrvNonlinear {
            input,
            window,
            config,
        } => cmd_hrv_nonlinear(input.as_deref(), window, config.as_deref())?,
        Commands::Features {
            input,
            config,
            min_intervals,
            strict,
        } => cmd_features(input.as_deref(), config.as_deref(), min_intervals, strict)?,
    }
    Ok(())
}

fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn read_beats(input: Option<&Path>) -> Result<Vec<BeatSample>> {
    match input {
        Some(path) => beats_io::read_beats(path),
        None => beats_io::parse_beats(&read_input(None)?),
    }
}

fn rr_series_from_input(input: Option<&Path>, window: WindowArgs) -> Result<RRSeries> {
    let cfg = FeatureConfig {
        min_rr_ms: window.min_rr_ms,
        max_rr_ms: window.max_rr_ms,
        ..FeatureConfig::default()
    };
    cfg.validate()?;
    let rr = match input {
        Some(path) => text_io::read_rr_series(path)?,
        None => text_io::parse_f64_series(&read_input(None)?)?,
    };
    let total = rr.len();
    let series = RRSeries::new(rr).within(window.window());
    if series.len() < total {
        log::warn!("{} of {total} RR values outside the plausibility window", total - series.len());
    }
    Ok(series)
}

fn load_config(path: Option<&Path>) -> Result<FeatureConfig> {
    match path {
        Some(path) => FeatureConfig::load(path),
        None => Ok(FeatureConfig::default()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn cmd_intervals(input: Option<&Path>, window: WindowArgs) -> Result<()> {
    let beats = read_beats(input)?;
    let rr = RRSeries::from_beats(&beats, window.window())?;
    log::info!("{} of {} intervals accepted", rr.len(), beats.len().saturating_sub(1));
    print_json(&rr)
}

fn cmd_hrv_time(input: Option<&Path>, window: WindowArgs) -> Result<()> {
    let rr = rr_series_from_input(input, window)?;
    let (td, diag) = compute_time_domain(&rr.rr)?;
    #[derive(Serialize)]
    struct Output {
        #[serde(flatten)]
        time: TimeDomain,
        diagnostics: Vec<Degeneracy>,
    }
    print_json(&Output {
        time: td,
        diagnostics: diag.into_vec(),
    })
}

fn cmd_hrv_psd(
    input: Option<&Path>,
    window: WindowArgs,
    welch_fs: Option<f64>,
    points: bool,
) -> Result<()> {
    let rr = rr_series_from_input(input, window)?;
    let method = match welch_fs {
        Some(interp_fs) => SpectralMethod::Welch { interp_fs },
        None => SpectralMethod::Periodogram,
    };
    let cfg = FeatureConfig {
        spectral: method,
        ..FeatureConfig::default()
    };
    cfg.validate()?;
    let psd = power_spectrum(&rr.rr, method)?;
    let mut diag = Diagnostics::new();
    let spectrum = Spectrum::from_bands(
        psd.band_power(VLF_BAND),
        psd.band_power(LF_BAND),
        psd.band_power(HF_BAND),
        &mut diag,
    );
    #[derive(Serialize)]
    struct Output {
        #[serde(flatten)]
        spectrum: Spectrum,
        #[serde(skip_serializing_if = "Option::is_none")]
        points: Option<Vec<[f64; 2]>>,
        diagnostics: Vec<Degeneracy>,
    }
    print_json(&Output {
        spectrum,
        points: points.then(|| psd.points()),
        diagnostics: diag.into_vec(),
    })
}

fn cmd_hrv_nonlinear(
    input: Option<&Path>,
    window: WindowArgs,
    config: Option<&Path>,
) -> Result<()> {
    let cfg = load_config(config)?;
    let rr = rr_series_from_input(input, window)?;
    let (td, mut diag) = compute_time_domain(&rr.rr)?;
    let poincare = compute_poincare(td.sdrr, td.rmssd, &mut diag);
    let nonlinear = compute_nonlinear(
        &rr.rr,
        td.sdrr,
        &cfg.sample_entropy,
        &cfg.higuchi,
        &mut diag,
    );
    #[derive(Serialize)]
    struct Output {
        sd1: f64,
        sd2: f64,
        sampen: f64,
        higuchi: f64,
        diagnostics: Vec<Degeneracy>,
    }
    print_json(&Output {
        sd1: poincare.sd1,
        sd2: poincare.sd2,
        sampen: nonlinear.sampen,
        higuchi: nonlinear.higuchi,
        diagnostics: diag.into_vec(),
    })
}

fn cmd_features(
    input: Option<&Path>,
    config: Option<&Path>,
    min_intervals: Option<usize>,
    strict: bool,
) -> Result<()> {
    let mut cfg = load_config(config)?;
    if let Some(min) = min_intervals {
        cfg.min_intervals = min;
    }
    cfg.strict |= strict;
    let beats = read_beats(input)?;
    let record = extract_features(&beats, &cfg)?;
    if record.is_degenerate() {
        log::warn!("{} feature(s) undefined", record.diagnostics.len());
    }
    print_json(&record)
}
