use assert_cmd::cargo::cargo_bin_cmd;
use serde::Deserialize;
use std::error::Error;
use std::path::PathBuf;

#[derive(Deserialize)]
struct HrvPsdOutput {
    lf: f64,
    hf: f64,
    vlf: f64,
    tp: f64,
    lf_nu: f64,
    hf_nu: f64,
    points: Option<Vec<[f64; 2]>>,
}

fn rr_path() -> String {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .join("test_data/rr_sample.txt");
    root.to_string_lossy().to_string()
}

#[test]
fn hrv_psd_command_runs() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("beatfx");
    cmd.args(["hrv-psd", "--input", &rr_path()]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let value: HrvPsdOutput = serde_json::from_slice(&out)?;
    assert!(value.lf >= 0.0);
    assert!(value.hf >= 0.0);
    assert!(value.vlf >= 0.0);
    assert!((value.tp - (value.vlf + value.lf + value.hf)).abs() < 1e-6 * value.tp);
    assert!((value.lf_nu + value.hf_nu - 1.0).abs() < 1e-9);
    assert!(value.points.is_none());
    Ok(())
}

#[test]
fn hrv_psd_points_cover_nyquist() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("beatfx");
    cmd.args(["hrv-psd", "--input", &rr_path(), "--points"]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let value: HrvPsdOutput = serde_json::from_slice(&out)?;
    let points = value.points.expect("points requested");
    // 64 intervals -> 33 one-sided bins up to 0.5 cycles/beat
    assert_eq!(points.len(), 33);
    assert_eq!(points[32][0], 0.5);
    Ok(())
}

#[test]
fn hrv_psd_welch_reads_stdin() -> Result<(), Box<dyn Error>> {
    let text = std::fs::read_to_string(rr_path())?;
    let mut cmd = cargo_bin_cmd!("beatfx");
    cmd.args(["hrv-psd", "--welch-fs", "4"]).write_stdin(text);
    let out = cmd.assert().success().get_output().stdout.clone();
    let value: HrvPsdOutput = serde_json::from_slice(&out)?;
    assert!(value.tp > 0.0);
    Ok(())
}

#[test]
fn hrv_psd_rejects_bad_welch_rate() {
    let mut cmd = cargo_bin_cmd!("beatfx");
    cmd.args(["hrv-psd", "--input", &rr_path(), "--welch-fs", "0"]);
    cmd.assert().failure();

    let mut cmd = cargo_bin_cmd!("beatfx");
    cmd.args(["hrv-psd", "--input", &rr_path(), "--welch-fs", "1e9"]);
    let out = cmd.assert().failure().get_output().stderr.clone();
    assert!(String::from_utf8_lossy(&out).contains("interp_fs"));
}

#[test]
fn hrv_psd_welch_ignores_implausible_values() -> Result<(), Box<dyn Error>> {
    let mut text = std::fs::read_to_string(rr_path())?;
    text.push_str("1e300\n-800\n");
    let mut cmd = cargo_bin_cmd!("beatfx");
    cmd.args(["hrv-psd", "--welch-fs", "4"]).write_stdin(text);
    let out = cmd.assert().success().get_output().stdout.clone();
    let value: HrvPsdOutput = serde_json::from_slice(&out)?;
    assert!(value.tp > 0.0);
    Ok(())
}
