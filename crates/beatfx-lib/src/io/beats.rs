use crate::signal::BeatSample;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use std::io::Read;
use std::path::Path;

/// Beat samples from CSV with a `time,value` header (`value` optional).
pub fn parse_beats_csv<R: Read>(reader: R) -> Result<Vec<BeatSample>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);
    let mut samples = Vec::new();
    for (idx, row) in reader.deserialize::<BeatSample>().enumerate() {
        let sample = row.with_context(|| format!("reading beat record {}", idx + 1))?;
        samples.push(sample);
    }
    Ok(samples)
}

/// Beat samples from a JSON array of `{"time": .., "value": ..}` objects.
pub fn parse_beats_json(text: &str) -> Result<Vec<BeatSample>> {
    serde_json::from_str(text).context("parsing beat samples as JSON")
}

/// Sniffs JSON (leading `[`) versus CSV.
pub fn parse_beats(text: &str) -> Result<Vec<BeatSample>> {
    if text.trim_start().starts_with('[') {
        parse_beats_json(text)
    } else {
        parse_beats_csv(text.as_bytes())
    }
}

pub fn read_beats(path: &Path) -> Result<Vec<BeatSample>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_beats(&text).with_context(|| format!("invalid beat file {}", path.display()))
}
