//! File loading and output helpers shared by the subcommands.

use anyhow::{Context, Result};
use serde::Serialize;
use segidx_offset_index::OffsetIndex;
use segidx_segment::{FramedBatch, IndexingConfig};
use std::fs;

/// Renders a byte count with binary units, e.g. `1.5 MiB`.
pub fn human_bytes(bytes: u64) -> String {
    let units = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = units[0];
    for next in &units[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.1} {unit}")
}

/// Reads a whole input file. A missing path or a directory fails here with the
/// path in the error chain.
fn read_input(path: &str, what: &str) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {what} {path}"))
}

pub fn read_segment(path: &str) -> Result<Vec<FramedBatch>> {
    let content = read_input(path, "segment description")?;
    let segment: Vec<FramedBatch> = serde_json::from_slice(&content)
        .with_context(|| format!("Failed to parse segment description {path}"))?;
    log::debug!("loaded {} batches from {path}", segment.len());
    Ok(segment)
}

pub fn read_config(path: Option<&str>) -> Result<IndexingConfig> {
    let config = match path {
        Some(path) => {
            let content = read_input(path, "config")?;
            serde_json::from_slice(&content)
                .with_context(|| format!("Failed to parse config {path}"))?
        }
        None => IndexingConfig::default(),
    };
    config.validate().context("Invalid indexing config")?;
    log::debug!("indexing config: {config:?}");
    Ok(config)
}

pub fn read_index(path: &str) -> Result<OffsetIndex> {
    let data = read_input(path, "index")?;
    OffsetIndex::from_bytes(&data).map_err(|e| {
        if e.is_corrupt_index() {
            anyhow::anyhow!("Index {path} is corrupt and must be rebuilt from the segment: {e}")
        } else {
            anyhow::Error::new(e).context(format!("Failed to load index {path}"))
        }
    })
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
    fs::write(path, json).with_context(|| format!("Failed to write {path}"))
}
