//! Build command implementation

use anyhow::{Context, Result};
use segidx_offset_index::OffsetIndex;
use segidx_segment::{FramedBatch, IndexingConfig, SegmentScanStats, build_offset_index};
use std::fs::File;
use std::io::{BufWriter, Write};

use crate::utils;

/// Run the build command
pub fn run(
    segment_path: String,
    config_path: Option<String>,
    initial_delta: i64,
    output: String,
    stats_path: Option<String>,
) -> Result<()> {
    let config = utils::read_config(config_path.as_deref())?;
    let segment = utils::read_segment(&segment_path)?;
    println!("Indexing segment: {segment_path} ({} batches)", segment.len());

    let (index, stats) = build_index(segment, initial_delta, &config)?;

    let file = File::create(&output).with_context(|| format!("Failed to create {output}"))?;
    let mut writer = BufWriter::new(file);
    let written = index
        .write_to(&mut writer)
        .and_then(|size| writer.flush().map(|_| size))
        .with_context(|| format!("Failed to write index {output}"))?;

    println!("Index written to: {output}");
    println!("  Entries: {}", index.len());
    println!("  Size: {}", utils::human_bytes(written as u64));
    println!(
        "  Records: {} data, {} non-data",
        stats.data_records, stats.non_data_records
    );

    if let Some(stats_path) = stats_path {
        utils::write_json(&stats_path, &stats)?;
        println!("Scan stats written to: {stats_path}");
    }
    Ok(())
}

pub fn build_index(
    segment: Vec<FramedBatch>,
    initial_delta: i64,
    config: &IndexingConfig,
) -> Result<(OffsetIndex, SegmentScanStats)> {
    let mut stats = SegmentScanStats::new();
    let index = build_offset_index(
        segment.into_iter().map(Ok),
        initial_delta,
        config,
        Some(&mut stats),
    )
    .context("Failed to build offset index")?;
    Ok((index, stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_writes_index_and_stats() {
        let dir = tempfile::tempdir().unwrap();
        let path = |name: &str| dir.path().join(name).to_str().unwrap().to_string();

        crate::commands::generate::run(400, 20, Some(50), 3, path("segment.json")).unwrap();
        utils::write_json(
            &path("config.json"),
            &IndexingConfig::default()
                .with_sampling_step(4)
                .with_min_byte_step(0),
        )
        .unwrap();
        run(
            path("segment.json"),
            Some(path("config.json")),
            0,
            path("segment.idx"),
            Some(path("stats.json")),
        )
        .unwrap();

        let index = utils::read_index(&path("segment.idx")).unwrap();
        assert_eq!(index.len(), 98);

        let stats: SegmentScanStats =
            serde_json::from_str(&std::fs::read_to_string(path("stats.json")).unwrap()).unwrap();
        assert_eq!(stats.non_data_records, 8);
        assert_eq!(stats.base_offset, Some(0));
    }
}
