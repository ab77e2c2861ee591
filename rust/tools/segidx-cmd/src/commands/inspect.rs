//! Inspect command implementation

use anyhow::{Context, Result};
use segidx_offset_index::{IndexEntry, OffsetIndex};
use serde::Serialize;

use crate::utils;

#[derive(Serialize)]
struct InspectSummary {
    baselines: BaselineInfo,
    min_byte_step: i64,
    entry_count: u64,
    compressed_entries: u64,
    buffered_entries: usize,
    compressed_size: String,
    serialized_size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_entry: Option<EntryInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_entry: Option<EntryInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    entries: Vec<EntryInfo>,
}

#[derive(Serialize)]
struct BaselineInfo {
    primary_offset: i64,
    logical_offset: i64,
    byte_position: i64,
}

#[derive(Serialize)]
struct EntryInfo {
    primary: i64,
    logical: i64,
    #[serde(rename = "at")]
    byte_position: i64,
}

impl From<IndexEntry> for EntryInfo {
    fn from(entry: IndexEntry) -> Self {
        EntryInfo {
            primary: entry.primary_offset,
            logical: entry.logical_offset,
            byte_position: entry.byte_position,
        }
    }
}

/// Run the inspect command
pub fn run(verbose: u8, index_path: String) -> Result<()> {
    println!("Inspecting index: {index_path}");
    let index = utils::read_index(&index_path)?;
    let summary = create_summary(&index, verbose)?;
    let json = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
    println!("{json}");
    Ok(())
}

fn create_summary(index: &OffsetIndex, verbose: u8) -> Result<InspectSummary> {
    let entries = if verbose > 0 {
        index.entries().context("Failed to decode index entries")?
    } else {
        Vec::new()
    };
    Ok(InspectSummary {
        baselines: BaselineInfo {
            primary_offset: index.initial_primary_offset(),
            logical_offset: index.initial_logical_offset(),
            byte_position: index.initial_byte_position(),
        },
        min_byte_step: index.min_byte_step(),
        entry_count: index.len(),
        compressed_entries: index.compressed_len(),
        buffered_entries: index.buffered_len(),
        compressed_size: utils::human_bytes(index.compressed_size_bytes() as u64),
        serialized_size: utils::human_bytes(index.serialized_size() as u64),
        first_entry: index
            .first_entry()
            .context("Failed to decode the first index entry")?
            .map(Into::into),
        last_entry: index
            .last_entry()
            .context("Failed to decode the last index entry")?
            .map(Into::into),
        entries: entries.into_iter().map(Into::into).collect(),
    })
}
