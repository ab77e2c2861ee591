//! Find command implementation

use anyhow::{Context, Result};
use segidx_offset_index::{IndexColumn, IndexEntry};

use crate::utils;

/// Run the find command
pub fn run(primary: Option<i64>, logical: Option<i64>, index_path: String) -> Result<()> {
    let (column, bound) = match (primary, logical) {
        (Some(bound), None) => (IndexColumn::Primary, bound),
        (None, Some(bound)) => (IndexColumn::Logical, bound),
        _ => anyhow::bail!("Exactly one of --primary or --logical is required"),
    };
    match find(&index_path, column, bound)? {
        Some(entry) => println!(
            "primary: {}, logical: {}, byte position: {}",
            entry.primary_offset, entry.logical_offset, entry.byte_position
        ),
        None => println!("No entry below {bound}, read from the start of the segment"),
    }
    Ok(())
}

pub fn find(index_path: &str, column: IndexColumn, bound: i64) -> Result<Option<IndexEntry>> {
    let index = utils::read_index(index_path)?;
    index
        .find_predecessor(column, bound)
        .with_context(|| format!("Failed to search index {index_path}"))
}
