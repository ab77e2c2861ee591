//! Coarse command implementation

use anyhow::{Context, Result};

use crate::utils;

/// Run the coarse command
pub fn run(step: u64, index_path: String) -> Result<()> {
    let index = utils::read_index(&index_path)?;
    let coarse = index
        .build_coarse_index(step)
        .with_context(|| format!("Failed to build coarse index of {index_path}"))?;

    println!(
        "Coarse index of {index_path}: {} entries, step {}",
        coarse.len(),
        utils::human_bytes(step)
    );
    for (logical_offset, byte_position) in coarse.iter() {
        println!("  {logical_offset:>12} -> {byte_position}");
    }
    Ok(())
}
