//! Generate command implementation

use anyhow::{Result, ensure};
use segidx_segment::tests::batch_generator::{SegmentProperties, generate_segment};

use crate::utils;

/// Run the generate command
pub fn run(
    batches: usize,
    records: i32,
    non_data_every: Option<usize>,
    seed: u64,
    output: String,
) -> Result<()> {
    ensure!(records > 0, "--records must be positive");
    let props = SegmentProperties {
        batch_count: batches,
        records_per_batch: 1..records + 1,
        non_data_every,
        seed,
        ..Default::default()
    };
    let segment = generate_segment(&props);
    utils::write_json(&output, &segment)?;

    let size = segment.last().map_or(0, |b| b.end_position());
    println!(
        "Generated {} batches ({}) into {output}",
        segment.len(),
        utils::human_bytes(size)
    );
    Ok(())
}
