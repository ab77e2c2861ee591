use segidx_common::error::Error;
use segidx_offset_index::{IndexColumn, OffsetIndex};

use crate::{
    FramedBatch, IndexBuilder, IndexingConfig, RecordBatchType, SegmentScanStats, SegmentScanner,
    build_offset_index,
    tests::batch_generator::{SegmentProperties, generate_segment, make_batch, ok_stream},
};

/// Lays out batches of the given kinds and record counts back to back, each
/// with 100 bytes of records.
fn contiguous(layout: &[(RecordBatchType, i32)]) -> Vec<FramedBatch> {
    let mut offset = 0;
    let mut position = 0;
    layout
        .iter()
        .map(|&(batch_type, records)| {
            let batch = make_batch(batch_type, offset, records, position, 100);
            offset = batch.header.last_offset() + 1;
            position = batch.end_position();
            batch
        })
        .collect()
}

fn data_batches(count: usize, records: i32) -> Vec<(RecordBatchType, i32)> {
    vec![(RecordBatchType::RaftData, records); count]
}

fn dense_config(sampling_step: usize) -> IndexingConfig {
    IndexingConfig::default()
        .with_sampling_step(sampling_step)
        .with_min_byte_step(0)
}

#[test]
fn test_every_tenth_batch_is_sampled() {
    let batches = contiguous(&data_batches(100, 10));
    let mut stats = SegmentScanStats::new();
    let index = build_offset_index(
        ok_stream(batches.clone()),
        0,
        &dense_config(10),
        Some(&mut stats),
    )
    .unwrap();

    assert_eq!(index.len(), 10);
    let entries = index.entries().unwrap();
    for (i, entry) in entries.iter().enumerate() {
        let batch = &batches[i * 10 + 9];
        assert_eq!(entry.primary_offset, batch.header.last_offset());
        assert_eq!(entry.logical_offset, entry.primary_offset);
        assert_eq!(entry.byte_position, batch.end_position() as i64);
    }
    assert_eq!(stats.data_records, 1000);
    assert_eq!(stats.non_data_records, 0);
    assert_eq!(stats.base_offset, Some(0));
    assert_eq!(stats.last_offset, Some(999));
}

#[test]
fn test_non_data_batch_shifts_logical_offsets() {
    let mut layout = data_batches(100, 10);
    layout.insert(50, (RecordBatchType::RaftConfiguration, 5));
    let batches = contiguous(&layout);
    let mut stats = SegmentScanStats::new();
    let index = build_offset_index(
        ok_stream(batches),
        0,
        &dense_config(10),
        Some(&mut stats),
    )
    .unwrap();

    assert_eq!(index.len(), 10);
    let entries = index.entries().unwrap();
    for entry in &entries[..5] {
        assert_eq!(entry.logical_offset, entry.primary_offset);
    }
    for entry in &entries[5..] {
        assert_eq!(entry.logical_offset, entry.primary_offset - 5);
    }
    assert_eq!(stats.non_data_records, 5);
    assert_eq!(stats.data_records, 1000);
    assert_eq!(stats.last_offset, Some(1004));
}

#[test]
fn test_initial_delta_applies_to_all_entries() {
    let batches = contiguous(&data_batches(40, 3));
    let index = build_offset_index(ok_stream(batches), 7, &dense_config(4), None).unwrap();
    assert_eq!(index.initial_logical_offset(), -7);
    for entry in index.entries().unwrap() {
        assert_eq!(entry.logical_offset, entry.primary_offset - 7);
    }
}

#[test]
fn test_builder_counters() {
    let mut layout = data_batches(30, 2);
    layout.push((RecordBatchType::ArchivalMetadata, 3));
    layout.push((RecordBatchType::VersionFence, 1));
    let mut index = OffsetIndex::new(0, 0, 0, 0);
    let mut builder = IndexBuilder::new(&mut index, 2, 7, None);
    let summary = SegmentScanner::new(&mut builder)
        .scan(ok_stream(contiguous(&layout)))
        .unwrap();
    assert_eq!(summary.batches, 32);
    assert!(!summary.stopped_early);
    assert_eq!(builder.running_delta(), 2 + 3 + 1);
    assert_eq!(builder.sampled_entries(), 4);
    assert!(builder.stats().is_none());
    assert_eq!(index.len(), 4);
}

#[test]
fn test_custom_filter() {
    let layout = vec![
        (RecordBatchType::RaftData, 10),
        (RecordBatchType::TxFence, 1),
        (RecordBatchType::RaftConfiguration, 1),
        (RecordBatchType::RaftData, 10),
    ];
    let config = dense_config(1).with_non_data_types(&[RecordBatchType::TxFence]);
    let mut stats = SegmentScanStats::new();
    let index = build_offset_index(
        ok_stream(contiguous(&layout)),
        0,
        &config,
        Some(&mut stats),
    )
    .unwrap();

    // The configuration batch now counts as data and is sampled.
    let entries = index.entries().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1].primary_offset, 11);
    assert_eq!(entries[1].logical_offset, 10);
    assert_eq!(entries[2].logical_offset, entries[2].primary_offset - 1);
    assert_eq!(stats.non_data_records, 1);
    assert_eq!(stats.data_records, 21);
}

#[test]
fn test_min_byte_step_limits_density() {
    let batches = generate_segment(&SegmentProperties {
        batch_count: 2000,
        ..Default::default()
    });
    let config = IndexingConfig::default()
        .with_sampling_step(1)
        .with_min_byte_step(256 * 1024);
    let index = build_offset_index(ok_stream(batches.clone()), 0, &config, None).unwrap();
    let total = batches.last().unwrap().end_position() as i64;
    assert!(index.len() > 1);
    assert!(index.len() <= (total / config.min_byte_step) as u64 + 1);
    for pair in index.entries().unwrap().windows(2) {
        assert!(pair[1].byte_position - pair[0].byte_position >= config.min_byte_step);
    }
}

#[test]
fn test_decode_error_keeps_sampled_entries() {
    let batches = contiguous(&data_batches(50, 4));
    let mut index = OffsetIndex::new(0, 0, 0, 0);
    let mut builder = IndexBuilder::new(&mut index, 0, 5, None);
    let stream = batches
        .into_iter()
        .take(23)
        .map(Ok)
        .chain(std::iter::once(Err(Error::invalid_format("record batch crc"))));
    let err = SegmentScanner::new(&mut builder).scan(stream).unwrap_err();
    assert!(err.to_string().contains("record batch crc"));
    assert_eq!(builder.sampled_entries(), 4);

    assert_eq!(index.len(), 4);
    let last = index.last_entry().unwrap().unwrap();
    assert_eq!(last.primary_offset, 20 * 4 - 1);
    assert_eq!(
        index.find_predecessor(IndexColumn::Primary, i64::MAX).unwrap(),
        Some(last)
    );
}

#[test]
fn test_build_from_empty_segment() {
    let mut stats = SegmentScanStats::new();
    let index = build_offset_index(
        ok_stream(Vec::new()),
        0,
        &IndexingConfig::default(),
        Some(&mut stats),
    )
    .unwrap();
    assert!(index.is_empty());
    assert!(stats.is_empty());
}

#[test]
fn test_invalid_config_is_rejected() {
    let batches = contiguous(&data_batches(3, 1));
    let config = IndexingConfig::default().with_sampling_step(0);
    assert!(build_offset_index(ok_stream(batches), 0, &config, None).is_err());
}

#[test]
fn test_generated_segment_round_trip() {
    let batches = generate_segment(&SegmentProperties {
        batch_count: 3000,
        non_data_every: Some(37),
        seed: 5,
        ..Default::default()
    });
    let config = IndexingConfig::default().with_min_byte_step(16 * 1024);
    let index = build_offset_index(ok_stream(batches), 0, &config, None).unwrap();
    let restored = OffsetIndex::from_bytes(&index.to_bytes()).unwrap();
    assert_eq!(index.entries().unwrap(), restored.entries().unwrap());
    assert_eq!(
        index.build_coarse_index(config.coarse_step / 64).unwrap(),
        restored.build_coarse_index(config.coarse_step / 64).unwrap()
    );
}

#[test]
fn test_negative_record_count_counts_as_empty() {
    let mut layout = data_batches(6, 4);
    layout.insert(3, (RecordBatchType::RaftConfiguration, 2));
    let mut batches = contiguous(&layout);
    batches[3].header.record_count = -5;

    let mut index = OffsetIndex::new(0, 0, 0, 0);
    let mut stats = SegmentScanStats::new();
    let mut builder = IndexBuilder::new(&mut index, 1, 1, Some(&mut stats));
    SegmentScanner::new(&mut builder)
        .scan(ok_stream(batches))
        .unwrap();
    assert_eq!(builder.running_delta(), 1);
    assert_eq!(builder.sampled_entries(), 6);
    assert_eq!(stats.non_data_records, 0);
    assert_eq!(stats.data_records, 24);
    for entry in index.entries().unwrap() {
        assert_eq!(entry.logical_offset, entry.primary_offset - 1);
    }
}

#[test]
fn test_end_position_saturates() {
    let batches = vec![
        make_batch(RecordBatchType::RaftData, 0, 1, i64::MAX as u64 - 10, 100),
        make_batch(RecordBatchType::RaftData, 1, 1, u64::MAX - 10, 100),
    ];
    assert_eq!(batches[1].end_position(), u64::MAX);

    let index = build_offset_index(ok_stream(batches), 0, &dense_config(1), None).unwrap();
    let positions: Vec<_> = index
        .entries()
        .unwrap()
        .iter()
        .map(|entry| entry.byte_position)
        .collect();
    assert_eq!(positions, vec![i64::MAX, i64::MAX]);
}

#[test]
fn test_builder_debug() {
    let mut index = OffsetIndex::new(0, 0, 0, 0);
    let builder = IndexBuilder::new(&mut index, 3, 5, None);
    let text = format!("{builder:?}");
    assert!(text.starts_with("IndexBuilder"));
    assert!(text.contains("running_delta: 3"));
    assert!(text.contains("sampling_step: 5"));
    assert!(text.contains("sampled: 0"));
}
