use std::fmt;

use segidx_common::Result;
use segidx_offset_index::OffsetIndex;

use crate::{
    config::IndexingConfig,
    consumer::{BatchConsumer, ConsumeResult, ScanControl},
    model::{FramedBatch, RecordBatchHeader, RecordBatchType},
    scan::SegmentScanner,
    stats::SegmentScanStats,
};

/// Batch that was started but not yet ended.
#[derive(Debug, Clone, Copy)]
struct OpenBatch {
    last_offset: i64,
    end_position: i64,
    is_data: bool,
}

/// Builds an [`OffsetIndex`] while a segment is scanned front to back.
///
/// Every `sampling_step`-th data batch adds one entry: the offset of its last
/// record, the same offset translated to the logical offset space and the byte
/// position right past the batch. Records of non-data batches are added to the
/// running delta, so logical offsets skip them.
pub struct IndexBuilder<'a> {
    index: &'a mut OffsetIndex,
    running_delta: i64,
    window: usize,
    sampling_step: usize,
    filter: Vec<RecordBatchType>,
    stats: Option<&'a mut SegmentScanStats>,
    current: Option<OpenBatch>,
    sampled: u64,
}

impl<'a> IndexBuilder<'a> {
    /// Creates a builder that appends to `index`.
    ///
    /// `initial_delta` is the number of non-data records that precede the
    /// segment.
    pub fn new(
        index: &'a mut OffsetIndex,
        initial_delta: i64,
        sampling_step: usize,
        stats: Option<&'a mut SegmentScanStats>,
    ) -> IndexBuilder<'a> {
        IndexBuilder {
            index,
            running_delta: initial_delta,
            window: 0,
            sampling_step,
            filter: RecordBatchType::non_data_types(),
            stats,
            current: None,
            sampled: 0,
        }
    }

    pub fn with_config(
        index: &'a mut OffsetIndex,
        initial_delta: i64,
        config: &IndexingConfig,
        stats: Option<&'a mut SegmentScanStats>,
    ) -> Result<IndexBuilder<'a>> {
        config.validate()?;
        Ok(IndexBuilder::new(index, initial_delta, config.sampling_step, stats)
            .with_filter(&config.non_data_types))
    }

    /// Replaces the set of batch kinds excluded from logical offsets.
    pub fn with_filter(mut self, non_data_types: &[RecordBatchType]) -> Self {
        self.filter = non_data_types.to_vec();
        self
    }

    /// Number of non-data records seen so far, including the initial delta.
    pub fn running_delta(&self) -> i64 {
        self.running_delta
    }

    /// Number of entries handed to the index. The index may have dropped some
    /// of them because of its minimal byte step.
    pub fn sampled_entries(&self) -> u64 {
        self.sampled
    }

    pub fn stats(&self) -> Option<&SegmentScanStats> {
        self.stats.as_deref()
    }

    fn start_batch(&mut self, header: &RecordBatchHeader, physical_base_offset: u64, size: u64) {
        let is_data = !self.filter.contains(&header.batch_type);
        if !is_data {
            let records = i64::try_from(header.records()).unwrap_or(i64::MAX);
            self.running_delta = self.running_delta.saturating_add(records);
        }
        if let Some(stats) = self.stats.as_deref_mut() {
            stats.add_batch(header, size, !is_data);
        }
        self.current = Some(OpenBatch {
            last_offset: header.last_offset(),
            end_position: i64::try_from(physical_base_offset.saturating_add(size))
                .unwrap_or(i64::MAX),
            is_data,
        });
    }
}

impl fmt::Debug for IndexBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexBuilder")
            .field("running_delta", &self.running_delta)
            .field("window", &self.window)
            .field("sampling_step", &self.sampling_step)
            .field("sampled", &self.sampled)
            .finish_non_exhaustive()
    }
}

impl BatchConsumer for IndexBuilder<'_> {
    /// Only headers are needed, record bodies are never decoded.
    fn accept(&self, _header: &RecordBatchHeader) -> ConsumeResult {
        ConsumeResult::SkipBatch
    }

    fn begin_batch(
        &mut self,
        header: RecordBatchHeader,
        physical_base_offset: u64,
        size_on_disk: u64,
    ) {
        self.start_batch(&header, physical_base_offset, size_on_disk);
    }

    fn skip_body(
        &mut self,
        header: RecordBatchHeader,
        physical_base_offset: u64,
        size_on_disk: u64,
    ) {
        self.start_batch(&header, physical_base_offset, size_on_disk);
    }

    fn consume_records(&mut self, _records: &[u8]) {}

    fn end_batch(&mut self) -> ScanControl {
        let Some(batch) = self.current.take() else {
            return ScanControl::Continue;
        };
        if !batch.is_data {
            return ScanControl::Continue;
        }
        self.window += 1;
        if self.window >= self.sampling_step {
            let logical_offset = batch.last_offset.saturating_sub(self.running_delta);
            let stored = self
                .index
                .append(batch.last_offset, logical_offset, batch.end_position);
            log::trace!(
                "sampled entry {}/{logical_offset}@{} (stored: {stored})",
                batch.last_offset,
                batch.end_position
            );
            self.sampled += 1;
            self.window = 0;
        }
        ScanControl::Continue
    }
}

/// Scans a whole segment and returns its offset index.
///
/// The baselines of the index are taken from the first batch. An `Err` item in
/// `batches` aborts the build.
pub fn build_offset_index<I>(
    batches: I,
    initial_delta: i64,
    config: &IndexingConfig,
    stats: Option<&mut SegmentScanStats>,
) -> Result<OffsetIndex>
where
    I: IntoIterator<Item = Result<FramedBatch>>,
{
    config.validate()?;
    let mut batches = batches.into_iter().peekable();
    let (base_offset, base_position) = match batches.peek() {
        Some(Ok(first)) => (
            first.header.base_offset,
            i64::try_from(first.physical_base_offset).unwrap_or(i64::MAX),
        ),
        _ => (0, 0),
    };
    let mut index = OffsetIndex::new(
        base_offset,
        base_offset.saturating_sub(initial_delta),
        base_position,
        config.min_byte_step,
    );

    let mut builder = IndexBuilder::with_config(&mut index, initial_delta, config, stats)?;
    let summary = SegmentScanner::new(&mut builder).scan(batches)?;
    let sampled = builder.sampled_entries();
    if let Some(stats) = builder.stats() {
        log::debug!(
            "segment indexed: {} batches, {} data records, {} non-data records, {} bytes, \
             {sampled} sampled entries",
            summary.batches,
            stats.data_records,
            stats.non_data_records,
            stats.size_bytes
        );
    } else {
        log::debug!(
            "segment indexed: {} batches, {sampled} sampled entries",
            summary.batches
        );
    }
    Ok(index)
}
