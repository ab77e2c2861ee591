use segidx_common::Result;

use crate::{
    consumer::{BatchConsumer, ConsumeResult, ScanControl},
    model::FramedBatch,
};

/// Outcome of a [`SegmentScanner::scan`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Number of batches fully delivered to the consumer.
    pub batches: u64,
    /// The consumer stopped the scan before the end of input.
    pub stopped_early: bool,
}

/// Drives a [`BatchConsumer`] over the batches of one segment.
pub struct SegmentScanner<'a> {
    consumer: &'a mut dyn BatchConsumer,
}

impl<'a> SegmentScanner<'a> {
    pub fn new(consumer: &'a mut dyn BatchConsumer) -> SegmentScanner<'a> {
        SegmentScanner { consumer }
    }

    /// Delivers the batches to the consumer in iteration order.
    ///
    /// An `Err` item means the reader failed to decode the segment: the scan
    /// stops and the error is returned. Whatever the consumer did with the
    /// batches before that point is kept.
    pub fn scan<I>(&mut self, batches: I) -> Result<ScanSummary>
    where
        I: IntoIterator<Item = Result<FramedBatch>>,
    {
        let mut summary = ScanSummary::default();
        for batch in batches {
            let batch = batch.inspect_err(|e| {
                log::warn!("segment scan aborted after {} batches: {e}", summary.batches)
            })?;
            let header = batch.header;
            match self.consumer.accept(&header) {
                ConsumeResult::AcceptBatch => {
                    self.consumer
                        .begin_batch(header, batch.physical_base_offset, batch.size_on_disk);
                    self.consumer.consume_records(&batch.records);
                }
                ConsumeResult::SkipBatch => {
                    self.consumer
                        .skip_body(header, batch.physical_base_offset, batch.size_on_disk);
                }
                ConsumeResult::StopScan => {
                    summary.stopped_early = true;
                    break;
                }
            }
            summary.batches += 1;
            if self.consumer.end_batch() == ScanControl::Stop {
                summary.stopped_early = true;
                break;
            }
        }
        log::debug!(
            "segment scan finished: {} batches, stopped early: {}",
            summary.batches,
            summary.stopped_early
        );
        Ok(summary)
    }
}
