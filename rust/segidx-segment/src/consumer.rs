use crate::model::RecordBatchHeader;

/// Decision made by a [`BatchConsumer`] after looking at a batch header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeResult {
    /// Decode the record bodies and pass them to `consume_records`.
    AcceptBatch,
    /// Do not decode the record bodies.
    SkipBatch,
    /// Stop the scan before this batch.
    StopScan,
}

/// Returned by [`BatchConsumer::end_batch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanControl {
    Continue,
    Stop,
}

/// Receives the batches of a segment in file order.
///
/// For every batch the scan driver calls `accept` first, then either
/// `begin_batch` followed by `consume_records` or `skip_body`, and finally
/// `end_batch`. The calls for one batch complete before the next batch starts.
pub trait BatchConsumer {
    fn accept(&self, header: &RecordBatchHeader) -> ConsumeResult;

    /// Starts a batch whose record bodies will be delivered.
    fn begin_batch(
        &mut self,
        header: RecordBatchHeader,
        physical_base_offset: u64,
        size_on_disk: u64,
    );

    /// Starts a batch whose record bodies are not decoded.
    fn skip_body(
        &mut self,
        header: RecordBatchHeader,
        physical_base_offset: u64,
        size_on_disk: u64,
    );

    fn consume_records(&mut self, records: &[u8]);

    fn end_batch(&mut self) -> ScanControl;
}
