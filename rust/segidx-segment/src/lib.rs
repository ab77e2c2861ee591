//! Segment side of the offset index: record batch headers, the batch consumer
//! interface driven by a segment scan, and the [`IndexBuilder`] that samples
//! batches into an [`OffsetIndex`](segidx_offset_index::OffsetIndex) while
//! collecting [`SegmentScanStats`].

pub mod builder;
pub mod config;
pub mod consumer;
pub mod model;
pub mod scan;
pub mod stats;

pub mod tests;

pub use builder::{IndexBuilder, build_offset_index};
pub use config::IndexingConfig;
pub use consumer::{BatchConsumer, ConsumeResult, ScanControl};
pub use model::{FramedBatch, RecordBatchHeader, RecordBatchType};
pub use scan::{ScanSummary, SegmentScanner};
pub use stats::SegmentScanStats;
