use serde::{Deserialize, Serialize};

use crate::model::RecordBatchHeader;

/// Counters collected while a segment is scanned.
///
/// Filled in by the [`IndexBuilder`](crate::IndexBuilder) and read once the scan
/// is finished.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentScanStats {
    /// Offset of the first record in the segment.
    pub base_offset: Option<i64>,
    /// Offset of the last record in the segment.
    pub last_offset: Option<i64>,
    pub base_timestamp: Option<i64>,
    pub last_timestamp: Option<i64>,
    /// Records in batches that count toward logical offsets.
    pub data_records: u64,
    /// Records in configuration and control batches that are excluded from
    /// logical offsets.
    pub non_data_records: u64,
    /// Total size of the scanned batches on disk.
    pub size_bytes: u64,
}

impl SegmentScanStats {
    pub fn new() -> SegmentScanStats {
        Default::default()
    }

    pub fn total_records(&self) -> u64 {
        self.data_records + self.non_data_records
    }

    pub fn is_empty(&self) -> bool {
        self.base_offset.is_none()
    }

    pub(crate) fn add_batch(
        &mut self,
        header: &RecordBatchHeader,
        size_on_disk: u64,
        non_data: bool,
    ) {
        let records = header.records();
        if non_data {
            self.non_data_records += records;
        } else {
            self.data_records += records;
        }
        self.base_offset.get_or_insert(header.base_offset);
        self.last_offset = Some(header.last_offset());
        self.base_timestamp.get_or_insert(header.first_timestamp);
        self.last_timestamp = Some(header.max_timestamp);
        self.size_bytes += size_on_disk;
    }
}
