use serde::{Deserialize, Serialize};

use segidx_common::{Result, error::Error};

/// Size of the fixed batch header as it is framed on disk.
pub const RECORD_BATCH_HEADER_SIZE: u64 = 61;

/// Kind of a record batch.
///
/// Only `RaftData` batches carry user records; the other kinds are control
/// and metadata batches written by the storage layer itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i8)]
pub enum RecordBatchType {
    RaftData = 1,
    RaftConfiguration = 2,
    Controller = 3,
    KvStore = 4,
    Checkpoint = 5,
    TopicManagement = 6,
    GhostBatch = 7,
    IdAllocator = 8,
    TxPrepare = 9,
    TxFence = 10,
    TmUpdate = 11,
    UserManagement = 12,
    AclManagement = 13,
    GroupPrepareTx = 14,
    GroupCommitTx = 15,
    GroupAbortTx = 16,
    NodeManagement = 17,
    DataPolicyManagement = 18,
    ArchivalMetadata = 19,
    ClusterConfig = 20,
    FeatureUpdate = 21,
    ClusterBootstrap = 22,
    VersionFence = 23,
}

impl RecordBatchType {
    /// Batch kinds that are excluded from the logical offset space.
    pub fn non_data_types() -> Vec<RecordBatchType> {
        vec![
            RecordBatchType::RaftConfiguration,
            RecordBatchType::ArchivalMetadata,
            RecordBatchType::VersionFence,
        ]
    }

    pub fn as_i8(self) -> i8 {
        self as i8
    }
}

impl TryFrom<i8> for RecordBatchType {
    type Error = Error;

    fn try_from(value: i8) -> Result<Self> {
        use RecordBatchType::*;
        Ok(match value {
            1 => RaftData,
            2 => RaftConfiguration,
            3 => Controller,
            4 => KvStore,
            5 => Checkpoint,
            6 => TopicManagement,
            7 => GhostBatch,
            8 => IdAllocator,
            9 => TxPrepare,
            10 => TxFence,
            11 => TmUpdate,
            12 => UserManagement,
            13 => AclManagement,
            14 => GroupPrepareTx,
            15 => GroupCommitTx,
            16 => GroupAbortTx,
            17 => NodeManagement,
            18 => DataPolicyManagement,
            19 => ArchivalMetadata,
            20 => ClusterConfig,
            21 => FeatureUpdate,
            22 => ClusterBootstrap,
            23 => VersionFence,
            _ => {
                return Err(Error::invalid_arg(
                    "batch_type",
                    format!("unknown record batch type {value}"),
                ));
            }
        })
    }
}

/// Header of a record batch, as decoded by the segment reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBatchHeader {
    /// Primary offset of the first record in the batch.
    pub base_offset: i64,
    pub last_offset_delta: i32,
    pub record_count: i32,
    pub batch_type: RecordBatchType,
    pub first_timestamp: i64,
    pub max_timestamp: i64,
    /// Size of the batch including the header.
    pub size_bytes: i32,
}

impl RecordBatchHeader {
    /// Primary offset of the last record in the batch.
    pub fn last_offset(&self) -> i64 {
        self.base_offset + self.last_offset_delta as i64
    }

    /// Number of records in the batch. A negative count in a damaged header
    /// counts as zero.
    pub fn records(&self) -> u64 {
        self.record_count.max(0) as u64
    }
}

/// One batch handed to the scan driver by the segment reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramedBatch {
    pub header: RecordBatchHeader,
    /// Byte position of the batch start in the segment.
    pub physical_base_offset: u64,
    pub size_on_disk: u64,
    /// Encoded record bodies, empty when the reader did not load them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<u8>,
}

impl FramedBatch {
    /// Byte position right past the end of the batch.
    pub fn end_position(&self) -> u64 {
        self.physical_base_offset.saturating_add(self.size_on_disk)
    }
}
