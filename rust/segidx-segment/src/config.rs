use serde::{Deserialize, Serialize};

use segidx_common::{Result, verify_arg};

use crate::model::RecordBatchType;

/// Every 16th data batch is added to the offset index.
pub const DEFAULT_SAMPLING_STEP: usize = 16;

/// Consecutive offset index entries are at least 64 KiB apart.
pub const DEFAULT_MIN_BYTE_STEP: i64 = 64 * 1024;

/// Resolution of the coarse index.
pub const DEFAULT_COARSE_STEP: u64 = 16 * 1024 * 1024;

/// Parameters of the offset index construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    /// Number of data batches between two sampled index entries.
    pub sampling_step: usize,

    /// Minimal byte distance between two stored index entries.
    pub min_byte_step: i64,

    /// Step of the coarse index built from the offset index.
    pub coarse_step: u64,

    /// Batch kinds excluded from logical offsets.
    pub non_data_types: Vec<RecordBatchType>,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        IndexingConfig {
            sampling_step: DEFAULT_SAMPLING_STEP,
            min_byte_step: DEFAULT_MIN_BYTE_STEP,
            coarse_step: DEFAULT_COARSE_STEP,
            non_data_types: RecordBatchType::non_data_types(),
        }
    }
}

impl IndexingConfig {
    pub fn with_sampling_step(&self, step: usize) -> Self {
        let mut config = self.clone();
        config.sampling_step = step;
        config
    }

    pub fn with_min_byte_step(&self, step: i64) -> Self {
        let mut config = self.clone();
        config.min_byte_step = step;
        config
    }

    pub fn with_coarse_step(&self, step: u64) -> Self {
        let mut config = self.clone();
        config.coarse_step = step;
        config
    }

    pub fn with_non_data_types(&self, types: &[RecordBatchType]) -> Self {
        let mut config = self.clone();
        config.non_data_types = types.to_vec();
        config
    }

    pub fn validate(&self) -> Result<()> {
        verify_arg!(sampling_step, self.sampling_step > 0);
        verify_arg!(min_byte_step, self.min_byte_step >= 0);
        Ok(())
    }
}
