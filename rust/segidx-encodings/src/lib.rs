//! Block-oriented compression of monotonic integer columns.
//!
//! A column is a sequence of `i64` values appended in blocks of [`BLOCK_SIZE`].
//! Every value is turned into a residual by a [`DeltaStep`] strategy (first-order
//! delta or delta-of-delta), and each block of residuals is stored with
//! frame-of-reference encoding: the minimal residual of the block followed by the
//! bit-packed differences from it.

pub mod bitpacking;
pub mod column;
pub mod delta;

pub use column::{ColumnDecoder, ColumnEncoder};
pub use delta::{Delta, DeltaDelta, DeltaKind, DeltaState, DeltaStep};

/// Number of values compressed together as a unit.
pub const BLOCK_SIZE: usize = 16;

const _: () = assert!(BLOCK_SIZE.is_power_of_two());
