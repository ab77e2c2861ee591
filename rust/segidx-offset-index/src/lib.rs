//! Compressed, append-only index over three synchronized coordinate spaces of a
//! stored segment: the primary offset of a record, its logical offset (primary
//! offset with non-data records excluded) and the byte position in the segment.
//!
//! The index answers predecessor queries ("the last indexed entry strictly below
//! X") by primary or logical offset without decoding the segment itself, builds
//! coarse logical-offset to byte-position maps for byte-range planning, and can be
//! persisted and restored.

mod coarse;
mod format;
mod offset_index;

pub use coarse::CoarseIndex;
pub use format::OFFSET_INDEX_FORMAT_VERSION;
pub use offset_index::{BUFFER_DEPTH, IndexColumn, IndexEntry, OffsetIndex};
