use segidx_common::{Result, error::Error, verify_data};
use segidx_encodings::{BLOCK_SIZE, ColumnDecoder, ColumnEncoder, Delta, DeltaDelta};

use crate::coarse::CoarseIndex;

/// Capacity of the pending write buffer, equal to the column block size.
pub const BUFFER_DEPTH: usize = BLOCK_SIZE;

const INDEX_MASK: u64 = BUFFER_DEPTH as u64 - 1;

/// A single indexed position in the segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexEntry {
    pub primary_offset: i64,
    pub logical_offset: i64,
    pub byte_position: i64,
}

/// Searchable column of the [`OffsetIndex`].
///
/// Byte positions are not searchable; they are only returned as part of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexColumn {
    Primary,
    Logical,
}

/// Result of the first stage of a predecessor search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FindOutcome {
    /// Every stored value is `>= upper_bound`.
    NotFound,
    /// Found in the compressed columns; the other coordinates still have to
    /// be fetched at this position.
    ResolvedAtPosition(u64),
    /// Found in the write buffer, nothing left to decode.
    Resolved(IndexEntry),
}

/// Offset index of a stored segment.
///
/// Entries are triples of primary offset, logical offset and byte position. They
/// are collected in a small write buffer and compressed a block at a time into
/// three columns. All three columns always hold the same number of values, so a
/// position found in one column addresses the same entry in the others.
///
/// The search is linear over the decoded blocks. It is possible to search by
/// primary and logical offsets, but not by byte position.
#[derive(Debug, Clone)]
pub struct OffsetIndex {
    pub(crate) primary_buf: [i64; BUFFER_DEPTH],
    pub(crate) logical_buf: [i64; BUFFER_DEPTH],
    pub(crate) byte_buf: [i64; BUFFER_DEPTH],
    /// Total number of appended entries, compressed and buffered.
    pub(crate) pos: u64,
    pub(crate) initial_primary: i64,
    pub(crate) initial_logical: i64,
    pub(crate) initial_byte_pos: i64,
    pub(crate) min_byte_step: i64,
    pub(crate) primary_index: ColumnEncoder<Delta>,
    pub(crate) logical_index: ColumnEncoder<Delta>,
    pub(crate) byte_index: ColumnEncoder<DeltaDelta>,
}

impl OffsetIndex {
    /// Creates an empty index.
    ///
    /// The initial values are the frames of reference of the three columns.
    /// `min_byte_step` is the minimal distance in bytes between two consecutively
    /// stored entries; entries closer to their predecessor are dropped. Zero
    /// keeps every entry.
    pub fn new(
        initial_primary: i64,
        initial_logical: i64,
        initial_byte_pos: i64,
        min_byte_step: i64,
    ) -> OffsetIndex {
        OffsetIndex {
            primary_buf: [0; BUFFER_DEPTH],
            logical_buf: [0; BUFFER_DEPTH],
            byte_buf: [0; BUFFER_DEPTH],
            pos: 0,
            initial_primary,
            initial_logical,
            initial_byte_pos,
            min_byte_step,
            primary_index: ColumnEncoder::new(initial_primary),
            logical_index: ColumnEncoder::new(initial_logical),
            byte_index: ColumnEncoder::new(initial_byte_pos),
        }
    }

    /// Adds a new entry to the index.
    ///
    /// Returns `false` if the entry was dropped because its byte position is less
    /// than `min_byte_step` past the previously stored entry. The first entry is
    /// always stored.
    pub fn append(&mut self, primary_offset: i64, logical_offset: i64, byte_position: i64) -> bool {
        if let Some(last) = self.last_byte_position() {
            if byte_position.saturating_sub(last) < self.min_byte_step {
                log::trace!(
                    "dropping index entry {primary_offset}/{logical_offset}@{byte_position}, \
                     {} bytes after the previous one",
                    byte_position.saturating_sub(last)
                );
                return false;
            }
        }

        let ix = self.buffered_len();
        self.primary_buf[ix] = primary_offset;
        self.logical_buf[ix] = logical_offset;
        self.byte_buf[ix] = byte_position;
        self.pos += 1;
        if self.pos & INDEX_MASK == 0 {
            self.flush();
        }
        true
    }

    /// Finds the entry with the greatest value in `column` that is strictly less
    /// than `upper_bound`.
    ///
    /// Returns `None` if all entries are `>= upper_bound` or the index is empty.
    /// If all entries are smaller than `upper_bound` the last entry is returned.
    pub fn find_predecessor(
        &self,
        column: IndexColumn,
        upper_bound: i64,
    ) -> Result<Option<IndexEntry>> {
        match self.maybe_find(column, upper_bound)? {
            FindOutcome::NotFound => Ok(None),
            FindOutcome::Resolved(entry) => Ok(Some(entry)),
            FindOutcome::ResolvedAtPosition(ix) => self.entry_at(ix).map(Some),
        }
    }

    /// Finds the last entry whose primary offset is strictly lower than `upper_bound`.
    pub fn find_primary_offset(&self, upper_bound: i64) -> Result<Option<IndexEntry>> {
        self.find_predecessor(IndexColumn::Primary, upper_bound)
    }

    /// Finds the last entry whose logical offset is strictly lower than `upper_bound`.
    pub fn find_logical_offset(&self, upper_bound: i64) -> Result<Option<IndexEntry>> {
        self.find_predecessor(IndexColumn::Logical, upper_bound)
    }

    /// Builds a coarse index mapping logical offsets to byte positions.
    ///
    /// The step size is the resolution of the index: given a step of 16 MiB,
    /// the result holds entries that are at least 16 MiB apart in terms of byte
    /// position, starting from the byte position baseline.
    pub fn build_coarse_index(&self, step_size: u64) -> Result<CoarseIndex> {
        let step = i128::from(step_size);
        let mut coarse = CoarseIndex::new();
        let mut bucket_start = self.initial_byte_pos;
        self.for_each_entry(|entry| {
            let gap = i128::from(entry.byte_position) - i128::from(bucket_start);
            if gap >= step
                && coarse.push(entry.logical_offset, entry.byte_position)
            {
                bucket_start = entry.byte_position;
            }
        })?;
        log::debug!(
            "built coarse index with {} entries out of {} (step {} bytes)",
            coarse.len(),
            self.pos,
            step_size
        );
        Ok(coarse)
    }

    /// Decodes all entries in position order.
    pub fn entries(&self) -> Result<Vec<IndexEntry>> {
        let mut entries = Vec::with_capacity(self.pos as usize);
        self.for_each_entry(|entry| entries.push(entry))?;
        Ok(entries)
    }

    pub fn first_entry(&self) -> Result<Option<IndexEntry>> {
        if self.pos == 0 {
            return Ok(None);
        }
        self.entry_at(0).map(Some)
    }

    /// Returns the most recently stored entry.
    pub fn last_entry(&self) -> Result<Option<IndexEntry>> {
        if self.pos == 0 {
            return Ok(None);
        }
        self.entry_at(self.pos - 1).map(Some)
    }

    /// Number of stored entries.
    pub fn len(&self) -> u64 {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }

    /// Number of entries held in the compressed columns.
    pub fn compressed_len(&self) -> u64 {
        self.primary_index.value_count()
    }

    /// Number of entries waiting in the write buffer.
    pub fn buffered_len(&self) -> usize {
        (self.pos & INDEX_MASK) as usize
    }

    /// Total size of the compressed column data in bytes.
    pub fn compressed_size_bytes(&self) -> usize {
        self.primary_index.encoded_size()
            + self.logical_index.encoded_size()
            + self.byte_index.encoded_size()
    }

    pub fn initial_primary_offset(&self) -> i64 {
        self.initial_primary
    }

    pub fn initial_logical_offset(&self) -> i64 {
        self.initial_logical
    }

    pub fn initial_byte_position(&self) -> i64 {
        self.initial_byte_pos
    }

    pub fn min_byte_step(&self) -> i64 {
        self.min_byte_step
    }

    /// Returns the number of values stored in each of the primary, logical and
    /// byte position columns, compressed and buffered.
    pub fn column_lengths(&self) -> [u64; 3] {
        let buffered = self.buffered_len() as u64;
        [
            self.primary_index.value_count() + buffered,
            self.logical_index.value_count() + buffered,
            self.byte_index.value_count() + buffered,
        ]
    }
}

impl OffsetIndex {
    fn flush(&mut self) {
        self.primary_index.add_block(&self.primary_buf);
        self.logical_index.add_block(&self.logical_buf);
        self.byte_index.add_block(&self.byte_buf);
        self.primary_buf = [0; BUFFER_DEPTH];
        self.logical_buf = [0; BUFFER_DEPTH];
        self.byte_buf = [0; BUFFER_DEPTH];
        log::debug!(
            "offset index block flushed: {} entries, {} compressed bytes",
            self.compressed_len(),
            self.compressed_size_bytes()
        );
    }

    fn last_byte_position(&self) -> Option<i64> {
        match self.buffered_len() {
            0 => self.byte_index.last_value(),
            fill => Some(self.byte_buf[fill - 1]),
        }
    }

    fn buffered_entry(&self, ix: usize) -> IndexEntry {
        IndexEntry {
            primary_offset: self.primary_buf[ix],
            logical_offset: self.logical_buf[ix],
            byte_position: self.byte_buf[ix],
        }
    }

    /// Buffered entries always sort after the compressed ones, so if the buffer
    /// holds a qualifying entry the compressed columns are not touched.
    fn maybe_find(&self, column: IndexColumn, upper_bound: i64) -> Result<FindOutcome> {
        let fill = self.buffered_len();
        let buffer = match column {
            IndexColumn::Primary => &self.primary_buf,
            IndexColumn::Logical => &self.logical_buf,
        };
        if fill > 0 && buffer[0] < upper_bound {
            if let Some(ix) = buffer[..fill].iter().rposition(|&v| v < upper_bound) {
                return Ok(FindOutcome::Resolved(self.buffered_entry(ix)));
            }
        }

        let decoder = match column {
            IndexColumn::Primary => self.primary_index.decoder(),
            IndexColumn::Logical => self.logical_index.decoder(),
        };
        Ok(match Self::find_under(decoder, upper_bound)? {
            Some(ix) => FindOutcome::ResolvedAtPosition(ix),
            None => FindOutcome::NotFound,
        })
    }

    /// Returns the position of the last decoded value below `upper_bound`, or
    /// `None` if the first value is already `>= upper_bound`.
    fn find_under(decoder: ColumnDecoder<'_, Delta>, upper_bound: i64) -> Result<Option<u64>> {
        let mut candidate = None;
        let mut block_start = 0u64;
        for block in decoder {
            let block = block?;
            if block[0] >= upper_bound {
                break;
            }
            if let Some(ix) = block.iter().rposition(|&v| v < upper_bound) {
                candidate = Some(block_start + ix as u64);
            }
            if block[BLOCK_SIZE - 1] >= upper_bound {
                break;
            }
            block_start += BLOCK_SIZE as u64;
        }
        Ok(candidate)
    }

    fn entry_at(&self, ix: u64) -> Result<IndexEntry> {
        let compressed = self.compressed_len();
        if ix >= compressed {
            let buffered = (ix - compressed) as usize;
            if buffered >= self.buffered_len() {
                return Err(Error::invalid_arg("ix", "position is past the last entry"));
            }
            return Ok(self.buffered_entry(buffered));
        }
        match (
            self.primary_index.value_at(ix)?,
            self.logical_index.value_at(ix)?,
            self.byte_index.value_at(ix)?,
        ) {
            (Some(primary_offset), Some(logical_offset), Some(byte_position)) => Ok(IndexEntry {
                primary_offset,
                logical_offset,
                byte_position,
            }),
            _ => Err(Error::invalid_format("offset index columns")),
        }
    }

    /// Visits every entry in position order: decoded blocks first, then the
    /// write buffer.
    fn for_each_entry(&self, mut f: impl FnMut(IndexEntry)) -> Result<()> {
        let mut primary = self.primary_index.decoder();
        let mut logical = self.logical_index.decoder();
        let mut bytes = self.byte_index.decoder();
        let mut p = [0i64; BLOCK_SIZE];
        let mut l = [0i64; BLOCK_SIZE];
        let mut b = [0i64; BLOCK_SIZE];
        while primary.read_block(&mut p)? {
            verify_data!(logical_column, logical.read_block(&mut l)?);
            verify_data!(byte_position_column, bytes.read_block(&mut b)?);
            for i in 0..BLOCK_SIZE {
                f(IndexEntry {
                    primary_offset: p[i],
                    logical_offset: l[i],
                    byte_position: b[i],
                });
            }
        }
        for ix in 0..self.buffered_len() {
            f(self.buffered_entry(ix));
        }
        Ok(())
    }
}
