//! Persisted layout of the [`OffsetIndex`].
//!
//! All integers are little-endian:
//!
//! ```text
//! u32  format version
//! i64  initial primary offset
//! i64  initial logical offset
//! i64  initial byte position
//! i64  minimal byte step
//! u64  number of entries
//! 3 x (u64 payload length, column payload)   primary, logical, byte position
//! u32  number of buffered entries
//! n x (i64 primary, i64 logical, i64 byte position)
//! ```

use std::io::{self, Read, Write};

use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use segidx_common::{Result, error::Error, verify_index};
use segidx_encodings::{ColumnEncoder, DeltaStep};

use crate::offset_index::{BUFFER_DEPTH, OffsetIndex};

pub const OFFSET_INDEX_FORMAT_VERSION: u32 = 1;

const FIXED_HEADER_SIZE: usize = 4 + 8 * 4 + 8;

impl OffsetIndex {
    /// Serializes the index to a writer and returns the number of bytes written.
    pub fn write_to<W>(&self, w: &mut W) -> io::Result<usize>
    where
        W: Write + ?Sized,
    {
        w.write_u32::<LE>(OFFSET_INDEX_FORMAT_VERSION)?;
        w.write_i64::<LE>(self.initial_primary)?;
        w.write_i64::<LE>(self.initial_logical)?;
        w.write_i64::<LE>(self.initial_byte_pos)?;
        w.write_i64::<LE>(self.min_byte_step)?;
        w.write_u64::<LE>(self.pos)?;

        write_column(w, &self.primary_index)?;
        write_column(w, &self.logical_index)?;
        write_column(w, &self.byte_index)?;

        let fill = self.buffered_len();
        w.write_u32::<LE>(fill as u32)?;
        for ix in 0..fill {
            w.write_i64::<LE>(self.primary_buf[ix])?;
            w.write_i64::<LE>(self.logical_buf[ix])?;
            w.write_i64::<LE>(self.byte_buf[ix])?;
        }
        Ok(self.serialized_size())
    }

    /// Serializes the index to a byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(self.serialized_size());
        self.write_to(&mut v).expect("Writing to a vec should not fail");
        v
    }

    pub fn serialized_size(&self) -> usize {
        FIXED_HEADER_SIZE
            + 3 * 8
            + self.primary_index.serialized_size()
            + self.logical_index.serialized_size()
            + self.byte_index.serialized_size()
            + 4
            + self.buffered_len() * 3 * 8
    }

    /// Restores an index written by [`OffsetIndex::write_to`].
    ///
    /// # Errors
    ///
    /// Fails with `CorruptIndex` when the version is unknown, the data is
    /// truncated, a column payload cannot be decoded, or the columns disagree
    /// with each other or with the header. The caller is expected to discard
    /// the persisted index and rebuild it from the segment.
    pub fn read_from<R>(r: &mut R) -> Result<OffsetIndex>
    where
        R: Read + ?Sized,
    {
        Self::parse(r).inspect_err(|e| log::warn!("rejecting persisted offset index: {e}"))
    }

    /// Restores an index from a byte slice; the slice must hold exactly one index.
    pub fn from_bytes(data: &[u8]) -> Result<OffsetIndex> {
        let mut cursor = data;
        let index = Self::read_from(&mut cursor)?;
        if !cursor.is_empty() {
            log::warn!(
                "rejecting persisted offset index: {} trailing bytes",
                cursor.len()
            );
            return Err(Error::corrupt_index(format!(
                "{} unexpected trailing bytes",
                cursor.len()
            )));
        }
        Ok(index)
    }

    fn parse<R>(r: &mut R) -> Result<OffsetIndex>
    where
        R: Read + ?Sized,
    {
        let version = r.read_u32::<LE>().map_err(truncated)?;
        verify_index!(
            version == OFFSET_INDEX_FORMAT_VERSION,
            "unsupported format version {version}"
        );
        let initial_primary = r.read_i64::<LE>().map_err(truncated)?;
        let initial_logical = r.read_i64::<LE>().map_err(truncated)?;
        let initial_byte_pos = r.read_i64::<LE>().map_err(truncated)?;
        let min_byte_step = r.read_i64::<LE>().map_err(truncated)?;
        let pos = r.read_u64::<LE>().map_err(truncated)?;

        let primary_index = read_column(r, "primary offset column")?;
        let logical_index = read_column(r, "logical offset column")?;
        let byte_index = read_column(r, "byte position column")?;

        let fill = r.read_u32::<LE>().map_err(truncated)? as usize;
        verify_index!(
            fill < BUFFER_DEPTH,
            "write buffer holds {fill} entries, capacity is {BUFFER_DEPTH}"
        );
        let mut index = OffsetIndex::new(
            initial_primary,
            initial_logical,
            initial_byte_pos,
            min_byte_step,
        );
        for ix in 0..fill {
            index.primary_buf[ix] = r.read_i64::<LE>().map_err(truncated)?;
            index.logical_buf[ix] = r.read_i64::<LE>().map_err(truncated)?;
            index.byte_buf[ix] = r.read_i64::<LE>().map_err(truncated)?;
        }

        let counts = [
            primary_index.value_count(),
            logical_index.value_count(),
            byte_index.value_count(),
        ];
        verify_index!(
            counts[0] == counts[1] && counts[1] == counts[2],
            "column element counts disagree: {counts:?}"
        );
        verify_index!(
            pos == counts[0] + fill as u64,
            "entry count {pos} does not match {} compressed and {fill} buffered entries",
            counts[0]
        );
        verify_index!(
            primary_index.initial_value() == initial_primary
                && logical_index.initial_value() == initial_logical
                && byte_index.initial_value() == initial_byte_pos,
            "column initial values disagree with the index header"
        );

        index.pos = pos;
        index.primary_index = primary_index;
        index.logical_index = logical_index;
        index.byte_index = byte_index;
        Ok(index)
    }
}

fn write_column<W, D>(w: &mut W, column: &ColumnEncoder<D>) -> io::Result<()>
where
    W: Write + ?Sized,
    D: DeltaStep,
{
    w.write_u64::<LE>(column.serialized_size() as u64)?;
    column.write_to(w)?;
    Ok(())
}

fn read_column<R, D>(r: &mut R, name: &str) -> Result<ColumnEncoder<D>>
where
    R: Read + ?Sized,
    D: DeltaStep,
{
    let len = r.read_u64::<LE>().map_err(truncated)?;
    let mut payload = Vec::new();
    Read::take(&mut *r, len)
        .read_to_end(&mut payload)
        .map_err(truncated)?;
    if payload.len() as u64 != len {
        return Err(Error::corrupt_index(format!(
            "{name} payload is truncated: {} of {len} bytes",
            payload.len()
        )));
    }
    ColumnEncoder::read_from(&payload).map_err(|e| Error::corrupt_index_from(name, e))
}

fn truncated(e: io::Error) -> Error {
    Error::corrupt_index_from("truncated input", e.into())
}
