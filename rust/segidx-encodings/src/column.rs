use std::{io, marker::PhantomData};

use byteorder::{ByteOrder, LE, ReadBytesExt, WriteBytesExt};
use segidx_common::{Result, error::Error, try_or_ret_some_err, verify_data};

use crate::{
    BLOCK_SIZE,
    bitpacking::{pack, packed_width, unpack},
    delta::{DeltaKind, DeltaState, DeltaStep},
};

/// Size of the per-block header: reference (`i64`) and bit width (`u8`).
const BLOCK_HEADER_SIZE: usize = 9;

/// Fixed part of a serialized column: kind, initial value, running state and
/// value count.
const PAYLOAD_HEADER_SIZE: usize = 1 + 8 + 8 + 8 + 8;

/// Append-only encoder of a monotonic `i64` column.
///
/// Values are accepted a full block at a time. Each block is stored as:
///  - reference: the minimal residual of the block (`i64`, LE),
///  - width: bit width of the largest `residual - reference` (`u8`),
///  - `BLOCK_SIZE` packed differences, `2 * width` bytes in total.
#[derive(Debug, Clone)]
pub struct ColumnEncoder<D> {
    initial: i64,
    state: DeltaState,
    value_count: u64,
    data: Vec<u8>,
    _step: PhantomData<D>,
}

impl<D: DeltaStep> ColumnEncoder<D> {
    pub fn new(initial: i64) -> ColumnEncoder<D> {
        ColumnEncoder {
            initial,
            state: DeltaState::new(initial),
            value_count: 0,
            data: Vec::new(),
            _step: PhantomData,
        }
    }

    /// Value the delta chain starts from.
    pub fn initial_value(&self) -> i64 {
        self.initial
    }

    /// Last value added to the column, if any.
    pub fn last_value(&self) -> Option<i64> {
        (self.value_count > 0).then_some(self.state.prev)
    }

    pub fn value_count(&self) -> u64 {
        self.value_count
    }

    pub fn block_count(&self) -> u64 {
        self.value_count / BLOCK_SIZE as u64
    }

    /// Size of the encoded blocks in bytes.
    pub fn encoded_size(&self) -> usize {
        self.data.len()
    }

    pub fn add_block(&mut self, values: &[i64; BLOCK_SIZE]) {
        let mut residuals = [0i64; BLOCK_SIZE];
        for (residual, &value) in residuals.iter_mut().zip(values) {
            *residual = D::encode(&mut self.state, value);
        }
        let reference = residuals.iter().copied().fold(i64::MAX, i64::min);
        let offsets = residuals.map(|r| r.wrapping_sub(reference) as u64);
        let width = packed_width(offsets.iter().fold(0, |acc, &o| acc | o));

        self.data.extend_from_slice(&reference.to_le_bytes());
        self.data.push(width);
        pack(&offsets, width, &mut self.data);
        self.value_count += BLOCK_SIZE as u64;
        log::trace!(
            "{:?} column block #{} packed at {} bits",
            D::KIND,
            self.block_count(),
            width
        );
    }

    pub fn decoder(&self) -> ColumnDecoder<'_, D> {
        ColumnDecoder::new(self.initial, self.block_count(), &self.data)
    }

    /// Returns the value at `ix`, decoding the column from the start.
    pub fn value_at(&self, ix: u64) -> Result<Option<i64>> {
        if ix >= self.value_count {
            return Ok(None);
        }
        let target_block = ix / BLOCK_SIZE as u64;
        let mut decoder = self.decoder();
        let mut block = [0i64; BLOCK_SIZE];
        for _ in 0..=target_block {
            verify_data!(column_block, decoder.read_block(&mut block)?);
        }
        Ok(Some(block[(ix % BLOCK_SIZE as u64) as usize]))
    }

    /// Serializes the column and returns the number of bytes written.
    pub fn write_to<W>(&self, w: &mut W) -> io::Result<usize>
    where
        W: io::Write + ?Sized,
    {
        w.write_u8(D::KIND as u8)?;
        w.write_i64::<LE>(self.initial)?;
        w.write_i64::<LE>(self.state.prev)?;
        w.write_i64::<LE>(self.state.prev_delta)?;
        w.write_u64::<LE>(self.value_count)?;
        w.write_all(&self.data)?;
        Ok(self.serialized_size())
    }

    pub fn serialized_size(&self) -> usize {
        PAYLOAD_HEADER_SIZE + self.data.len()
    }

    /// Restores a column written by [`ColumnEncoder::write_to`].
    ///
    /// The whole payload is decoded to make sure every block is well-formed and
    /// that the stored running state matches the decoded values.
    pub fn read_from(payload: &[u8]) -> Result<ColumnEncoder<D>> {
        verify_data!(column_payload, payload.len() >= PAYLOAD_HEADER_SIZE);
        let mut header = &payload[..PAYLOAD_HEADER_SIZE];
        let kind = DeltaKind::try_from(header.read_u8()?)?;
        verify_data!(column_kind, kind == D::KIND);
        let initial = header.read_i64::<LE>()?;
        let state = DeltaState {
            prev: header.read_i64::<LE>()?,
            prev_delta: header.read_i64::<LE>()?,
        };
        let value_count = header.read_u64::<LE>()?;
        verify_data!(value_count, value_count % BLOCK_SIZE as u64 == 0);

        let data = &payload[PAYLOAD_HEADER_SIZE..];
        let mut decoder =
            ColumnDecoder::<D>::new(initial, value_count / BLOCK_SIZE as u64, data);
        let mut block = [0i64; BLOCK_SIZE];
        while decoder.read_block(&mut block)? {}
        verify_data!(column_blocks, decoder.consumed() == data.len());
        if value_count == 0 {
            verify_data!(column_state, state == DeltaState::new(initial));
        } else {
            verify_data!(column_state, decoder.state() == state);
        }

        Ok(ColumnEncoder {
            initial,
            state,
            value_count,
            data: data.to_vec(),
            _step: PhantomData,
        })
    }
}

/// Sequential block reader over the encoded column data.
pub struct ColumnDecoder<'a, D> {
    data: &'a [u8],
    cursor: usize,
    state: DeltaState,
    remaining_blocks: u64,
    _step: PhantomData<D>,
}

impl<'a, D: DeltaStep> ColumnDecoder<'a, D> {
    pub fn new(initial: i64, block_count: u64, data: &'a [u8]) -> ColumnDecoder<'a, D> {
        ColumnDecoder {
            data,
            cursor: 0,
            state: DeltaState::new(initial),
            remaining_blocks: block_count,
            _step: PhantomData,
        }
    }

    /// Decodes the next block into `target`.
    ///
    /// Returns `Ok(false)` once all blocks have been read.
    pub fn read_block(&mut self, target: &mut [i64; BLOCK_SIZE]) -> Result<bool> {
        if self.remaining_blocks == 0 {
            return Ok(false);
        }
        let header_end = self.cursor + BLOCK_HEADER_SIZE;
        if header_end > self.data.len() {
            return Err(Error::invalid_format("column block header is truncated"));
        }
        let reference = LE::read_i64(&self.data[self.cursor..]);
        let width = self.data[self.cursor + 8];

        let mut offsets = [0u64; BLOCK_SIZE];
        let used = unpack(&self.data[header_end..], width, &mut offsets)?;
        self.cursor = header_end + used;

        for (value, offset) in target.iter_mut().zip(offsets) {
            *value = D::decode(&mut self.state, reference.wrapping_add(offset as i64));
        }
        self.remaining_blocks -= 1;
        Ok(true)
    }

    /// Number of encoded bytes read so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }

    pub fn state(&self) -> DeltaState {
        self.state
    }
}

impl<D: DeltaStep> Iterator for ColumnDecoder<'_, D> {
    type Item = Result<[i64; BLOCK_SIZE]>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut block = [0i64; BLOCK_SIZE];
        if try_or_ret_some_err!(self.read_block(&mut block)) {
            Some(Ok(block))
        } else {
            None
        }
    }
}
