//! LSB-first bit packing of unsigned values at a fixed width.

use segidx_common::{Result, error::Error};

/// Returns the number of bits required to store `max_value`.
#[inline]
pub fn packed_width(max_value: u64) -> u8 {
    (u64::BITS - max_value.leading_zeros()) as u8
}

/// Size in bytes of `count` values packed at `width` bits each.
#[inline]
pub fn packed_size(count: usize, width: u8) -> usize {
    (count * width as usize).div_ceil(8)
}

/// Appends `values` packed at `width` bits to `target`.
///
/// Only the `width` low bits of every value are stored. A zero width writes nothing.
pub fn pack(values: &[u64], width: u8, target: &mut Vec<u8>) {
    assert!(width <= 64, "pack: unexpected width {width}");
    if width == 0 {
        return;
    }
    let start = target.len();
    target.resize(start + packed_size(values.len(), width), 0);
    let out = &mut target[start..];

    let width = width as usize;
    let mut bit_pos = 0usize;
    for &value in values {
        let mut value = value;
        let mut remaining = width;
        while remaining > 0 {
            let shift = bit_pos % 8;
            let take = (8 - shift).min(remaining);
            out[bit_pos / 8] |= ((value & ((1u64 << take) - 1)) as u8) << shift;
            value >>= take;
            remaining -= take;
            bit_pos += take;
        }
    }
}

/// Fills `target` with values packed at `width` bits and returns the number of
/// bytes consumed from `data`.
pub fn unpack(data: &[u8], width: u8, target: &mut [u64]) -> Result<usize> {
    if width > 64 {
        return Err(Error::invalid_format("bit-packed width"));
    }
    let needed = packed_size(target.len(), width);
    if data.len() < needed {
        return Err(Error::invalid_format("bit-packed buffer size is too small"));
    }

    let width = width as usize;
    let mut bit_pos = 0usize;
    for slot in target.iter_mut() {
        let mut value = 0u64;
        let mut filled = 0usize;
        while filled < width {
            let shift = bit_pos % 8;
            let take = (8 - shift).min(width - filled);
            let bits = ((data[bit_pos / 8] >> shift) as u64) & ((1u64 << take) - 1);
            value |= bits << filled;
            filled += take;
            bit_pos += take;
        }
        *slot = value;
    }
    Ok(needed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_width() {
        assert_eq!(packed_width(0), 0);
        assert_eq!(packed_width(1), 1);
        assert_eq!(packed_width(255), 8);
        assert_eq!(packed_width(256), 9);
        assert_eq!(packed_width(u64::MAX), 64);
    }

    #[test]
    fn test_pack_unpack_all_widths() {
        let mut rng = fastrand::Rng::with_seed(7);
        for width in 0..=64u8 {
            let mask = if width == 64 {
                u64::MAX
            } else {
                (1u64 << width) - 1
            };
            let values: Vec<u64> = (0..37).map(|_| rng.u64(..) & mask).collect();
            let mut packed = vec![0xAA];
            pack(&values, width, &mut packed);
            assert_eq!(packed.len(), 1 + packed_size(values.len(), width));

            let mut decoded = vec![0u64; values.len()];
            let consumed = unpack(&packed[1..], width, &mut decoded).unwrap();
            assert_eq!(consumed, packed.len() - 1);
            assert_eq!(decoded, values, "width {width}");
        }
    }

    #[test]
    fn test_unpack_truncated() {
        let mut packed = Vec::new();
        pack(&[1, 2, 3, 4], 7, &mut packed);
        let mut decoded = [0u64; 4];
        assert!(unpack(&packed[..packed.len() - 1], 7, &mut decoded).is_err());
        assert!(unpack(&packed, 65, &mut decoded).is_err());
    }
}
