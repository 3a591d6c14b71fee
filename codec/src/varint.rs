//! Variable-length integer encoding for list lengths.
//!
//! Each byte carries 7 bits of the value (least significant group first) and a continuation
//! bit signalling that more bytes follow. Only canonical (shortest) encodings are accepted.

use crate::{EncodeSize, Error, Read, Write};
use bytes::{Buf, BufMut};

const DATA_BITS_PER_BYTE: usize = 7;
const DATA_BITS_MASK: u8 = 0x7F;
const CONTINUATION_BIT_MASK: u8 = 0x80;

/// Maximum number of bytes a `u32` occupies once encoded.
const MAX_BYTES: usize = (u32::BITS as usize).div_ceil(DATA_BITS_PER_BYTE);

/// Bits of the final byte that may be set for a `u32`.
const LAST_BYTE_MASK: u8 = (1 << (u32::BITS as usize - (MAX_BYTES - 1) * DATA_BITS_PER_BYTE)) - 1;

/// A varint-encoded `u32`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UInt(pub u32);

impl From<UInt> for u32 {
    fn from(value: UInt) -> Self {
        value.0
    }
}

impl Write for UInt {
    fn write(&self, buf: &mut impl BufMut) {
        let mut value = self.0;
        while value >= u32::from(CONTINUATION_BIT_MASK) {
            buf.put_u8((value as u8 & DATA_BITS_MASK) | CONTINUATION_BIT_MASK);
            value >>= DATA_BITS_PER_BYTE;
        }
        buf.put_u8(value as u8);
    }
}

impl EncodeSize for UInt {
    fn encode_size(&self) -> usize {
        let bits = (u32::BITS - self.0.leading_zeros()).max(1) as usize;
        bits.div_ceil(DATA_BITS_PER_BYTE)
    }
}

impl Read for UInt {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, Error> {
        let mut result = 0u32;
        for index in 0..MAX_BYTES {
            if !buf.has_remaining() {
                return Err(Error::EndOfBuffer);
            }
            let byte = buf.get_u8();

            // Reject trailing zero groups and overflow past 32 bits
            if index > 0 && byte == 0 {
                return Err(Error::InvalidVarint(u32::BITS as usize));
            }
            if index == MAX_BYTES - 1 && byte > LAST_BYTE_MASK {
                return Err(Error::InvalidVarint(u32::BITS as usize));
            }

            result |= u32::from(byte & DATA_BITS_MASK) << (index * DATA_BITS_PER_BYTE);
            if byte & CONTINUATION_BIT_MASK == 0 {
                return Ok(Self(result));
            }
        }
        Err(Error::InvalidVarint(u32::BITS as usize))
    }
}
