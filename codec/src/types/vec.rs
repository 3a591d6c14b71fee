//! Codec implementation for `Vec<T>`.
//!
//! The length is written as a varint and must fall within the [RangeCfg] supplied on read, so a
//! peer can never make us allocate more than we agreed to accept.

use crate::{varint::UInt, EncodeSize, Error, RangeCfg, Read, ReadExt, Write};
use bytes::{Buf, BufMut};

impl<T: Write> Write for Vec<T> {
    #[inline]
    fn write(&self, buf: &mut impl BufMut) {
        let len = u32::try_from(self.len()).expect("Vec length exceeds u32");
        UInt(len).write(buf);
        for item in self {
            item.write(buf);
        }
    }
}

impl<T: EncodeSize> EncodeSize for Vec<T> {
    #[inline]
    fn encode_size(&self) -> usize {
        let len = u32::try_from(self.len()).expect("Vec length exceeds u32");
        UInt(len).encode_size() + self.iter().map(EncodeSize::encode_size).sum::<usize>()
    }
}

impl<T: Read> Read for Vec<T> {
    type Cfg = (RangeCfg, T::Cfg);

    #[inline]
    fn read_cfg(buf: &mut impl Buf, (range, cfg): &Self::Cfg) -> Result<Self, Error> {
        let len: u32 = UInt::read(buf)?.into();
        let len = usize::try_from(len).map_err(|_| Error::InvalidUsize)?;
        if !range.contains(&len) {
            return Err(Error::InvalidLength(len));
        }
        let mut vec = Vec::with_capacity(len);
        for _ in 0..len {
            vec.push(T::read_cfg(buf, cfg)?);
        }
        Ok(vec)
    }
}

/// Extension trait for reading a `Vec` of items that need no configuration.
pub trait ReadRangeExt<T: Read<Cfg = ()>>: Read<Cfg = (RangeCfg, ())> {
    /// Reads a `Vec` whose length must fall within `range`.
    fn read_range(buf: &mut impl Buf, range: impl Into<RangeCfg>) -> Result<Self, Error> {
        Self::read_cfg(buf, &(range.into(), ()))
    }
}

impl<T: Read<Cfg = ()>> ReadRangeExt<T> for Vec<T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Decode, Encode};

    #[test]
    fn test_vec() {
        let vec_values = [vec![], vec![1u8], vec![1u8, 2u8, 3u8]];
        for value in vec_values {
            let encoded = value.encode();
            assert_eq!(encoded.len(), value.len() + 1);

            // Valid decoding
            let len = value.len();
            let decoded = Vec::<u8>::decode_cfg(encoded, &((len..=len).into(), ())).unwrap();
            assert_eq!(value, decoded);

            // Failure for too long
            assert!(matches!(
                Vec::<u8>::decode_cfg(value.encode(), &((0..len).into(), ())),
                Err(Error::InvalidLength(_))
            ));

            // Failure for too short
            assert!(matches!(
                Vec::<u8>::decode_cfg(value.encode(), &((len + 1..).into(), ())),
                Err(Error::InvalidLength(_))
            ));
        }
    }

    #[test]
    fn test_read_range() {
        let value = vec![10u32, 20, 30];
        let mut encoded = value.encode();
        let decoded = Vec::<u32>::read_range(&mut encoded, ..=3usize).unwrap();
        assert_eq!(decoded, value);
        assert!(encoded.is_empty());
    }
}
