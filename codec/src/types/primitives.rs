//! Codec implementations for Rust primitive types.
//!
//! All fixed-size integers are written big-endian to avoid host-endian ambiguity.

use crate::{Error, FixedSize, Read, ReadExt, Write};
use bytes::{Buf, BufMut};

/// Fails with [Error::EndOfBuffer] unless `buf` holds at least `len` bytes.
#[inline]
fn at_least(buf: &impl Buf, len: usize) -> Result<(), Error> {
    if buf.remaining() < len {
        return Err(Error::EndOfBuffer);
    }
    Ok(())
}

macro_rules! impl_numeric {
    ($type:ty, $read_method:ident, $write_method:ident) => {
        impl Write for $type {
            #[inline]
            fn write(&self, buf: &mut impl BufMut) {
                buf.$write_method(*self);
            }
        }

        impl Read for $type {
            type Cfg = ();

            #[inline]
            fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, Error> {
                at_least(buf, std::mem::size_of::<$type>())?;
                Ok(buf.$read_method())
            }
        }

        impl FixedSize for $type {
            const SIZE: usize = std::mem::size_of::<$type>();
        }
    };
}

impl_numeric!(u8, get_u8, put_u8);
impl_numeric!(u16, get_u16, put_u16);
impl_numeric!(u32, get_u32, put_u32);
impl_numeric!(u64, get_u64, put_u64);
impl_numeric!(i32, get_i32, put_i32);
impl_numeric!(i64, get_i64, put_i64);

impl Write for bool {
    #[inline]
    fn write(&self, buf: &mut impl BufMut) {
        buf.put_u8(u8::from(*self));
    }
}

impl Read for bool {
    type Cfg = ();

    #[inline]
    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, Error> {
        match u8::read(buf)? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(Error::InvalidBool),
        }
    }
}

impl FixedSize for bool {
    const SIZE: usize = 1;
}

impl<const N: usize> Write for [u8; N] {
    #[inline]
    fn write(&self, buf: &mut impl BufMut) {
        buf.put_slice(self);
    }
}

impl<const N: usize> Read for [u8; N] {
    type Cfg = ();

    #[inline]
    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, Error> {
        at_least(buf, N)?;
        let mut dst = [0; N];
        buf.copy_to_slice(&mut dst);
        Ok(dst)
    }
}

impl<const N: usize> FixedSize for [u8; N] {
    const SIZE: usize = N;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DecodeExt, Encode};
    use bytes::Bytes;

    #[test]
    fn test_big_endian() {
        assert_eq!((-1i32).encode().as_ref(), &[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(2u32.encode().as_ref(), &[0, 0, 0, 2]);
        assert_eq!(i32::decode(Bytes::from_static(&[0xFF; 4])).unwrap(), -1);
    }

    #[test]
    fn test_bool() {
        assert!(bool::decode(Bytes::from_static(&[1])).unwrap());
        assert!(!bool::decode(Bytes::from_static(&[0])).unwrap());
        assert!(matches!(
            bool::decode(Bytes::from_static(&[2])),
            Err(Error::InvalidBool)
        ));
    }

    #[test]
    fn test_array() {
        let value = [7u8; 32];
        let encoded = value.encode();
        assert_eq!(encoded.len(), 32);
        assert_eq!(<[u8; 32]>::decode(encoded).unwrap(), value);
        assert!(matches!(
            <[u8; 32]>::decode(Bytes::from_static(&[0; 31])),
            Err(Error::EndOfBuffer)
        ));
    }
}
