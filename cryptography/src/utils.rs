//! Utility functions for cryptographic primitives.

use avalanche_codec::{varint::UInt, EncodeSize, Write};

/// Converts bytes to a hexadecimal string.
pub fn hex(bytes: &[u8]) -> String {
    let mut hex = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

/// Concatenate a namespace and a message, prepended by a varint encoding of the namespace length.
///
/// This produces a unique byte sequence (i.e. no collisions) for each `(namespace, msg)` pair.
pub fn union_unique(namespace: &[u8], msg: &[u8]) -> Vec<u8> {
    let len = UInt(u32::try_from(namespace.len()).expect("namespace length exceeds u32"));
    let mut result = Vec::with_capacity(len.encode_size() + namespace.len() + msg.len());
    len.write(&mut result);
    result.extend_from_slice(namespace);
    result.extend_from_slice(msg);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex() {
        assert_eq!(hex(&[]), "");
        assert_eq!(hex(&[0x01]), "01");
        assert_eq!(hex(&[0xde, 0xad, 0xbe, 0xef]), "deadbeef");
    }

    #[test]
    fn test_union_unique() {
        let namespace = b"namespace";
        let msg = b"message";
        let union = union_unique(namespace, msg);
        assert_eq!(union[0] as usize, namespace.len());
        assert_eq!(&union[1..10], namespace);
        assert_eq!(&union[10..], msg);

        // Shifting bytes between namespace and message must change the output
        assert_ne!(union_unique(b"ab", b"c"), union_unique(b"a", b"bc"));
    }
}
