//! Identifiers and votes exchanged over the Avalanche protocol.

use avalanche_codec::{Error as CodecError, FixedSize, Read, ReadExt, Write};
use avalanche_cryptography::sha256;
use bytes::{Buf, BufMut};
use std::fmt::{Display, Formatter};

/// 256-bit identifier of a pollable item (a block hash).
pub type Hash = sha256::Digest;

/// A peer's opinion on a polled item.
///
/// On the wire the status is a signed 32-bit integer: `0` accepted, `1` rejected, `-1` unknown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VoteStatus {
    /// The item is part of the peer's best chain.
    Accepted,
    /// The item is known to the peer but not part of its best chain.
    Rejected,
    /// The peer has never seen the item.
    Unknown,
}

impl VoteStatus {
    const ACCEPTED: i32 = 0;
    const REJECTED: i32 = 1;
    const UNKNOWN: i32 = -1;

    /// Returns the wire code of the status.
    pub fn code(self) -> i32 {
        match self {
            Self::Accepted => Self::ACCEPTED,
            Self::Rejected => Self::REJECTED,
            Self::Unknown => Self::UNKNOWN,
        }
    }

    /// Parses a wire code, returning `None` for codes outside the protocol.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            Self::ACCEPTED => Some(Self::Accepted),
            Self::REJECTED => Some(Self::Rejected),
            Self::UNKNOWN => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl Display for VoteStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accepted => f.write_str("accepted"),
            Self::Rejected => f.write_str("rejected"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

impl Write for VoteStatus {
    fn write(&self, buf: &mut impl BufMut) {
        self.code().write(buf);
    }
}

impl Read for VoteStatus {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        Self::from_code(i32::read(buf)?)
            .ok_or(CodecError::Invalid("VoteStatus", "unknown status code"))
    }
}

impl FixedSize for VoteStatus {
    const SIZE: usize = i32::SIZE;
}

/// A single (status, identifier) vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Vote {
    status: VoteStatus,
    id: Hash,
}

impl Vote {
    pub fn new(status: VoteStatus, id: Hash) -> Self {
        Self { status, id }
    }

    pub fn status(&self) -> VoteStatus {
        self.status
    }

    pub fn id(&self) -> Hash {
        self.id
    }
}

impl Display for Vote {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Vote(status={}, id={})", self.status, self.id)
    }
}

impl Write for Vote {
    fn write(&self, buf: &mut impl BufMut) {
        self.status.write(buf);
        self.id.write(buf);
    }
}

impl Read for Vote {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let status = VoteStatus::read(buf)?;
        let id = Hash::read(buf)?;
        Ok(Self { status, id })
    }
}

impl FixedSize for Vote {
    const SIZE: usize = VoteStatus::SIZE + Hash::SIZE;
}

#[cfg(test)]
mod tests {
    use super::*;
    use avalanche_codec::{DecodeExt, Encode};
    use avalanche_cryptography::hash;
    use bytes::Bytes;
    use test_case::test_case;

    #[test_case(VoteStatus::Accepted, 0; "accepted")]
    #[test_case(VoteStatus::Rejected, 1; "rejected")]
    #[test_case(VoteStatus::Unknown, -1; "unknown")]
    fn test_status_codes(status: VoteStatus, code: i32) {
        assert_eq!(status.code(), code);
        assert_eq!(VoteStatus::from_code(code), Some(status));
        assert_eq!(status.encode().to_vec(), code.to_be_bytes().to_vec());
    }

    #[test]
    fn test_invalid_status() {
        assert_eq!(VoteStatus::from_code(2), None);
        assert!(matches!(
            VoteStatus::decode(Bytes::from_static(&[0, 0, 0, 2])),
            Err(CodecError::Invalid("VoteStatus", _))
        ));
    }

    #[test]
    fn test_vote_equality() {
        let id = hash(b"block");
        assert_eq!(
            Vote::new(VoteStatus::Accepted, id),
            Vote::new(VoteStatus::Accepted, id)
        );
        assert_ne!(
            Vote::new(VoteStatus::Accepted, id),
            Vote::new(VoteStatus::Rejected, id)
        );
        assert_ne!(
            Vote::new(VoteStatus::Accepted, id),
            Vote::new(VoteStatus::Accepted, hash(b"other"))
        );
    }

    #[test]
    fn test_vote_layout() {
        let vote = Vote::new(VoteStatus::Unknown, hash(b"block"));
        let encoded = vote.encode();
        assert_eq!(encoded.len(), Vote::SIZE);
        assert_eq!(&encoded[..4], &[0xFF; 4]);
        assert_eq!(Vote::decode(encoded).unwrap(), vote);
    }
}
