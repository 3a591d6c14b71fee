//! Serialize Avalanche poll and vote messages.
//!
//! # Overview
//!
//! A small binary serialization library used to:
//! - Serialize protocol frames into a deterministic binary format
//! - Deserialize untrusted frames into structured data, bounding every allocation
//!
//! # Supported Types
//!
//! Natively supports:
//! - Primitives: `u8`, `u16`, `u32`, `u64`, `i32`, `i64`, `bool`
//! - Fixed-size byte arrays `[u8; N]`
//! - `Vec<T>`, length-prefixed with a varint and bounded by a [RangeCfg] on read
//!
//! User-defined types are serialized by implementing [Write], [Read], and either
//! [EncodeSize] (variable size) or [FixedSize] (constant size).
//!
//! # Example
//!
//! ```
//! use avalanche_codec::{Decode, Encode, EncodeSize, Error, RangeCfg, Read, ReadExt, Write};
//! use bytes::{Buf, BufMut};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Batch {
//!     round: u64,
//!     ids: Vec<[u8; 4]>,
//! }
//!
//! impl Write for Batch {
//!     fn write(&self, buf: &mut impl BufMut) {
//!         self.round.write(buf);
//!         self.ids.write(buf);
//!     }
//! }
//!
//! impl EncodeSize for Batch {
//!     fn encode_size(&self) -> usize {
//!         self.round.encode_size() + self.ids.encode_size()
//!     }
//! }
//!
//! impl Read for Batch {
//!     type Cfg = RangeCfg;
//!
//!     fn read_cfg(buf: &mut impl Buf, range: &RangeCfg) -> Result<Self, Error> {
//!         let round = u64::read(buf)?;
//!         let ids = Vec::<[u8; 4]>::read_cfg(buf, &(range.clone(), ()))?;
//!         Ok(Self { round, ids })
//!     }
//! }
//!
//! let batch = Batch { round: 7, ids: vec![[1, 2, 3, 4]] };
//! let encoded = batch.encode();
//! let decoded = Batch::decode_cfg(encoded, &(..=16usize).into()).unwrap();
//! assert_eq!(batch, decoded);
//! ```

mod codec;
pub use codec::{Decode, DecodeExt, Encode, EncodeSize, FixedSize, Read, ReadExt, Write};
mod config;
pub use config::RangeCfg;
mod error;
pub use error::Error;
mod types;
pub use types::vec::ReadRangeExt;
pub mod varint;
