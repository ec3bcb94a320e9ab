//! Binary encoding primitives for butterfly network files
//!
//! All multi-byte fixed width values are little-endian. Dynamic integers use a
//! 7-bit continuation varint, strings are varint length-prefixed UTF-8 and
//! GUIDs are written as their 16 raw bytes.

pub mod codec;
pub mod crc;
pub mod varint;

pub use codec::{ReadExt, WriteExt};
pub use crc::{ChecksumReader, ChecksumWriter};
