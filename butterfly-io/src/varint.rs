//! 7-bit continuation varints
//!
//! Each byte carries 7 bits of payload, least significant group first. The
//! high bit is set when more bytes follow. u32 values take at most 5 bytes,
//! u64 values at most 10.

use butterfly_common::{Error, Result};
use std::io::{Read, Write};

pub const MAX_BYTES_U32: usize = 5;
pub const MAX_BYTES_U64: usize = 10;

/// Append the varint encoding of `value` to `buf`, returning the byte count.
pub fn encode_u64(mut value: u64, buf: &mut Vec<u8>) -> usize {
    let start = buf.len();
    while value >= 0x80 {
        buf.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
    buf.len() - start
}

pub fn encode_u32(value: u32, buf: &mut Vec<u8>) -> usize {
    encode_u64(value as u64, buf)
}

pub fn write_u64<W: Write + ?Sized>(writer: &mut W, value: u64) -> Result<usize> {
    let mut buf = Vec::with_capacity(MAX_BYTES_U64);
    let n = encode_u64(value, &mut buf);
    writer.write_all(&buf)?;
    Ok(n)
}

pub fn write_u32<W: Write + ?Sized>(writer: &mut W, value: u32) -> Result<usize> {
    write_u64(writer, value as u64)
}

pub fn read_u64<R: Read + ?Sized>(reader: &mut R) -> Result<u64> {
    let mut value = 0u64;
    for i in 0..MAX_BYTES_U64 {
        let mut byte = [0u8; 1];
        reader.read_exact(&mut byte)?;
        let group = (byte[0] & 0x7F) as u64;
        if i == MAX_BYTES_U64 - 1 && group > 1 {
            return Err(Error::Format("varint overflows u64".to_string()));
        }
        value |= group << (7 * i);
        if byte[0] & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(Error::Format("varint longer than 10 bytes".to_string()))
}

pub fn read_u32<R: Read + ?Sized>(reader: &mut R) -> Result<u32> {
    let value = read_u64(reader)?;
    u32::try_from(value).map_err(|_| Error::Format(format!("varint {value} overflows u32")))
}
