//! CRC-64 checksummed streams
//!
//! Network files end with the CRC-64 of everything before it. The writer and
//! reader here hash the bytes as they pass through, so the footer can be
//! written or checked without buffering the whole file.

use crc::{Crc, Digest, CRC_64_GO_ISO};
use std::io::{self, Read, Write};

/// CRC-64-ISO, the checksum of every butterfly network file.
pub const CRC64: Crc<u64> = Crc::<u64>::new(&CRC_64_GO_ISO);

/// Writer that hashes every byte the inner writer accepted.
pub struct ChecksumWriter<W: Write> {
    inner: W,
    digest: Digest<'static, u64>,
}

impl<W: Write> ChecksumWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            digest: CRC64.digest(),
        }
    }

    /// Checksum of the bytes written so far and the inner writer, ready for
    /// the footer.
    pub fn finish(self) -> (u64, W) {
        (self.digest.finalize(), self.inner)
    }
}

impl<W: Write> Write for ChecksumWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.digest.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Reader that hashes every byte handed out.
pub struct ChecksumReader<R: Read> {
    inner: R,
    digest: Digest<'static, u64>,
}

impl<R: Read> ChecksumReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            digest: CRC64.digest(),
        }
    }

    /// Checksum of the bytes read so far and the inner reader, positioned on
    /// the footer.
    pub fn finish(self) -> (u64, R) {
        (self.digest.finalize(), self.inner)
    }
}

impl<R: Read> Read for ChecksumReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.digest.update(&buf[..n]);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{ReadExt, WriteExt};

    /// Accepts at most three bytes per call.
    struct Trickle(Vec<u8>);

    impl Write for Trickle {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = buf.len().min(3);
            self.0.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn header(w: &mut impl Write) {
        w.write_u32_le(0x424E_544C).unwrap();
        w.write_u16_le(1).unwrap();
        w.write_var_u32(14).unwrap();
        w.write_string("Grand-Place").unwrap();
    }

    #[test]
    fn footer_matches_what_the_reader_sees() {
        let mut w = ChecksumWriter::new(Vec::new());
        header(&mut w);
        let (crc, mut bytes) = w.finish();
        let payload = bytes.len();
        bytes.write_u64_le(crc).unwrap();

        let mut r = ChecksumReader::new(bytes.as_slice());
        assert_eq!(r.read_u32_le().unwrap(), 0x424E_544C);
        assert_eq!(r.read_u16_le().unwrap(), 1);
        assert_eq!(r.read_var_u32().unwrap(), 14);
        assert_eq!(r.read_string().unwrap(), "Grand-Place");
        let (computed, mut rest) = r.finish();
        assert_eq!(computed, CRC64.checksum(&bytes[..payload]));
        assert_eq!(rest.read_u64_le().unwrap(), computed);
    }

    #[test]
    fn partial_writes_only_hash_accepted_bytes() {
        let mut w = ChecksumWriter::new(Trickle(Vec::new()));
        header(&mut w);
        let (crc, Trickle(bytes)) = w.finish();

        let mut direct = Vec::new();
        header(&mut direct);
        assert_eq!(bytes, direct);
        assert_eq!(crc, CRC64.checksum(&direct));
    }

    #[test]
    fn a_flipped_bit_changes_the_checksum() {
        let mut bytes = Vec::new();
        header(&mut bytes);
        let clean = CRC64.checksum(&bytes);
        bytes[5] ^= 0x10;

        let mut r = ChecksumReader::new(bytes.as_slice());
        let mut sink = Vec::new();
        r.read_to_end(&mut sink).unwrap();
        assert_ne!(r.finish().0, clean);
    }
}
