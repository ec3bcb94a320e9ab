//! Read/write extension traits for the primitive field types

use butterfly_common::{Error, Result};
use std::io::{Read, Write};
use uuid::Uuid;

use crate::varint;

/// Refuse to allocate for strings longer than this while decoding.
const MAX_STRING_LEN: u32 = 1 << 24;

pub trait WriteExt: Write {
    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_all(&[value])?;
        Ok(())
    }

    fn write_u16_le(&mut self, value: u16) -> Result<()> {
        self.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    fn write_u32_le(&mut self, value: u32) -> Result<()> {
        self.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    fn write_u64_le(&mut self, value: u64) -> Result<()> {
        self.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    fn write_f32_le(&mut self, value: f32) -> Result<()> {
        self.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    fn write_f64_le(&mut self, value: f64) -> Result<()> {
        self.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    fn write_var_u32(&mut self, value: u32) -> Result<usize> {
        varint::write_u32(self, value)
    }

    fn write_var_u64(&mut self, value: u64) -> Result<usize> {
        varint::write_u64(self, value)
    }

    /// Varint byte length followed by the UTF-8 bytes.
    fn write_string(&mut self, value: &str) -> Result<()> {
        let len = u32::try_from(value.len())
            .map_err(|_| Error::Format(format!("string of {} bytes is too long", value.len())))?;
        self.write_var_u32(len)?;
        self.write_all(value.as_bytes())?;
        Ok(())
    }

    fn write_guid(&mut self, value: &Uuid) -> Result<()> {
        self.write_all(value.as_bytes())?;
        Ok(())
    }
}

impl<W: Write + ?Sized> WriteExt for W {}

pub trait ReadExt: Read {
    fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_u16_le(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn read_u32_le(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn read_u64_le(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    fn read_f32_le(&mut self) -> Result<f32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(f32::from_le_bytes(buf))
    }

    fn read_f64_le(&mut self) -> Result<f64> {
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf)?;
        Ok(f64::from_le_bytes(buf))
    }

    fn read_var_u32(&mut self) -> Result<u32> {
        varint::read_u32(self)
    }

    fn read_var_u64(&mut self) -> Result<u64> {
        varint::read_u64(self)
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_var_u32()?;
        if len > MAX_STRING_LEN {
            return Err(Error::Format(format!("string length {len} exceeds limit")));
        }
        let mut buf = vec![0u8; len as usize];
        self.read_exact(&mut buf)?;
        String::from_utf8(buf).map_err(|e| Error::Format(format!("invalid UTF-8 string: {e}")))
    }

    fn read_guid(&mut self) -> Result<Uuid> {
        let mut buf = [0u8; 16];
        self.read_exact(&mut buf)?;
        Ok(Uuid::from_bytes(buf))
    }
}

impl<R: Read + ?Sized> ReadExt for R {}
