//! Binary stream primitives
//!
//! Fixed-width little-endian integers, single-byte booleans and markers,
//! length-prefixed UTF-8 strings and length-prefixed `bincode` payloads.
//! The tree format in [`flatten`] is written entirely with these.

pub mod flatten;

use crate::error::{Result, StreamError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{Read, Write};

/// Structural sentinels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Marker {
    Frame = 0xF0,
    StartOfObject = 0xF1,
    EndOfObject = 0xF2,
}

/// Kind discriminant of a stored scope node
pub const KIND_SCOPE: u8 = b'S';
/// Kind discriminant of a stored value node
pub const KIND_VALUE: u8 = b'V';

pub const DESCRIPTION_PRESENT: u8 = 0x01;
pub const DESCRIPTION_ABSENT: u8 = 0x00;

/// XOR mask applied to stored child counts
pub const COUNT_MASK: u32 = u32::MAX;

fn to_u32(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| StreamError::CountOverflow(len).into())
}

/// Writes primitive values to a byte sink
pub struct StreamWriter<W> {
    inner: W,
}

impl<W: Write> StreamWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.inner.write_all(&[value])?;
        Ok(())
    }

    pub fn write_marker(&mut self, marker: Marker) -> Result<()> {
        self.write_u8(marker as u8)
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(u8::from(value))
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.inner.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    /// Write a count that must fit in 32 bits
    pub fn write_count(&mut self, count: usize) -> Result<()> {
        self.write_u32(to_u32(count)?)
    }

    pub fn write_str(&mut self, value: &str) -> Result<()> {
        self.write_bytes(value.as_bytes())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_u32(to_u32(bytes.len())?)?;
        self.inner.write_all(bytes)?;
        Ok(())
    }

    /// Write a payload as a length-prefixed bincode blob
    pub fn write_payload<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let encoded = bincode::serialize(value)?;
        self.write_bytes(&encoded)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

/// Reads primitive values from a byte source
pub struct StreamReader<R> {
    inner: R,
}

impl<R: Read> StreamReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.inner.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// Read one byte and require it to be `marker`
    pub fn expect_marker(&mut self, marker: Marker) -> Result<()> {
        let found = self.read_u8()?;
        if found != marker as u8 {
            return Err(StreamError::UnexpectedMarker {
                expected: marker as u8,
                found,
            }
            .into());
        }
        Ok(())
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(StreamError::BadBool(other).into()),
        }
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.inner.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes).map_err(|_| StreamError::BadString.into())
    }

    fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read_u32()? as u64;
        let mut bytes = Vec::new();
        // Bounded by what the source actually holds, not by the stored length
        (&mut self.inner).take(len).read_to_end(&mut bytes)?;
        if bytes.len() as u64 != len {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "stream ended inside a length-prefixed field",
            )
            .into());
        }
        Ok(bytes)
    }

    pub fn read_payload<T: DeserializeOwned>(&mut self) -> Result<T> {
        let bytes = self.read_bytes()?;
        Ok(bincode::deserialize(&bytes)?)
    }
}
