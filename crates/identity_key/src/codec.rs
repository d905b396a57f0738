//! Utilities for reading/writing compact binary encodings.
//!
//! - `uint` is a variable length integer: values below `0xfd` are a single
//!   byte, otherwise a `0xfd` / `0xfe` / `0xff` marker byte is followed by a
//!   little-endian u16 / u32 / u64.
//! - fixed-width integers are little-endian.
//! - fixed size byte fields are written raw, with no length prefix.

use crate::*;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

const UINT_U16: u8 = 0xfd;
const UINT_U32: u8 = 0xfe;
const UINT_U64: u8 = 0xff;

/// Read from bytes.
pub struct CodecReader<'lt>(std::io::Cursor<&'lt [u8]>);

impl<'lt> CodecReader<'lt> {
    /// Create a new codec Reader.
    pub fn new(data: &'lt [u8]) -> Self {
        Self(std::io::Cursor::new(data))
    }

    /// Count of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.0.get_ref().len() - self.0.position() as usize
    }

    /// Error if any bytes remain unconsumed.
    pub fn finish(self) -> IdentityResult<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(IdentityError::malformed(format!("{n} trailing bytes"))),
        }
    }

    /// Read a variable length uint element.
    pub fn read_uint(&mut self) -> IdentityResult<u64> {
        Ok(match self.read_u8()? {
            UINT_U16 => {
                self.0.read_u16::<LittleEndian>().map_err(eof)? as u64
            }
            UINT_U32 => {
                self.0.read_u32::<LittleEndian>().map_err(eof)? as u64
            }
            UINT_U64 => self.0.read_u64::<LittleEndian>().map_err(eof)?,
            b => b as u64,
        })
    }

    /// Read a u8 element.
    pub fn read_u8(&mut self) -> IdentityResult<u8> {
        self.0.read_u8().map_err(eof)
    }

    /// Read a fixed-width u64 element.
    pub fn read_u64(&mut self) -> IdentityResult<u64> {
        self.0.read_u64::<LittleEndian>().map_err(eof)
    }

    /// Read a fixed size bytes element.
    pub fn read_fixed<const N: usize>(&mut self) -> IdentityResult<[u8; N]> {
        let mut out = [0; N];
        self.0.read_exact(&mut out).map_err(eof)?;
        Ok(out)
    }

    /// Read a length-prefixed array, decoding each element with `f`.
    /// `min_item_len` bounds the up-front allocation.
    pub fn read_array<T, F>(
        &mut self,
        min_item_len: usize,
        mut f: F,
    ) -> IdentityResult<Vec<T>>
    where
        F: FnMut(&mut Self) -> IdentityResult<T>,
    {
        let count = self.read_uint()?;
        if count > (self.remaining() / min_item_len.max(1)) as u64 {
            return Err(IdentityError::malformed(format!(
                "array of {count} items exceeds buffer"
            )));
        }
        let mut out = Vec::with_capacity(count as usize);
        for _ in 0..count {
            out.push(f(self)?);
        }
        Ok(out)
    }
}

/// Write to bytes.
#[derive(Default)]
pub struct CodecWriter(Vec<u8>);

impl CodecWriter {
    /// Create a new codec Writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert this codec writer into the underlying Vec<u8>
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    /// Write a variable length uint element.
    pub fn write_uint(&mut self, val: u64) -> IdentityResult<()> {
        if val < UINT_U16 as u64 {
            self.0.write_u8(val as u8)?;
        } else if val <= u16::MAX as u64 {
            self.0.write_u8(UINT_U16)?;
            self.0.write_u16::<LittleEndian>(val as u16)?;
        } else if val <= u32::MAX as u64 {
            self.0.write_u8(UINT_U32)?;
            self.0.write_u32::<LittleEndian>(val as u32)?;
        } else {
            self.0.write_u8(UINT_U64)?;
            self.0.write_u64::<LittleEndian>(val)?;
        }
        Ok(())
    }

    /// Write a u8 element.
    pub fn write_u8(&mut self, val: u8) -> IdentityResult<()> {
        self.0.write_u8(val)?;
        Ok(())
    }

    /// Write a fixed-width u64 element.
    pub fn write_u64(&mut self, val: u64) -> IdentityResult<()> {
        self.0.write_u64::<LittleEndian>(val)?;
        Ok(())
    }

    /// Write a fixed size bytes element.
    pub fn write_fixed(&mut self, val: &[u8]) -> IdentityResult<()> {
        self.0.write_all(val)?;
        Ok(())
    }

    /// Write a length-prefixed array, encoding each element with `f`.
    pub fn write_array<T, F>(
        &mut self,
        items: &[T],
        mut f: F,
    ) -> IdentityResult<()>
    where
        F: FnMut(&mut Self, &T) -> IdentityResult<()>,
    {
        self.write_uint(items.len() as u64)?;
        for item in items {
            f(self, item)?;
        }
        Ok(())
    }
}

// -- local helpers -- //

fn eof(e: std::io::Error) -> IdentityError {
    IdentityError::malformed(e)
}

// -- tests -- //

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn uint_boundaries() {
        let cases: &[(u64, &[u8])] = &[
            (0, &[0x00]),
            (0xfc, &[0xfc]),
            (0xfd, &[0xfd, 0xfd, 0x00]),
            (0xffff, &[0xfd, 0xff, 0xff]),
            (0x10000, &[0xfe, 0x00, 0x00, 0x01, 0x00]),
            (
                0x1_0000_0000,
                &[0xff, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00],
            ),
        ];
        for (val, expect) in cases {
            let mut writer = CodecWriter::new();
            writer.write_uint(*val).unwrap();
            let raw = writer.into_vec();
            assert_eq!(*expect, &raw[..]);

            let mut reader = CodecReader::new(&raw);
            assert_eq!(*val, reader.read_uint().unwrap());
            reader.finish().unwrap();
        }
    }

    #[test]
    fn codec_encode_and_decode() {
        let mut writer = CodecWriter::new();
        writer.write_u8(7).unwrap();
        writer.write_u64(0x0102).unwrap();
        writer.write_fixed(&[42; 4]).unwrap();
        writer
            .write_array(&[1u8, 2, 3], |w, i| w.write_u8(*i))
            .unwrap();
        let raw = writer.into_vec();
        assert_eq!(1 + 8 + 4 + 1 + 3, raw.len());
        assert_eq!(&[0x02, 0x01, 0, 0, 0, 0, 0, 0], &raw[1..9]);

        let mut reader = CodecReader::new(&raw);
        assert_eq!(7, reader.read_u8().unwrap());
        assert_eq!(0x0102, reader.read_u64().unwrap());
        assert_eq!([42; 4], reader.read_fixed::<4>().unwrap());
        let arr = reader.read_array(1, |r| r.read_u8()).unwrap();
        assert_eq!(vec![1, 2, 3], arr);
        reader.finish().unwrap();
    }

    #[test]
    fn truncated_input_is_malformed() {
        let mut reader = CodecReader::new(&[0xfe, 0x01]);
        assert!(matches!(
            reader.read_uint(),
            Err(IdentityError::MalformedProof(_))
        ));

        // claims 200 items in a 1 byte remainder
        let mut reader = CodecReader::new(&[200, 0]);
        assert!(reader.read_array(1, |r| r.read_u8()).is_err());

        let reader = CodecReader::new(&[1]);
        assert!(reader.finish().is_err());
    }
}
