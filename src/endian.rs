//! Byte-order aware primitives.
//!
//! The container header, the chunk table and every chunk's own header copy
//! are little-endian.  Chunk payload fields use the byte order selected by
//! the high bit of the chunk's `version_raw`.  Instead of toggling a shared
//! stream flag, every read/write call takes the [`Endian`] explicitly.

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use std::io::{self, Read, Write};

use crate::error::invalid_data;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

impl Endian {
    #[inline]
    pub fn from_big_flag(big: bool) -> Self {
        if big { Endian::Big } else { Endian::Little }
    }

    #[inline]
    pub fn is_big(self) -> bool {
        self == Endian::Big
    }
}

macro_rules! endian_read {
    ($name:ident, $inner:ident, $ty:ty) => {
        #[inline]
        fn $name(&mut self, endian: Endian) -> io::Result<$ty> {
            match endian {
                Endian::Little => self.$inner::<LittleEndian>(),
                Endian::Big    => self.$inner::<BigEndian>(),
            }
        }
    };
}

macro_rules! endian_write {
    ($name:ident, $inner:ident, $ty:ty) => {
        #[inline]
        fn $name(&mut self, value: $ty, endian: Endian) -> io::Result<()> {
            match endian {
                Endian::Little => self.$inner::<LittleEndian>(value),
                Endian::Big    => self.$inner::<BigEndian>(value),
            }
        }
    };
}

/// Runtime byte-order reads on top of `byteorder`.
pub trait ReadEndian: Read {
    endian_read!(read_u16_e, read_u16, u16);
    endian_read!(read_u32_e, read_u32, u32);
    endian_read!(read_i32_e, read_i32, i32);
    endian_read!(read_f32_e, read_f32, f32);

    fn read_f32s_e<const N: usize>(&mut self, endian: Endian) -> io::Result<[f32; N]> {
        let mut out = [0f32; N];
        for v in out.iter_mut() {
            *v = self.read_f32_e(endian)?;
        }
        Ok(out)
    }

    fn read_u16s_e<const N: usize>(&mut self, endian: Endian) -> io::Result<[u16; N]> {
        let mut out = [0u16; N];
        for v in out.iter_mut() {
            *v = self.read_u16_e(endian)?;
        }
        Ok(out)
    }

    fn read_bytes<const N: usize>(&mut self) -> io::Result<[u8; N]> {
        let mut out = [0u8; N];
        self.read_exact(&mut out)?;
        Ok(out)
    }

    /// `len` bytes whose count comes from the file.  The buffer grows as
    /// bytes arrive, so a bogus length ends in `UnexpectedEof`, not in an
    /// allocation of that size.
    fn read_byte_vec(&mut self, len: u64) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        Read::take(&mut *self, len).read_to_end(&mut buf)?;
        if (buf.len() as u64) < len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {len} bytes, stream ended after {}", buf.len()),
            ));
        }
        Ok(buf)
    }

    /// Fixed-capacity NUL-padded UTF-8 string.  Bytes after the first NUL are
    /// discarded.
    fn read_fixed_string(&mut self, capacity: usize) -> io::Result<String> {
        let mut buf = vec![0u8; capacity];
        self.read_exact(&mut buf)?;
        let end = buf.iter().position(|&b| b == 0).unwrap_or(capacity);
        buf.truncate(end);
        String::from_utf8(buf).map_err(|e| invalid_data(format!("fixed string is not UTF-8: {e}")))
    }

    /// Consume `count` bytes that must all be zero.
    fn expect_zeroes(&mut self, count: usize) -> io::Result<()> {
        let mut buf = vec![0u8; count];
        self.read_exact(&mut buf)?;
        if let Some(i) = buf.iter().position(|&b| b != 0) {
            return Err(invalid_data(format!("expected {count} zero bytes, byte {i} is {:#04x}", buf[i])));
        }
        Ok(())
    }
}

impl<R: Read + ?Sized> ReadEndian for R {}

/// Runtime byte-order writes on top of `byteorder`.
pub trait WriteEndian: Write {
    endian_write!(write_u16_e, write_u16, u16);
    endian_write!(write_u32_e, write_u32, u32);
    endian_write!(write_i32_e, write_i32, i32);
    endian_write!(write_f32_e, write_f32, f32);

    fn write_f32s_e(&mut self, values: &[f32], endian: Endian) -> io::Result<()> {
        for &v in values {
            self.write_f32_e(v, endian)?;
        }
        Ok(())
    }

    fn write_u16s_e(&mut self, values: &[u16], endian: Endian) -> io::Result<()> {
        for &v in values {
            self.write_u16_e(v, endian)?;
        }
        Ok(())
    }

    /// Write `value` NUL-padded to exactly `capacity` bytes.
    fn write_fixed_string(&mut self, value: &str, capacity: usize) -> io::Result<()> {
        let bytes = value.as_bytes();
        if bytes.len() > capacity {
            return Err(invalid_data(format!(
                "string of {} bytes exceeds fixed capacity {capacity}",
                bytes.len()
            )));
        }
        self.write_all(bytes)?;
        self.write_zeroes(capacity - bytes.len())
    }

    fn write_zeroes(&mut self, count: usize) -> io::Result<()> {
        const ZEROES: [u8; 64] = [0u8; 64];
        let mut left = count;
        while left > 0 {
            let n = left.min(ZEROES.len());
            self.write_all(&ZEROES[..n])?;
            left -= n;
        }
        Ok(())
    }
}

impl<W: Write + ?Sized> WriteEndian for W {}

/// Round `n` up to the next multiple of 4.
#[inline]
pub fn align4(n: u64) -> u64 {
    (n + 3) & !3
}
