//! Chunk header and chunk table entry codec.
//!
//! A [`ChunkHeader`] appears twice for most chunks: once inside the chunk
//! table (wrapped in a [`SummaryEntry`] together with the payload size) and
//! once as the first 16 bytes of the payload itself.  Both copies go through
//! the same primitive codec and are always written in the container's base
//! byte order; the endianness flag they carry only applies to the payload
//! fields that follow.

use serde::Serialize;
use std::fmt;
use std::io::{self, Read, Write};

use crate::chunk_type::ChunkType;
use crate::endian::{Endian, ReadEndian, WriteEndian};

/// High bit of `version_raw`: payload fields are big-endian.
pub const BIG_ENDIAN_FLAG: u32 = 0x8000_0000;

/// Encoded size of a [`ChunkHeader`].
pub const CHUNK_HEADER_SIZE: u32 = 16;
/// Encoded size of a [`SummaryEntry`].
pub const SUMMARY_ENTRY_SIZE: u32 = CHUNK_HEADER_SIZE + 4;

/// Byte order used for headers and table entries.
pub const BASE_ENDIAN: Endian = Endian::Little;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkHeader {
    pub chunk_type:  ChunkType,
    pub version_raw: u32,
    /// Absolute payload position within the file.
    pub offset:      u32,
    pub id:          u32,
}

impl ChunkHeader {
    pub fn new(chunk_type: ChunkType, version: u32, endian: Endian, id: u32) -> Self {
        let flag = if endian.is_big() { BIG_ENDIAN_FLAG } else { 0 };
        Self {
            chunk_type,
            version_raw: (version & !BIG_ENDIAN_FLAG) | flag,
            offset: 0,
            id,
        }
    }

    #[inline]
    pub fn version(&self) -> u32 {
        self.version_raw & !BIG_ENDIAN_FLAG
    }

    #[inline]
    pub fn is_big_endian(&self) -> bool {
        self.version_raw & BIG_ENDIAN_FLAG != 0
    }

    /// Byte order of the payload fields following this header.
    #[inline]
    pub fn endian(&self) -> Endian {
        Endian::from_big_flag(self.is_big_endian())
    }

    pub fn read<R: Read + ?Sized>(reader: &mut R, endian: Endian) -> io::Result<Self> {
        Ok(Self {
            chunk_type:  ChunkType(reader.read_u32_e(endian)?),
            version_raw: reader.read_u32_e(endian)?,
            offset:      reader.read_u32_e(endian)?,
            id:          reader.read_u32_e(endian)?,
        })
    }

    pub fn write<W: Write + ?Sized>(&self, writer: &mut W, endian: Endian) -> io::Result<()> {
        writer.write_u32_e(self.chunk_type.0, endian)?;
        writer.write_u32_e(self.version_raw, endian)?;
        writer.write_u32_e(self.offset, endian)?;
        writer.write_u32_e(self.id, endian)?;
        Ok(())
    }
}

impl fmt::Display for ChunkHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} v{:#x}{} @{:#x}",
            self.id,
            self.chunk_type,
            self.version(),
            if self.is_big_endian() { " BE" } else { "" },
            self.offset,
        )
    }
}

/// One chunk table entry: header plus declared payload size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SummaryEntry {
    pub header: ChunkHeader,
    pub size:   u32,
}

impl SummaryEntry {
    pub fn read<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let header = ChunkHeader::read(reader, BASE_ENDIAN)?;
        let size = reader.read_u32_e(BASE_ENDIAN)?;
        Ok(Self { header, size })
    }

    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        self.header.write(writer, BASE_ENDIAN)?;
        writer.write_u32_e(self.size, BASE_ENDIAN)?;
        Ok(())
    }

    #[inline]
    pub fn written_size(&self) -> u32 {
        SUMMARY_ENTRY_SIZE
    }
}
