//! Fixed file header.
//!
//! ```text
//! offset  size  field
//!      0     8  magic region (dialect dependent, see [`Dialect`])
//!      8     4  file type          (u32 LE, validated)
//!     12     4  file version       (u32 LE, validated)
//!     16     4  chunk table offset (u32 LE, points at the chunk count field)
//!     20     4  chunk count        (u32 LE)
//! ```
//!
//! The header is always little-endian regardless of per-chunk byte order.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Seek, Write};

use crate::error::{CryError, Result};

/// Shared magic prefix of both dialects.
pub const MAGIC_PREFIX: &[u8; 7] = b"CryTek\0";
/// Full 8-byte magic of the [`Dialect::Exact`] variant.
pub const MAGIC_EXACT: &[u8; 8] = b"CryTek\0\0";

/// Distance between the stored table offset and the first table entry:
/// the offset addresses the `chunk_count` field that precedes the entries.
pub const TABLE_OFFSET_BIAS: u32 = 4;

/// The two on-disk header flavours.  They differ only in how the magic
/// region is written; chunk table and payload layout are identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `CryTek\0` plus one pad byte that is ignored on read and written as 0.
    #[default]
    Padded,
    /// `CryTek\0\0`, every byte validated.
    Exact,
}

impl Dialect {
    /// Bytes occupied by the magic region, including any pad byte.
    pub fn magic_len(self) -> usize {
        match self {
            Dialect::Padded => MAGIC_PREFIX.len() + 1,
            Dialect::Exact  => MAGIC_EXACT.len(),
        }
    }

    /// Absolute offset of the pad byte, if this dialect has one.
    pub fn pad_byte_offset(self) -> Option<usize> {
        match self {
            Dialect::Padded => Some(MAGIC_PREFIX.len()),
            Dialect::Exact  => None,
        }
    }

    /// Size of the complete fixed header.
    pub fn header_size(self) -> u32 {
        self.magic_len() as u32 + 16
    }

    /// Value stored in the `chunk_table_offset` field.
    pub fn table_offset(self) -> u32 {
        self.header_size() - TABLE_OFFSET_BIAS
    }

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Padded => "padded",
            Dialect::Exact  => "exact",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "padded" => Some(Dialect::Padded),
            "exact"  => Some(Dialect::Exact),
            _        => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    Geometry,
    Animation,
}

impl FileType {
    pub fn to_raw(self) -> u32 {
        match self {
            FileType::Geometry  => 0xFFFF_0000,
            FileType::Animation => 0xFFFF_0001,
        }
    }

    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0xFFFF_0000 => Some(FileType::Geometry),
            0xFFFF_0001 => Some(FileType::Animation),
            _           => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileVersion {
    V0744,
    V0745,
}

impl FileVersion {
    pub fn to_raw(self) -> u32 {
        match self {
            FileVersion::V0744 => 0x0744,
            FileVersion::V0745 => 0x0745,
        }
    }

    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0x0744 => Some(FileVersion::V0744),
            0x0745 => Some(FileVersion::V0745),
            _      => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileHeader {
    pub dialect:      Dialect,
    pub file_type:    FileType,
    pub file_version: FileVersion,
    pub chunk_count:  u32,
}

impl FileHeader {
    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        match self.dialect {
            Dialect::Padded => {
                writer.write_all(MAGIC_PREFIX)?;
                writer.write_u8(0)?;
            }
            Dialect::Exact => writer.write_all(MAGIC_EXACT)?,
        }
        writer.write_u32::<LittleEndian>(self.file_type.to_raw())?;
        writer.write_u32::<LittleEndian>(self.file_version.to_raw())?;
        writer.write_u32::<LittleEndian>(self.dialect.table_offset())?;
        writer.write_u32::<LittleEndian>(self.chunk_count)?;
        Ok(())
    }

    /// Read and validate the header.  `base` is the stream position of the
    /// first magic byte; the table offset self-check is relative to it.
    pub fn read<R: Read + Seek>(reader: &mut R, dialect: Dialect, base: u64) -> Result<Self> {
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic[..dialect.magic_len()])?;
        let expected: &[u8] = match dialect {
            Dialect::Padded => MAGIC_PREFIX,
            Dialect::Exact  => MAGIC_EXACT,
        };
        if &magic[..expected.len()] != expected {
            return Err(CryError::BadMagic {
                expected: hex::encode(expected),
                found:    hex::encode(&magic[..expected.len()]),
            });
        }

        let raw_type = reader.read_u32::<LittleEndian>()?;
        let file_type = FileType::from_raw(raw_type).ok_or(CryError::BadFileType(raw_type))?;
        let raw_version = reader.read_u32::<LittleEndian>()?;
        let file_version =
            FileVersion::from_raw(raw_version).ok_or(CryError::BadFileVersion(raw_version))?;

        let table_offset = reader.read_u32::<LittleEndian>()?;
        let chunk_count  = reader.read_u32::<LittleEndian>()?;

        let position = reader.stream_position()? - base;
        if position != table_offset as u64 + TABLE_OFFSET_BIAS as u64 {
            return Err(CryError::TableOffsetMismatch { declared: table_offset, position });
        }

        Ok(Self { dialect, file_type, file_version, chunk_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header(dialect: Dialect) -> FileHeader {
        FileHeader {
            dialect,
            file_type:    FileType::Geometry,
            file_version: FileVersion::V0745,
            chunk_count:  3,
        }
    }

    #[test]
    fn both_dialects_produce_24_byte_headers() {
        for dialect in [Dialect::Padded, Dialect::Exact] {
            let mut buf = Vec::new();
            header(dialect).write(&mut buf).unwrap();
            assert_eq!(buf.len(), 24);
            assert_eq!(dialect.header_size(), 24);
            assert_eq!(&buf[16..20], &20u32.to_le_bytes());
            let back = FileHeader::read(&mut Cursor::new(&buf), dialect, 0).unwrap();
            assert_eq!(back, header(dialect));
        }
    }

    #[test]
    fn padded_dialect_ignores_pad_byte() {
        let mut buf = Vec::new();
        header(Dialect::Padded).write(&mut buf).unwrap();
        buf[7] = 0xAB;
        assert!(FileHeader::read(&mut Cursor::new(&buf), Dialect::Padded, 0).is_ok());
        assert!(matches!(
            FileHeader::read(&mut Cursor::new(&buf), Dialect::Exact, 0),
            Err(CryError::BadMagic { .. })
        ));
    }

    #[test]
    fn rejects_undefined_type_and_version() {
        let mut buf = Vec::new();
        header(Dialect::Padded).write(&mut buf).unwrap();
        let mut bad_type = buf.clone();
        bad_type[8..12].copy_from_slice(&7u32.to_le_bytes());
        assert!(matches!(
            FileHeader::read(&mut Cursor::new(&bad_type), Dialect::Padded, 0),
            Err(CryError::BadFileType(7))
        ));
        let mut bad_version = buf.clone();
        bad_version[12..16].copy_from_slice(&0x746u32.to_le_bytes());
        assert!(matches!(
            FileHeader::read(&mut Cursor::new(&bad_version), Dialect::Padded, 0),
            Err(CryError::BadFileVersion(0x746))
        ));
    }

    #[test]
    fn rejects_misdeclared_table_offset() {
        let mut buf = Vec::new();
        header(Dialect::Exact).write(&mut buf).unwrap();
        buf[16..20].copy_from_slice(&24u32.to_le_bytes());
        assert!(matches!(
            FileHeader::read(&mut Cursor::new(&buf), Dialect::Exact, 0),
            Err(CryError::TableOffsetMismatch { declared: 24, position: 24 })
        ));
    }
}
