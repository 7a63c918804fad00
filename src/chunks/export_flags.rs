use std::io::{Read, Write};

use crate::chunks::ChunkPayload;
use crate::endian::{Endian, ReadEndian, WriteEndian};
use crate::error::Result;
use crate::table::{ChunkHeader, BASE_ENDIAN, CHUNK_HEADER_SIZE};

const BODY_SIZE: u32 = 164;
const RESERVED_WORDS: usize = 30;

pub const FLAG_MERGE_ALL_NODES:    u32 = 0x1;
pub const FLAG_HAVE_AUTO_LODS:     u32 = 0x2;
pub const FLAG_USE_CUSTOM_NORMALS: u32 = 0x4;

/// Exporter flags and resource compiler version.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFlagsChunk {
    pub header:              ChunkHeader,
    pub flags:               u32,
    pub rc_version:          [u32; 4],
    /// Raw, NUL-padded text.  Kept as bytes; padding is not always zero.
    pub rc_version_string:   [u8; 16],
    pub asset_author_tool:   u32,
    pub author_tool_version: u32,
    pub reserved:            [u32; RESERVED_WORDS],
}

impl ExportFlagsChunk {
    pub fn new(header: ChunkHeader) -> Self {
        Self {
            header,
            flags: 0,
            rc_version: [0; 4],
            rc_version_string: [0; 16],
            asset_author_tool: 0,
            author_tool_version: 0,
            reserved: [0; RESERVED_WORDS],
        }
    }

    /// `rc_version_string` up to the first NUL, if it is UTF-8.
    pub fn rc_version_str(&self) -> Option<&str> {
        let end = self.rc_version_string.iter().position(|&b| b == 0).unwrap_or(16);
        std::str::from_utf8(&self.rc_version_string[..end]).ok()
    }
}

impl ChunkPayload for ExportFlagsChunk {
    const NAME: &'static str = "ExportFlags";

    fn header(&self) -> &ChunkHeader { &self.header }
    fn header_mut(&mut self) -> &mut ChunkHeader { &mut self.header }

    fn decode<R: Read>(reader: &mut R, _table: &ChunkHeader, _expected_size: u32) -> Result<Self> {
        let header = ChunkHeader::read(reader, BASE_ENDIAN)?;
        let e = header.endian();

        let flags = reader.read_u32_e(e)?;
        let mut rc_version = [0u32; 4];
        for v in rc_version.iter_mut() {
            *v = reader.read_u32_e(e)?;
        }
        let rc_version_string = reader.read_bytes::<16>()?;
        let asset_author_tool = reader.read_u32_e(e)?;
        let author_tool_version = reader.read_u32_e(e)?;
        let mut reserved = [0u32; RESERVED_WORDS];
        for v in reserved.iter_mut() {
            *v = reader.read_u32_e(e)?;
        }

        Ok(Self {
            header,
            flags,
            rc_version,
            rc_version_string,
            asset_author_tool,
            author_tool_version,
            reserved,
        })
    }

    fn encode<W: Write>(&self, writer: &mut W, e: Endian) -> Result<()> {
        self.header.write(writer, BASE_ENDIAN)?;
        writer.write_u32_e(self.flags, e)?;
        for &v in &self.rc_version {
            writer.write_u32_e(v, e)?;
        }
        writer.write_all(&self.rc_version_string)?;
        writer.write_u32_e(self.asset_author_tool, e)?;
        writer.write_u32_e(self.author_tool_version, e)?;
        for &v in &self.reserved {
            writer.write_u32_e(v, e)?;
        }
        Ok(())
    }

    fn written_size(&self) -> u32 {
        CHUNK_HEADER_SIZE + BODY_SIZE
    }
}
