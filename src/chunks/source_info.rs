use std::io::{Read, Write};
use std::ops::Range;

use crate::chunks::ChunkPayload;
use crate::endian::{Endian, ReadEndian};
use crate::error::Result;
use crate::table::ChunkHeader;

/// Exporter source information.  Version 0 payloads carry no header copy,
/// so the chunk adopts the table entry's header.
///
/// Upstream writers store an inconsistent value in bytes 8..12 of the body,
/// which are reported as an ignore range.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInfoChunk {
    pub header: ChunkHeader,
    pub body:   Vec<u8>,
}

impl ChunkPayload for SourceInfoChunk {
    const NAME: &'static str = "SourceInfo";

    fn header(&self) -> &ChunkHeader { &self.header }
    fn header_mut(&mut self) -> &mut ChunkHeader { &mut self.header }

    fn decode<R: Read>(reader: &mut R, table: &ChunkHeader, expected_size: u32) -> Result<Self> {
        let body = reader.read_byte_vec(expected_size as u64)?;
        Ok(Self { header: *table, body })
    }

    fn encode<W: Write>(&self, writer: &mut W, _endian: Endian) -> Result<()> {
        writer.write_all(&self.body)?;
        Ok(())
    }

    fn written_size(&self) -> u32 {
        self.body.len() as u32
    }

    fn ignore_ranges(&self) -> Vec<Range<u32>> {
        vec![8..12]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::test_util::reencode;
    use crate::chunks::Chunk;
    use crate::ChunkType;

    #[test]
    fn adopts_table_header() {
        let mut table = ChunkHeader::new(ChunkType::SOURCE_INFO, 0, Endian::Little, 1);
        table.offset = 0x2C;
        let chunk = Chunk::from(SourceInfoChunk {
            header: table,
            body:   b"C:\\art\\hero.max\0\0\0\0".to_vec(),
        });
        let (bytes, back) = reencode(&chunk);
        assert_eq!(bytes.len(), 20);
        assert_eq!(back.header(), &table);
        assert_eq!(back, chunk);
        assert_eq!(back.ignore_ranges(), vec![8..12]);
    }
}
