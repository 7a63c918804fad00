use std::io::{Read, Write};

use crate::chunks::ChunkPayload;
use crate::endian::{Endian, ReadEndian};
use crate::error::{CryError, Result};
use crate::table::{ChunkHeader, BASE_ENDIAN, CHUNK_HEADER_SIZE};

/// Registered chunk whose body is carried verbatim.
///
/// The body bytes are not interpreted, so they can only be written back in
/// the byte order they were read in.
#[derive(Debug, Clone, PartialEq)]
pub struct OpaqueChunk {
    pub header:      ChunkHeader,
    pub body:        Vec<u8>,
    pub body_endian: Endian,
}

impl OpaqueChunk {
    /// Wrap `body`, stored in the byte order `header` declares.
    pub fn new(header: ChunkHeader, body: Vec<u8>) -> Self {
        let body_endian = header.endian();
        Self { header, body, body_endian }
    }
}

impl ChunkPayload for OpaqueChunk {
    const NAME: &'static str = "Opaque";

    fn header(&self) -> &ChunkHeader { &self.header }
    fn header_mut(&mut self) -> &mut ChunkHeader { &mut self.header }

    fn decode<R: Read>(reader: &mut R, _table: &ChunkHeader, expected_size: u32) -> Result<Self> {
        let header = ChunkHeader::read(reader, BASE_ENDIAN)?;
        let body = reader.read_byte_vec(expected_size.saturating_sub(CHUNK_HEADER_SIZE) as u64)?;
        Ok(Self::new(header, body))
    }

    fn encode<W: Write>(&self, writer: &mut W, endian: Endian) -> Result<()> {
        if endian != self.body_endian {
            return Err(CryError::EncodeUnsupported(format!(
                "{} body stored {:?}-endian cannot be rewritten {:?}-endian",
                self.header.chunk_type, self.body_endian, endian
            )));
        }
        self.header.write(writer, BASE_ENDIAN)?;
        writer.write_all(&self.body)?;
        Ok(())
    }

    fn written_size(&self) -> u32 {
        CHUNK_HEADER_SIZE + self.body.len() as u32
    }
}
