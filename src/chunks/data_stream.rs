use std::io::{Read, Write};

use crate::chunks::ChunkPayload;
use crate::endian::{Endian, ReadEndian, WriteEndian};
use crate::error::{invalid_data, CryError, Result};
use crate::table::{ChunkHeader, BASE_ENDIAN, CHUNK_HEADER_SIZE};

const PREAMBLE_SIZE: u32 = 24;

/// Typed vertex stream (positions, normals, indices, ...).
///
/// Elements are kept as raw bytes in file order, so like [`OpaqueChunk`]
/// they can only be written back in the byte order they were read in.
///
/// [`OpaqueChunk`]: super::OpaqueChunk
#[derive(Debug, Clone, PartialEq)]
pub struct DataStreamChunk {
    pub header:       ChunkHeader,
    pub flags:        u32,
    pub stream_type:  u32,
    pub count:        u32,
    pub element_size: u32,
    pub reserved:     [u32; 2],
    /// `count * element_size` bytes.
    pub data:         Vec<u8>,
    pub data_endian:  Endian,
}

impl ChunkPayload for DataStreamChunk {
    const NAME: &'static str = "DataStream";

    fn header(&self) -> &ChunkHeader { &self.header }
    fn header_mut(&mut self) -> &mut ChunkHeader { &mut self.header }

    fn decode<R: Read>(reader: &mut R, _table: &ChunkHeader, _expected_size: u32) -> Result<Self> {
        let header = ChunkHeader::read(reader, BASE_ENDIAN)?;
        let e = header.endian();

        let flags        = reader.read_u32_e(e)?;
        let stream_type  = reader.read_u32_e(e)?;
        let count        = reader.read_u32_e(e)?;
        let element_size = reader.read_u32_e(e)?;
        let reserved     = [reader.read_u32_e(e)?, reader.read_u32_e(e)?];

        let len = count
            .checked_mul(element_size)
            .ok_or_else(|| invalid_data(format!("data stream of {count} x {element_size} bytes overflows")))?;
        let data = reader.read_byte_vec(len as u64)?;

        Ok(Self { header, flags, stream_type, count, element_size, reserved, data, data_endian: e })
    }

    fn encode<W: Write>(&self, writer: &mut W, e: Endian) -> Result<()> {
        if e != self.data_endian {
            return Err(CryError::EncodeUnsupported(format!(
                "data stream {} stored {:?}-endian cannot be rewritten {:?}-endian",
                self.header.id, self.data_endian, e
            )));
        }
        if self.data.len() as u64 != self.count as u64 * self.element_size as u64 {
            return Err(invalid_data(format!(
                "data stream holds {} bytes, expected {} x {}",
                self.data.len(),
                self.count,
                self.element_size
            ))
            .into());
        }
        self.header.write(writer, BASE_ENDIAN)?;
        writer.write_u32_e(self.flags, e)?;
        writer.write_u32_e(self.stream_type, e)?;
        writer.write_u32_e(self.count, e)?;
        writer.write_u32_e(self.element_size, e)?;
        writer.write_u32_e(self.reserved[0], e)?;
        writer.write_u32_e(self.reserved[1], e)?;
        writer.write_all(&self.data)?;
        Ok(())
    }

    fn written_size(&self) -> u32 {
        CHUNK_HEADER_SIZE + PREAMBLE_SIZE + self.data.len() as u32
    }
}
