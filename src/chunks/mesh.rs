//! Compiled mesh index chunks: internal faces, external-to-internal vertex
//! map and internal skin vertices.

use std::io::{Read, Write};

use crate::chunks::ChunkPayload;
use crate::endian::{Endian, ReadEndian, WriteEndian};
use crate::error::Result;
use crate::table::{ChunkHeader, BASE_ENDIAN, CHUNK_HEADER_SIZE};

const FACE_SIZE: u32 = 6;
const SKIN_RESERVED_SIZE: u32 = 32;

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledIntFacesChunk {
    pub header: ChunkHeader,
    pub faces:  Vec<[u16; 3]>,
}

impl ChunkPayload for CompiledIntFacesChunk {
    const NAME: &'static str = "CompiledIntFaces";

    fn header(&self) -> &ChunkHeader { &self.header }
    fn header_mut(&mut self) -> &mut ChunkHeader { &mut self.header }

    fn decode<R: Read>(reader: &mut R, _table: &ChunkHeader, expected_size: u32) -> Result<Self> {
        let header = ChunkHeader::read(reader, BASE_ENDIAN)?;
        let e = header.endian();
        let count = expected_size.saturating_sub(CHUNK_HEADER_SIZE) / FACE_SIZE;
        let mut faces = Vec::with_capacity(count as usize);
        for _ in 0..count {
            faces.push(reader.read_u16s_e::<3>(e)?);
        }
        Ok(Self { header, faces })
    }

    fn encode<W: Write>(&self, writer: &mut W, e: Endian) -> Result<()> {
        self.header.write(writer, BASE_ENDIAN)?;
        for face in &self.faces {
            writer.write_u16s_e(face, e)?;
        }
        Ok(())
    }

    fn written_size(&self) -> u32 {
        CHUNK_HEADER_SIZE + self.faces.len() as u32 * FACE_SIZE
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExt2IntMapChunk {
    pub header: ChunkHeader,
    pub map:    Vec<u16>,
}

impl ChunkPayload for CompiledExt2IntMapChunk {
    const NAME: &'static str = "CompiledExt2IntMap";

    fn header(&self) -> &ChunkHeader { &self.header }
    fn header_mut(&mut self) -> &mut ChunkHeader { &mut self.header }

    fn decode<R: Read>(reader: &mut R, _table: &ChunkHeader, expected_size: u32) -> Result<Self> {
        let header = ChunkHeader::read(reader, BASE_ENDIAN)?;
        let e = header.endian();
        let count = expected_size.saturating_sub(CHUNK_HEADER_SIZE) / 2;
        let mut map = Vec::with_capacity(count as usize);
        for _ in 0..count {
            map.push(reader.read_u16_e(e)?);
        }
        Ok(Self { header, map })
    }

    fn encode<W: Write>(&self, writer: &mut W, e: Endian) -> Result<()> {
        self.header.write(writer, BASE_ENDIAN)?;
        writer.write_u16s_e(&self.map, e)?;
        Ok(())
    }

    fn written_size(&self) -> u32 {
        CHUNK_HEADER_SIZE + self.map.len() as u32 * 2
    }
}

/// Skinned vertex (64 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IntSkinVertex {
    pub obsolete0: [f32; 3],
    pub position:  [f32; 3],
    pub obsolete2: [f32; 3],
    pub bone_ids:  [u16; 4],
    pub weights:   [f32; 4],
    pub color:     [u8; 4],
}

impl IntSkinVertex {
    pub const SIZE: u32 = 64;

    fn read<R: Read>(reader: &mut R, e: Endian) -> Result<Self> {
        Ok(Self {
            obsolete0: reader.read_f32s_e(e)?,
            position:  reader.read_f32s_e(e)?,
            obsolete2: reader.read_f32s_e(e)?,
            bone_ids:  reader.read_u16s_e(e)?,
            weights:   reader.read_f32s_e(e)?,
            color:     reader.read_bytes()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, e: Endian) -> Result<()> {
        writer.write_f32s_e(&self.obsolete0, e)?;
        writer.write_f32s_e(&self.position, e)?;
        writer.write_f32s_e(&self.obsolete2, e)?;
        writer.write_u16s_e(&self.bone_ids, e)?;
        writer.write_f32s_e(&self.weights, e)?;
        writer.write_all(&self.color)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledIntSkinVerticesChunk {
    pub header:   ChunkHeader,
    pub vertices: Vec<IntSkinVertex>,
}

impl ChunkPayload for CompiledIntSkinVerticesChunk {
    const NAME: &'static str = "CompiledIntSkinVertices";

    fn header(&self) -> &ChunkHeader { &self.header }
    fn header_mut(&mut self) -> &mut ChunkHeader { &mut self.header }

    fn decode<R: Read>(reader: &mut R, _table: &ChunkHeader, expected_size: u32) -> Result<Self> {
        let header = ChunkHeader::read(reader, BASE_ENDIAN)?;
        let e = header.endian();
        reader.expect_zeroes(SKIN_RESERVED_SIZE as usize)?;
        let count =
            expected_size.saturating_sub(CHUNK_HEADER_SIZE + SKIN_RESERVED_SIZE) / IntSkinVertex::SIZE;
        let vertices = (0..count)
            .map(|_| IntSkinVertex::read(reader, e))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { header, vertices })
    }

    fn encode<W: Write>(&self, writer: &mut W, e: Endian) -> Result<()> {
        self.header.write(writer, BASE_ENDIAN)?;
        writer.write_zeroes(SKIN_RESERVED_SIZE as usize)?;
        for vertex in &self.vertices {
            vertex.write(writer, e)?;
        }
        Ok(())
    }

    fn written_size(&self) -> u32 {
        CHUNK_HEADER_SIZE + SKIN_RESERVED_SIZE + self.vertices.len() as u32 * IntSkinVertex::SIZE
    }
}
