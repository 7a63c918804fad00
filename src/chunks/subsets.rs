//! Mesh subset table.
//!
//! Upstream writers leave the unused slots of the fixed 128-entry bone id
//! arrays uninitialised, so the stale bytes cannot be reproduced.  This
//! variant zero-fills them and reports its whole payload as an ignore range.

use std::io::{Read, Write};
use std::ops::Range;

use crate::chunks::ChunkPayload;
use crate::endian::{Endian, ReadEndian, WriteEndian};
use crate::error::{invalid_data, Result};
use crate::table::{ChunkHeader, BASE_ENDIAN, CHUNK_HEADER_SIZE};

pub const FLAG_DECOMPRESSION_MATRIX: u32 = 0x1;
pub const FLAG_BONE_INDICES:         u32 = 0x2;
pub const FLAG_TEXEL_DENSITY:        u32 = 0x4;

const SUPPORTED_FLAGS: u32 = FLAG_BONE_INDICES | FLAG_TEXEL_DENSITY;
const MAX_BONE_IDS: usize = 128;
const PREAMBLE_SIZE: u32 = 16;
const SUBSET_SIZE: u32 = 36;
const BONE_IDS_SIZE: u32 = 4 + MAX_BONE_IDS as u32 * 2;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshSubset {
    pub first_index:    i32,
    pub index_count:    i32,
    pub first_vertex:   i32,
    pub vertex_count:   i32,
    pub material_id:    i32,
    pub radius:         f32,
    pub center:         [f32; 3],
    /// Used only when [`FLAG_BONE_INDICES`] is set.  At most 128 entries.
    pub bone_ids:       Vec<u16>,
    /// Used only when [`FLAG_TEXEL_DENSITY`] is set.
    pub texel_density:  f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshSubsetsChunk {
    pub header:   ChunkHeader,
    pub flags:    u32,
    pub reserved: [i32; 2],
    pub subsets:  Vec<MeshSubset>,
}

impl MeshSubsetsChunk {
    fn has(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }
}

impl ChunkPayload for MeshSubsetsChunk {
    const NAME: &'static str = "MeshSubsets";

    fn header(&self) -> &ChunkHeader { &self.header }
    fn header_mut(&mut self) -> &mut ChunkHeader { &mut self.header }

    fn decode<R: Read>(reader: &mut R, _table: &ChunkHeader, _expected_size: u32) -> Result<Self> {
        let header = ChunkHeader::read(reader, BASE_ENDIAN)?;
        let e = header.endian();

        let flags = reader.read_u32_e(e)?;
        if flags & !SUPPORTED_FLAGS != 0 {
            return Err(invalid_data(format!("unsupported mesh subset flags {flags:#x}")).into());
        }
        let count = reader.read_u32_e(e)?;
        let reserved = [reader.read_i32_e(e)?, reader.read_i32_e(e)?];

        let mut subsets = Vec::new();
        for _ in 0..count {
            subsets.push(MeshSubset {
                first_index:  reader.read_i32_e(e)?,
                index_count:  reader.read_i32_e(e)?,
                first_vertex: reader.read_i32_e(e)?,
                vertex_count: reader.read_i32_e(e)?,
                material_id:  reader.read_i32_e(e)?,
                radius:       reader.read_f32_e(e)?,
                center:       reader.read_f32s_e(e)?,
                ..MeshSubset::default()
            });
        }

        if flags & FLAG_BONE_INDICES != 0 {
            for subset in &mut subsets {
                let used = reader.read_u32_e(e)? as usize;
                if used > MAX_BONE_IDS {
                    return Err(invalid_data(format!("subset uses {used} bone ids, capacity is {MAX_BONE_IDS}")).into());
                }
                let slots = reader.read_u16s_e::<MAX_BONE_IDS>(e)?;
                subset.bone_ids = slots[..used].to_vec();
            }
        }

        if flags & FLAG_TEXEL_DENSITY != 0 {
            for subset in &mut subsets {
                subset.texel_density = reader.read_f32_e(e)?;
            }
        }

        Ok(Self { header, flags, reserved, subsets })
    }

    fn encode<W: Write>(&self, writer: &mut W, e: Endian) -> Result<()> {
        self.header.write(writer, BASE_ENDIAN)?;
        writer.write_u32_e(self.flags, e)?;
        writer.write_u32_e(self.subsets.len() as u32, e)?;
        writer.write_i32_e(self.reserved[0], e)?;
        writer.write_i32_e(self.reserved[1], e)?;

        for s in &self.subsets {
            writer.write_i32_e(s.first_index, e)?;
            writer.write_i32_e(s.index_count, e)?;
            writer.write_i32_e(s.first_vertex, e)?;
            writer.write_i32_e(s.vertex_count, e)?;
            writer.write_i32_e(s.material_id, e)?;
            writer.write_f32_e(s.radius, e)?;
            writer.write_f32s_e(&s.center, e)?;
        }

        if self.has(FLAG_BONE_INDICES) {
            for s in &self.subsets {
                if s.bone_ids.len() > MAX_BONE_IDS {
                    return Err(invalid_data(format!(
                        "subset has {} bone ids, capacity is {MAX_BONE_IDS}",
                        s.bone_ids.len()
                    ))
                    .into());
                }
                writer.write_u32_e(s.bone_ids.len() as u32, e)?;
                writer.write_u16s_e(&s.bone_ids, e)?;
                writer.write_zeroes((MAX_BONE_IDS - s.bone_ids.len()) * 2)?;
            }
        }

        if self.has(FLAG_TEXEL_DENSITY) {
            for s in &self.subsets {
                writer.write_f32_e(s.texel_density, e)?;
            }
        }
        Ok(())
    }

    fn written_size(&self) -> u32 {
        let n = self.subsets.len() as u32;
        let mut size = CHUNK_HEADER_SIZE + PREAMBLE_SIZE + n * SUBSET_SIZE;
        if self.has(FLAG_BONE_INDICES) {
            size += n * BONE_IDS_SIZE;
        }
        if self.has(FLAG_TEXEL_DENSITY) {
            size += n * 4;
        }
        size
    }

    fn ignore_ranges(&self) -> Vec<Range<u32>> {
        vec![0..self.written_size()]
    }
}
