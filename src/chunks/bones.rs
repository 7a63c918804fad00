//! Compiled skeleton chunks.
//!
//! Both variants start with 32 reserved zero bytes after the header, then an
//! array of fixed-size records filling the rest of the declared payload.

use std::io::{Read, Write};

use crate::chunks::ChunkPayload;
use crate::endian::{Endian, ReadEndian, WriteEndian};
use crate::error::Result;
use crate::table::{ChunkHeader, BASE_ENDIAN, CHUNK_HEADER_SIZE};

const RESERVED_SIZE: u32 = 32;
const BONE_NAME_CAPACITY: usize = 256;

/// Physical properties of one bone (104 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhysicsGeometry {
    pub geometry:       u32,
    pub flags:          u32,
    pub min:            [f32; 3],
    pub max:            [f32; 3],
    pub spring_angle:   [f32; 3],
    pub spring_tension: [f32; 3],
    pub damping:        [f32; 3],
    pub frame_matrix:   [f32; 9],
}

impl PhysicsGeometry {
    pub const SIZE: u32 = 104;

    fn read<R: Read>(reader: &mut R, e: Endian) -> Result<Self> {
        Ok(Self {
            geometry:       reader.read_u32_e(e)?,
            flags:          reader.read_u32_e(e)?,
            min:            reader.read_f32s_e(e)?,
            max:            reader.read_f32s_e(e)?,
            spring_angle:   reader.read_f32s_e(e)?,
            spring_tension: reader.read_f32s_e(e)?,
            damping:        reader.read_f32s_e(e)?,
            frame_matrix:   reader.read_f32s_e(e)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, e: Endian) -> Result<()> {
        writer.write_u32_e(self.geometry, e)?;
        writer.write_u32_e(self.flags, e)?;
        writer.write_f32s_e(&self.min, e)?;
        writer.write_f32s_e(&self.max, e)?;
        writer.write_f32s_e(&self.spring_angle, e)?;
        writer.write_f32s_e(&self.spring_tension, e)?;
        writer.write_f32s_e(&self.damping, e)?;
        writer.write_f32s_e(&self.frame_matrix, e)?;
        Ok(())
    }
}

/// One skinning bone (584 bytes).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledBone {
    pub controller_id:   u32,
    /// Physics of the live body.
    pub physics_live:    PhysicsGeometry,
    /// Physics of the ragdoll.
    pub physics_dead:    PhysicsGeometry,
    pub mass:            f32,
    /// Bind pose, 3x4 row-major.
    pub local_transform: [f32; 12],
    pub world_transform: [f32; 12],
    pub name:            String,
    /// Usually `0xFFFFFFFF`.
    pub limb_id:         u32,
    /// Relative to this bone, in records.
    pub parent_offset:   i32,
    pub child_count:     i32,
    pub child_offset:    i32,
}

impl CompiledBone {
    pub const SIZE: u32 = 584;

    fn read<R: Read>(reader: &mut R, e: Endian) -> Result<Self> {
        Ok(Self {
            controller_id:   reader.read_u32_e(e)?,
            physics_live:    PhysicsGeometry::read(reader, e)?,
            physics_dead:    PhysicsGeometry::read(reader, e)?,
            mass:            reader.read_f32_e(e)?,
            local_transform: reader.read_f32s_e(e)?,
            world_transform: reader.read_f32s_e(e)?,
            name:            reader.read_fixed_string(BONE_NAME_CAPACITY)?,
            limb_id:         reader.read_u32_e(e)?,
            parent_offset:   reader.read_i32_e(e)?,
            child_count:     reader.read_i32_e(e)?,
            child_offset:    reader.read_i32_e(e)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, e: Endian) -> Result<()> {
        writer.write_u32_e(self.controller_id, e)?;
        self.physics_live.write(writer, e)?;
        self.physics_dead.write(writer, e)?;
        writer.write_f32_e(self.mass, e)?;
        writer.write_f32s_e(&self.local_transform, e)?;
        writer.write_f32s_e(&self.world_transform, e)?;
        writer.write_fixed_string(&self.name, BONE_NAME_CAPACITY)?;
        writer.write_u32_e(self.limb_id, e)?;
        writer.write_i32_e(self.parent_offset, e)?;
        writer.write_i32_e(self.child_count, e)?;
        writer.write_i32_e(self.child_offset, e)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledBonesChunk {
    pub header: ChunkHeader,
    pub bones:  Vec<CompiledBone>,
}

impl ChunkPayload for CompiledBonesChunk {
    const NAME: &'static str = "CompiledBones";

    fn header(&self) -> &ChunkHeader { &self.header }
    fn header_mut(&mut self) -> &mut ChunkHeader { &mut self.header }

    fn decode<R: Read>(reader: &mut R, _table: &ChunkHeader, expected_size: u32) -> Result<Self> {
        let header = ChunkHeader::read(reader, BASE_ENDIAN)?;
        let e = header.endian();
        reader.expect_zeroes(RESERVED_SIZE as usize)?;

        let count = expected_size.saturating_sub(CHUNK_HEADER_SIZE + RESERVED_SIZE) / CompiledBone::SIZE;
        let bones = (0..count)
            .map(|_| CompiledBone::read(reader, e))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { header, bones })
    }

    fn encode<W: Write>(&self, writer: &mut W, e: Endian) -> Result<()> {
        self.header.write(writer, BASE_ENDIAN)?;
        writer.write_zeroes(RESERVED_SIZE as usize)?;
        for bone in &self.bones {
            bone.write(writer, e)?;
        }
        Ok(())
    }

    fn written_size(&self) -> u32 {
        CHUNK_HEADER_SIZE + RESERVED_SIZE + self.bones.len() as u32 * CompiledBone::SIZE
    }
}

/// One ragdoll bone (152 bytes).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledPhysicalBone {
    pub bone_id:       u32,
    pub parent_id:     i32,
    pub child_count:   i32,
    pub controller_id: u32,
    /// Raw property text; kept verbatim, unused bytes are not always zero.
    pub properties:    [u8; 32],
    pub physics:       PhysicsGeometry,
}

impl CompiledPhysicalBone {
    pub const SIZE: u32 = 152;

    fn read<R: Read>(reader: &mut R, e: Endian) -> Result<Self> {
        Ok(Self {
            bone_id:       reader.read_u32_e(e)?,
            parent_id:     reader.read_i32_e(e)?,
            child_count:   reader.read_i32_e(e)?,
            controller_id: reader.read_u32_e(e)?,
            properties:    reader.read_bytes()?,
            physics:       PhysicsGeometry::read(reader, e)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, e: Endian) -> Result<()> {
        writer.write_u32_e(self.bone_id, e)?;
        writer.write_i32_e(self.parent_id, e)?;
        writer.write_i32_e(self.child_count, e)?;
        writer.write_u32_e(self.controller_id, e)?;
        writer.write_all(&self.properties)?;
        self.physics.write(writer, e)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPhysicalBonesChunk {
    pub header: ChunkHeader,
    pub bones:  Vec<CompiledPhysicalBone>,
}

impl ChunkPayload for CompiledPhysicalBonesChunk {
    const NAME: &'static str = "CompiledPhysicalBones";

    fn header(&self) -> &ChunkHeader { &self.header }
    fn header_mut(&mut self) -> &mut ChunkHeader { &mut self.header }

    fn decode<R: Read>(reader: &mut R, _table: &ChunkHeader, expected_size: u32) -> Result<Self> {
        let header = ChunkHeader::read(reader, BASE_ENDIAN)?;
        let e = header.endian();
        reader.expect_zeroes(RESERVED_SIZE as usize)?;

        let count =
            expected_size.saturating_sub(CHUNK_HEADER_SIZE + RESERVED_SIZE) / CompiledPhysicalBone::SIZE;
        let bones = (0..count)
            .map(|_| CompiledPhysicalBone::read(reader, e))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { header, bones })
    }

    fn encode<W: Write>(&self, writer: &mut W, e: Endian) -> Result<()> {
        self.header.write(writer, BASE_ENDIAN)?;
        writer.write_zeroes(RESERVED_SIZE as usize)?;
        for bone in &self.bones {
            bone.write(writer, e)?;
        }
        Ok(())
    }

    fn written_size(&self) -> u32 {
        CHUNK_HEADER_SIZE + RESERVED_SIZE + self.bones.len() as u32 * CompiledPhysicalBone::SIZE
    }
}
