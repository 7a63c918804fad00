use std::io::{Read, Write};

use crate::chunks::ChunkPayload;
use crate::endian::{Endian, ReadEndian, WriteEndian};
use crate::error::Result;
use crate::table::{ChunkHeader, BASE_ENDIAN, CHUNK_HEADER_SIZE};

const NAME_CAPACITY: usize = 64;
/// Fixed part of the payload after the header, properties length included.
const FIXED_BODY_SIZE: u32 = 204;

/// Scene node: name, hierarchy links, transform and controller references.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeChunk {
    pub header:                 ChunkHeader,
    pub name:                   String,
    pub object_id:              i32,
    pub parent_id:              i32,
    pub child_count:            i32,
    pub material_id:            i32,
    pub is_group_head:          bool,
    pub is_group_member:        bool,
    /// Row-major 4x4 matrix.
    pub transform:              [f32; 16],
    pub position:               [f32; 3],
    pub rotation:               [f32; 4],
    pub scale:                  [f32; 3],
    pub position_controller_id: i32,
    pub rotation_controller_id: i32,
    pub scale_controller_id:    i32,
    pub properties:             String,
}

impl Default for NodeChunk {
    fn default() -> Self {
        Self {
            header:                 ChunkHeader::new(crate::ChunkType::NODE, 0x823, Endian::Little, 0),
            name:                   String::new(),
            object_id:              0,
            parent_id:              -1,
            child_count:            0,
            material_id:            0,
            is_group_head:          false,
            is_group_member:        false,
            transform:              [
                1.0, 0.0, 0.0, 0.0,
                0.0, 1.0, 0.0, 0.0,
                0.0, 0.0, 1.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ],
            position:               [0.0; 3],
            rotation:               [0.0, 0.0, 0.0, 1.0],
            scale:                  [1.0; 3],
            position_controller_id: -1,
            rotation_controller_id: -1,
            scale_controller_id:    -1,
            properties:             String::new(),
        }
    }
}

impl ChunkPayload for NodeChunk {
    const NAME: &'static str = "Node";

    fn header(&self) -> &ChunkHeader { &self.header }
    fn header_mut(&mut self) -> &mut ChunkHeader { &mut self.header }

    fn decode<R: Read>(reader: &mut R, _table: &ChunkHeader, _expected_size: u32) -> Result<Self> {
        let header = ChunkHeader::read(reader, BASE_ENDIAN)?;
        let e = header.endian();

        let name            = reader.read_fixed_string(NAME_CAPACITY)?;
        let object_id       = reader.read_i32_e(e)?;
        let parent_id       = reader.read_i32_e(e)?;
        let child_count     = reader.read_i32_e(e)?;
        let material_id     = reader.read_i32_e(e)?;
        let [head, member]  = reader.read_bytes::<2>()?;
        reader.expect_zeroes(2)?;
        let transform       = reader.read_f32s_e::<16>(e)?;
        let position        = reader.read_f32s_e::<3>(e)?;
        let rotation        = reader.read_f32s_e::<4>(e)?;
        let scale           = reader.read_f32s_e::<3>(e)?;
        let position_controller_id = reader.read_i32_e(e)?;
        let rotation_controller_id = reader.read_i32_e(e)?;
        let scale_controller_id    = reader.read_i32_e(e)?;

        let prop_len = reader.read_u32_e(e)?;
        let prop_bytes = reader.read_byte_vec(prop_len as u64)?;
        let properties = String::from_utf8(prop_bytes)
            .map_err(|err| crate::error::invalid_data(format!("node properties are not UTF-8: {err}")))?;

        Ok(Self {
            header,
            name,
            object_id,
            parent_id,
            child_count,
            material_id,
            is_group_head: head != 0,
            is_group_member: member != 0,
            transform,
            position,
            rotation,
            scale,
            position_controller_id,
            rotation_controller_id,
            scale_controller_id,
            properties,
        })
    }

    fn encode<W: Write>(&self, writer: &mut W, e: Endian) -> Result<()> {
        self.header.write(writer, BASE_ENDIAN)?;
        writer.write_fixed_string(&self.name, NAME_CAPACITY)?;
        writer.write_i32_e(self.object_id, e)?;
        writer.write_i32_e(self.parent_id, e)?;
        writer.write_i32_e(self.child_count, e)?;
        writer.write_i32_e(self.material_id, e)?;
        writer.write_all(&[self.is_group_head as u8, self.is_group_member as u8])?;
        writer.write_zeroes(2)?;
        writer.write_f32s_e(&self.transform, e)?;
        writer.write_f32s_e(&self.position, e)?;
        writer.write_f32s_e(&self.rotation, e)?;
        writer.write_f32s_e(&self.scale, e)?;
        writer.write_i32_e(self.position_controller_id, e)?;
        writer.write_i32_e(self.rotation_controller_id, e)?;
        writer.write_i32_e(self.scale_controller_id, e)?;
        writer.write_u32_e(self.properties.len() as u32, e)?;
        writer.write_all(self.properties.as_bytes())?;
        Ok(())
    }

    fn written_size(&self) -> u32 {
        CHUNK_HEADER_SIZE + FIXED_BODY_SIZE + self.properties.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::test_util::reencode;
    use crate::chunks::Chunk;

    fn sample(endian: Endian) -> NodeChunk {
        NodeChunk {
            header: ChunkHeader::new(crate::ChunkType::NODE, 0x823, endian, 3),
            name: "Bip01 Pelvis".into(),
            object_id: 7,
            parent_id: 2,
            child_count: 1,
            is_group_member: true,
            position: [1.5, -2.0, 0.25],
            properties: "mass=10\r\n".into(),
            ..NodeChunk::default()
        }
    }

    #[test]
    fn size_is_fixed_body_plus_properties() {
        assert_eq!(sample(Endian::Little).written_size(), 16 + 204 + 9);
    }

    #[test]
    fn reencodes_in_both_byte_orders() {
        for endian in [Endian::Little, Endian::Big] {
            let chunk = Chunk::from(sample(endian));
            let (bytes, back) = reencode(&chunk);
            assert_eq!(back, chunk);
            // object_id sits right after the header and the 64-byte name
            let field = &bytes[80..84];
            match endian {
                Endian::Little => assert_eq!(field, &7i32.to_le_bytes()),
                Endian::Big    => assert_eq!(field, &7i32.to_be_bytes()),
            }
        }
    }

    #[test]
    fn header_copy_stays_little_endian() {
        let chunk = Chunk::from(sample(Endian::Big));
        let (bytes, _) = reencode(&chunk);
        assert_eq!(&bytes[0..4], &0xCCCC_000Bu32.to_le_bytes());
        assert_eq!(&bytes[4..8], &0x8000_0823u32.to_le_bytes());
    }
}
