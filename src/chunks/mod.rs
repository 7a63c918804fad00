//! Chunk payload variants.
//!
//! Every payload codec implements [`ChunkPayload`].  The closed set of
//! variants is gathered in the [`Chunk`] sum type; [`ChunkKind`] is its
//! field-less discriminant and is what the registry hands out for a given
//! `(type, version)` pair.
//!
//! # Contract
//! - `decode` receives the reader positioned at the payload start and the
//!   declared payload size.  It must consume exactly that many bytes; the
//!   container measures the stream position and rejects any disagreement.
//! - The payload's own header copy is read and written in the base byte
//!   order, the rest in the order given by the header's endianness flag.
//! - `written_size` must equal the byte count `encode` produces.

use serde::Serialize;
use std::io::{Read, Write};
use std::ops::Range;

use crate::endian::Endian;
use crate::error::Result;
use crate::table::ChunkHeader;

mod bones;
mod data_stream;
mod export_flags;
mod mesh;
mod node;
mod opaque;
mod source_info;
mod subsets;

pub use bones::{
    CompiledBone, CompiledBonesChunk, CompiledPhysicalBone, CompiledPhysicalBonesChunk,
    PhysicsGeometry,
};
pub use data_stream::DataStreamChunk;
pub use export_flags::{
    ExportFlagsChunk, FLAG_HAVE_AUTO_LODS, FLAG_MERGE_ALL_NODES, FLAG_USE_CUSTOM_NORMALS,
};
pub use mesh::{CompiledExt2IntMapChunk, CompiledIntFacesChunk, CompiledIntSkinVerticesChunk, IntSkinVertex};
pub use node::NodeChunk;
pub use opaque::OpaqueChunk;
pub use source_info::SourceInfoChunk;
pub use subsets::{
    MeshSubset, MeshSubsetsChunk, FLAG_BONE_INDICES, FLAG_DECOMPRESSION_MATRIX, FLAG_TEXEL_DENSITY,
};

/// Decode/encode contract shared by every payload variant.
pub trait ChunkPayload: Sized {
    /// Variant name for diagnostics.
    const NAME: &'static str;

    fn header(&self) -> &ChunkHeader;
    fn header_mut(&mut self) -> &mut ChunkHeader;

    /// Decode one payload.  `table` is the chunk table's copy of the header;
    /// variants without an in-payload header adopt it.
    fn decode<R: Read>(reader: &mut R, table: &ChunkHeader, expected_size: u32) -> Result<Self>;

    fn encode<W: Write>(&self, writer: &mut W, endian: Endian) -> Result<()>;

    fn written_size(&self) -> u32;

    /// Payload-relative byte ranges whose on-disk content is known not to be
    /// reproducible by `encode`.
    fn ignore_ranges(&self) -> Vec<Range<u32>> {
        Vec::new()
    }
}

macro_rules! chunk_variants {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        /// A decoded chunk of any registered variant.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Chunk {
            $($variant($ty)),*
        }

        /// Discriminant of [`Chunk`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum ChunkKind {
            $($variant),*
        }

        impl ChunkKind {
            pub fn name(self) -> &'static str {
                match self {
                    $(ChunkKind::$variant => <$ty as ChunkPayload>::NAME),*
                }
            }

            /// Construct and decode the variant this kind stands for.
            pub fn decode<R: Read>(
                self,
                reader:        &mut R,
                table:         &ChunkHeader,
                expected_size: u32,
            ) -> Result<Chunk> {
                match self {
                    $(ChunkKind::$variant => {
                        <$ty as ChunkPayload>::decode(reader, table, expected_size).map(Chunk::$variant)
                    })*
                }
            }
        }

        impl Chunk {
            pub fn kind(&self) -> ChunkKind {
                match self {
                    $(Chunk::$variant(_) => ChunkKind::$variant),*
                }
            }

            pub fn header(&self) -> &ChunkHeader {
                match self {
                    $(Chunk::$variant(c) => c.header()),*
                }
            }

            pub fn header_mut(&mut self) -> &mut ChunkHeader {
                match self {
                    $(Chunk::$variant(c) => c.header_mut()),*
                }
            }

            pub fn encode<W: Write>(&self, writer: &mut W, endian: Endian) -> Result<()> {
                match self {
                    $(Chunk::$variant(c) => c.encode(writer, endian)),*
                }
            }

            pub fn written_size(&self) -> u32 {
                match self {
                    $(Chunk::$variant(c) => c.written_size()),*
                }
            }

            pub fn ignore_ranges(&self) -> Vec<Range<u32>> {
                match self {
                    $(Chunk::$variant(c) => c.ignore_ranges()),*
                }
            }
        }

        $(
            impl From<$ty> for Chunk {
                fn from(chunk: $ty) -> Self {
                    Chunk::$variant(chunk)
                }
            }
        )*
    };
}

chunk_variants! {
    SourceInfo(SourceInfoChunk),
    Node(NodeChunk),
    CompiledBones(CompiledBonesChunk),
    CompiledPhysicalBones(CompiledPhysicalBonesChunk),
    CompiledIntFaces(CompiledIntFacesChunk),
    CompiledExt2IntMap(CompiledExt2IntMapChunk),
    CompiledIntSkinVertices(CompiledIntSkinVerticesChunk),
    MeshSubsets(MeshSubsetsChunk),
    DataStream(DataStreamChunk),
    ExportFlags(ExportFlagsChunk),
    Opaque(OpaqueChunk),
}

impl ChunkKind {
    /// Payload length comes only from the table's declared size, so the
    /// decoder cannot notice a wrong one.
    pub fn sized_by_table(self) -> bool {
        matches!(self, ChunkKind::Opaque | ChunkKind::SourceInfo)
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;
    use std::io::Cursor;

    /// Encode `chunk` in its header's byte order, decode it back with the
    /// encoded length, and return both the bytes and the decoded chunk.
    pub fn reencode(chunk: &Chunk) -> (Vec<u8>, Chunk) {
        let mut buf = Vec::new();
        chunk.encode(&mut buf, chunk.header().endian()).unwrap();
        assert_eq!(buf.len(), chunk.written_size() as usize, "written_size disagrees with encode");
        let mut cursor = Cursor::new(&buf);
        let back = chunk
            .kind()
            .decode(&mut cursor, chunk.header(), buf.len() as u32)
            .unwrap();
        assert_eq!(cursor.position(), buf.len() as u64, "decode did not consume the payload");
        (buf, back)
    }
}
