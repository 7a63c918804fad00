//! Chunk type tags.
//!
//! The tag is an open 32-bit value on disk.  Known tags get a named constant
//! and a diagnostic name; unknown tags still round-trip through the table
//! codec so that the registry can report them precisely.

use serde::{Serialize, Serializer};
use std::fmt;

/// On-disk chunk type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkType(pub u32);

impl ChunkType {
    // ── Geometry ────────────────────────────────────────────────────────────
    pub const MESH:                       ChunkType = ChunkType(0xCCCC_0000);
    pub const HELPER:                     ChunkType = ChunkType(0xCCCC_0001);
    pub const NODE:                       ChunkType = ChunkType(0xCCCC_000B);
    pub const CONTROLLER:                 ChunkType = ChunkType(0xCCCC_000D);
    pub const TIMING:                     ChunkType = ChunkType(0xCCCC_000E);
    pub const SOURCE_INFO:                ChunkType = ChunkType(0xCCCC_0013);
    pub const MTL_NAME:                   ChunkType = ChunkType(0xCCCC_0014);
    pub const EXPORT_FLAGS:               ChunkType = ChunkType(0xCCCC_0015);
    pub const DATA_STREAM:                ChunkType = ChunkType(0xCCCC_0016);
    pub const MESH_SUBSETS:               ChunkType = ChunkType(0xCCCC_0017);
    pub const MESH_PHYSICS_DATA:          ChunkType = ChunkType(0xCCCC_0018);

    // ── Compiled character data ─────────────────────────────────────────────
    pub const COMPILED_BONES:             ChunkType = ChunkType(0xACDC_0000);
    pub const COMPILED_PHYSICAL_BONES:    ChunkType = ChunkType(0xACDC_0001);
    pub const COMPILED_MORPH_TARGETS:     ChunkType = ChunkType(0xACDC_0002);
    pub const COMPILED_PHYSICAL_PROXIES:  ChunkType = ChunkType(0xACDC_0003);
    pub const COMPILED_INT_FACES:         ChunkType = ChunkType(0xACDC_0004);
    pub const COMPILED_INT_SKIN_VERTICES: ChunkType = ChunkType(0xACDC_0005);
    pub const COMPILED_EXT2INT_MAP:       ChunkType = ChunkType(0xACDC_0006);

    // ── Misc ────────────────────────────────────────────────────────────────
    pub const BONES_BOXES:                ChunkType = ChunkType(0xAAFC_0004);
    pub const FOLIAGE_INFO:               ChunkType = ChunkType(0xAAFC_0005);

    /// Human-readable name, for diagnostics only.
    pub fn name(self) -> Option<&'static str> {
        Some(match self {
            ChunkType::MESH                       => "Mesh",
            ChunkType::HELPER                     => "Helper",
            ChunkType::NODE                       => "Node",
            ChunkType::CONTROLLER                 => "Controller",
            ChunkType::TIMING                     => "Timing",
            ChunkType::SOURCE_INFO                => "SourceInfo",
            ChunkType::MTL_NAME                   => "MtlName",
            ChunkType::EXPORT_FLAGS               => "ExportFlags",
            ChunkType::DATA_STREAM                => "DataStream",
            ChunkType::MESH_SUBSETS               => "MeshSubsets",
            ChunkType::MESH_PHYSICS_DATA          => "MeshPhysicsData",
            ChunkType::COMPILED_BONES             => "CompiledBones",
            ChunkType::COMPILED_PHYSICAL_BONES    => "CompiledPhysicalBones",
            ChunkType::COMPILED_MORPH_TARGETS     => "CompiledMorphTargets",
            ChunkType::COMPILED_PHYSICAL_PROXIES  => "CompiledPhysicalProxies",
            ChunkType::COMPILED_INT_FACES         => "CompiledIntFaces",
            ChunkType::COMPILED_INT_SKIN_VERTICES => "CompiledIntSkinVertices",
            ChunkType::COMPILED_EXT2INT_MAP       => "CompiledExt2IntMap",
            ChunkType::BONES_BOXES                => "BonesBoxes",
            ChunkType::FOLIAGE_INFO               => "FoliageInfo",
            _                                     => return None,
        })
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}({:#010x})", self.0),
            None       => write!(f, "{:#010x}", self.0),
        }
    }
}

impl Serialize for ChunkType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
