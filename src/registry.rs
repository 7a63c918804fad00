//! Chunk registry: exact `(type, version)` → payload variant.
//!
//! # Dispatch rules
//! - Lookup is exact.  There is no version-range matching and no default.
//! - A miss is [`CryError::UnsupportedChunk`] and aborts the whole parse; a
//!   file that is only partially understood cannot be certified.
//! - The version key is the semantic version, i.e. `version_raw` with the
//!   endianness flag masked off.

use crate::chunk_type::ChunkType;
use crate::chunks::ChunkKind;
use crate::error::{CryError, Result};

// ── Registered pairs ────────────────────────────────────────────────────────

/// Every `(type, version)` pair this build can decode and encode.
pub static REGISTRY: &[(ChunkType, u32, ChunkKind)] = &[
    (ChunkType::SOURCE_INFO,                0x000, ChunkKind::SourceInfo),
    (ChunkType::TIMING,                     0x918, ChunkKind::Opaque),
    (ChunkType::MTL_NAME,                   0x800, ChunkKind::Opaque),
    (ChunkType::COMPILED_BONES,             0x800, ChunkKind::CompiledBones),
    (ChunkType::COMPILED_PHYSICAL_BONES,    0x800, ChunkKind::CompiledPhysicalBones),
    (ChunkType::COMPILED_PHYSICAL_PROXIES,  0x800, ChunkKind::Opaque),
    (ChunkType::COMPILED_MORPH_TARGETS,     0x800, ChunkKind::Opaque),
    (ChunkType::COMPILED_INT_SKIN_VERTICES, 0x800, ChunkKind::CompiledIntSkinVertices),
    (ChunkType::COMPILED_INT_FACES,         0x800, ChunkKind::CompiledIntFaces),
    (ChunkType::COMPILED_EXT2INT_MAP,       0x800, ChunkKind::CompiledExt2IntMap),
    (ChunkType::BONES_BOXES,                0x801, ChunkKind::Opaque),
    (ChunkType::EXPORT_FLAGS,               0x001, ChunkKind::ExportFlags),
    (ChunkType::MESH_PHYSICS_DATA,          0x800, ChunkKind::Opaque),
    (ChunkType::MESH_SUBSETS,               0x800, ChunkKind::MeshSubsets),
    (ChunkType::DATA_STREAM,                0x800, ChunkKind::DataStream),
    (ChunkType::MESH,                       0x800, ChunkKind::Opaque),
    (ChunkType::HELPER,                     0x744, ChunkKind::Opaque),
    (ChunkType::NODE,                       0x823, ChunkKind::Node),
    (ChunkType::FOLIAGE_INFO,               0x001, ChunkKind::Opaque),
    (ChunkType::CONTROLLER,                 0x905, ChunkKind::Opaque),
];

// ── Lookup ──────────────────────────────────────────────────────────────────

/// Resolve a `(type, version)` pair to the variant that decodes it.
pub fn lookup(chunk_type: ChunkType, version: u32) -> Result<ChunkKind> {
    REGISTRY
        .iter()
        .find(|(t, v, _)| *t == chunk_type && *v == version)
        .map(|&(_, _, kind)| kind)
        .ok_or(CryError::UnsupportedChunk(chunk_type, version))
}

/// Whether `(type, version)` is registered.
#[inline]
pub fn is_registered(chunk_type: ChunkType, version: u32) -> bool {
    lookup(chunk_type, version).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn registered_pairs_are_unique() {
        let mut seen = HashSet::new();
        for (t, v, _) in REGISTRY {
            assert!(seen.insert((t.0, *v)), "duplicate registry entry {t} {v:#x}");
        }
        assert_eq!(REGISTRY.len(), 20);
    }

    #[test]
    fn exact_match_only() {
        assert_eq!(lookup(ChunkType::NODE, 0x823).unwrap(), ChunkKind::Node);
        assert!(matches!(
            lookup(ChunkType::NODE, 0x824),
            Err(CryError::UnsupportedChunk(ChunkType::NODE, 0x824))
        ));
        assert!(matches!(
            lookup(ChunkType(0x1234_5678), 0x800),
            Err(CryError::UnsupportedChunk(_, 0x800))
        ));
    }

    #[test]
    fn opaque_is_a_registered_kind() {
        assert_eq!(lookup(ChunkType::CONTROLLER, 0x905).unwrap(), ChunkKind::Opaque);
        assert!(is_registered(ChunkType::SOURCE_INFO, 0));
        assert!(!is_registered(ChunkType::CONTROLLER, 0x827));
    }
}
