//! Round-trip certification.
//!
//! A parse is trusted only if re-encoding the decoded container reproduces
//! the input byte for byte, except inside an explicit list of ignore zones:
//!
//! | zone                         | reason                                        |
//! |------------------------------|-----------------------------------------------|
//! | pad byte after `CryTek\0`    | arbitrary on disk, written as 0               |
//! | 31..32 and 51..52            | endianness flag byte of the first two table entries |
//! | whole `MeshSubsets` payload  | stale bone id slots left by upstream writers  |
//! | `SourceInfo` bytes 8..12     | size field authored inconsistently upstream   |
//! | caller supplied ranges       | per-fixture exceptions                        |
//!
//! Any other difference, or a length difference, is a [`RoundTripMismatch`].
//!
//! [`RoundTripMismatch`]: crate::CryError::RoundTripMismatch

use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::chunks::ChunkKind;
use crate::container::Container;
use crate::error::{CryError, Result};
use crate::header::Dialect;

/// Bytes of each side carried by a mismatch error.
const MISMATCH_CONTEXT: usize = 16;

/// Fixed legacy zones in the chunk table.
const LEGACY_TABLE_BYTES: [Range<usize>; 2] = [31..32, 51..52];

// ── Options ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertifyOptions {
    pub dialect:      Dialect,
    /// Tolerate the two legacy table bytes.
    pub legacy_zones: bool,
    /// Additional absolute ranges to tolerate.
    pub extra_zones:  Vec<Range<usize>>,
}

impl Default for CertifyOptions {
    fn default() -> Self {
        Self {
            dialect:      Dialect::default(),
            legacy_zones: true,
            extra_zones:  Vec::new(),
        }
    }
}

// ── Zones ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ZoneReason {
    MagicPadding,
    LegacyTableByte,
    StaleArraySlots { chunk_id: u32 },
    InconsistentSizeField { chunk_id: u32 },
    Caller,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IgnoreZone {
    pub range:  Range<usize>,
    pub reason: ZoneReason,
}

impl IgnoreZone {
    #[inline]
    fn covers(&self, pos: usize) -> bool {
        self.range.contains(&pos)
    }
}

/// Every zone that applies to `container` once it has been laid out.
pub fn ignore_zones(container: &Container, options: &CertifyOptions) -> Vec<IgnoreZone> {
    let mut zones = Vec::new();

    if let Some(pad) = options.dialect.pad_byte_offset() {
        zones.push(IgnoreZone { range: pad..pad + 1, reason: ZoneReason::MagicPadding });
    }
    if options.legacy_zones {
        for range in LEGACY_TABLE_BYTES {
            zones.push(IgnoreZone { range, reason: ZoneReason::LegacyTableByte });
        }
    }

    for (id, chunk) in container.iter() {
        let offset = chunk.header().offset as usize;
        for range in chunk.ignore_ranges() {
            let reason = match chunk.kind() {
                ChunkKind::MeshSubsets => ZoneReason::StaleArraySlots { chunk_id: id },
                _                      => ZoneReason::InconsistentSizeField { chunk_id: id },
            };
            zones.push(IgnoreZone {
                range: offset + range.start as usize..offset + range.end as usize,
                reason,
            });
        }
    }

    for range in &options.extra_zones {
        zones.push(IgnoreZone { range: range.clone(), reason: ZoneReason::Caller });
    }
    zones
}

// ── Report ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertifyReport {
    pub original_len:    usize,
    pub regenerated_len: usize,
    pub zones:           Vec<IgnoreZone>,
    /// Differing bytes that fell inside a zone.
    pub tolerated_bytes: usize,
}

// ── Certification ────────────────────────────────────────────────────────────

/// Decode `bytes`, re-encode the result and compare.
///
/// Returns the decoded container only if the comparison passes.
pub fn certify(bytes: &[u8], options: &CertifyOptions) -> Result<(Container, CertifyReport)> {
    let mut container = Container::from_bytes_unchecked(bytes, options.dialect)?;
    let regenerated = container.to_bytes(options.dialect)?;
    let zones = ignore_zones(&container, options);

    let tolerated_bytes = compare(bytes, &regenerated, &zones)?;
    if tolerated_bytes > 0 {
        debug!("tolerated {tolerated_bytes} differing bytes inside {} ignore zones", zones.len());
    }

    let report = CertifyReport {
        original_len: bytes.len(),
        regenerated_len: regenerated.len(),
        zones,
        tolerated_bytes,
    };
    Ok((container, report))
}

/// Compare over the common length, then require equal lengths.  Returns the
/// number of tolerated differing bytes.
fn compare(original: &[u8], regenerated: &[u8], zones: &[IgnoreZone]) -> Result<usize> {
    let common = original.len().min(regenerated.len());
    let tolerated = |pos: usize| zones.iter().any(|z| z.covers(pos));

    let mut count = 0;
    for pos in 0..common {
        if original[pos] == regenerated[pos] {
            continue;
        }
        if tolerated(pos) {
            count += 1;
            continue;
        }
        let end = (pos..common)
            .find(|&i| original[i] == regenerated[i] || tolerated(i))
            .unwrap_or(common);
        return Err(mismatch(original, regenerated, pos, end));
    }

    if original.len() != regenerated.len() {
        let end = original.len().max(regenerated.len());
        return Err(mismatch(original, regenerated, common, end));
    }
    Ok(count)
}

fn mismatch(original: &[u8], regenerated: &[u8], start: usize, end: usize) -> CryError {
    let context = |side: &[u8]| {
        let from = start.min(side.len());
        let to = end.min(side.len()).min(start + MISMATCH_CONTEXT).max(from);
        side[from..to].to_vec()
    };
    CryError::RoundTripMismatch {
        start,
        end,
        original:    context(original),
        regenerated: context(regenerated),
    }
}

/// Certify a file on disk.
pub fn certify_file<P: AsRef<Path>>(path: P, options: &CertifyOptions) -> Result<(Container, CertifyReport)> {
    let bytes = fs::read(path)?;
    certify(&bytes, options)
}

/// Certify independent files.  Results are returned in input order.
pub fn certify_files<P>(paths: &[P], options: &CertifyOptions) -> Vec<(PathBuf, Result<CertifyReport>)>
where
    P: AsRef<Path> + Sync,
{
    let run = |path: &P| {
        let path = path.as_ref();
        let result = certify_file(path, options).map(|(_, report)| report);
        (path.to_path_buf(), result)
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        paths.par_iter().map(run).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        paths.iter().map(run).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::{MeshSubset, MeshSubsetsChunk, OpaqueChunk, SourceInfoChunk};
    use crate::endian::Endian;
    use crate::header::{FileType, FileVersion};
    use crate::table::ChunkHeader;
    use crate::ChunkType;

    fn sample() -> Container {
        let mut c = Container::new(FileType::Geometry, FileVersion::V0745);
        let info = SourceInfoChunk {
            header: ChunkHeader::new(ChunkType::SOURCE_INFO, 0, Endian::Little, 0),
            body:   b"hero.max\0\0\0\0user\0\0".to_vec(),
        };
        c.add_chunk_le(ChunkType::SOURCE_INFO, 0, info).unwrap();
        let subsets = MeshSubsetsChunk {
            header:   ChunkHeader::new(ChunkType::MESH_SUBSETS, 0x800, Endian::Little, 0),
            flags:    0x2,
            reserved: [0, 0],
            subsets:  vec![MeshSubset { index_count: 3, bone_ids: vec![1], ..MeshSubset::default() }],
        };
        c.add_chunk_le(ChunkType::MESH_SUBSETS, 0x800, subsets).unwrap();
        let mesh = OpaqueChunk::new(ChunkHeader::new(ChunkType::MESH, 0x800, Endian::Little, 0), vec![7; 12]);
        c.add_chunk_le(ChunkType::MESH, 0x800, mesh).unwrap();
        c
    }

    #[test]
    fn canonical_bytes_certify_cleanly() {
        let bytes = sample().to_bytes(Dialect::Padded).unwrap();
        let (container, report) = certify(&bytes, &CertifyOptions::default()).unwrap();
        assert_eq!(container.len(), 3);
        assert_eq!(report.tolerated_bytes, 0);
        assert_eq!(report.original_len, report.regenerated_len);
        assert!(report.zones.iter().any(|z| z.reason == ZoneReason::StaleArraySlots { chunk_id: 2 }));
    }

    #[test]
    fn pad_byte_is_tolerated() {
        let mut c = sample();
        let mut bytes = c.to_bytes(Dialect::Padded).unwrap();
        bytes[7] = 0x5A;

        let (_, report) = certify(&bytes, &CertifyOptions::default()).unwrap();
        assert_eq!(report.tolerated_bytes, 1);

        let info = c.get(1).unwrap().header().offset as usize;
        assert!(report.zones.contains(&IgnoreZone {
            range:  info + 8..info + 12,
            reason: ZoneReason::InconsistentSizeField { chunk_id: 1 },
        }));
    }

    #[test]
    fn stale_subset_slots_are_tolerated() {
        let mut c = sample();
        let mut bytes = c.to_bytes(Dialect::Padded).unwrap();
        let subsets = c.get(2).unwrap().header().offset as usize;
        // unused bone id slot of the only subset
        bytes[subsets + 16 + 16 + 36 + 4 + 40] = 0xCC;

        assert!(certify(&bytes, &CertifyOptions::default()).is_ok());
    }

    #[test]
    fn difference_outside_zones_is_fatal() {
        let mut c = sample();
        let mut bytes = c.to_bytes(Dialect::Padded).unwrap();
        // last padding byte in front of the subsets chunk
        let garbage = c.get(2).unwrap().header().offset as usize - 1;
        bytes[garbage] = 0xEE;

        match certify(&bytes, &CertifyOptions::default()) {
            Err(CryError::RoundTripMismatch { start, end, original, regenerated }) => {
                assert_eq!((start, end), (garbage, garbage + 1));
                assert_eq!(original, vec![0xEE]);
                assert_eq!(regenerated, vec![0x00]);
            }
            other => panic!("expected RoundTripMismatch, got {other:?}"),
        }

        let options = CertifyOptions { extra_zones: vec![garbage..garbage + 1], ..Default::default() };
        let (_, report) = certify(&bytes, &options).unwrap();
        assert_eq!(report.tolerated_bytes, 1);
    }

    #[test]
    fn legacy_table_bytes_need_legacy_zones() {
        let mut c = sample();
        let mut bytes = c.to_bytes(Dialect::Padded).unwrap();
        bytes[51] ^= 0x80;
        // The subsets payload keeps its own header copy, which the table
        // entry is rewritten from.
        assert!(certify(&bytes, &CertifyOptions::default()).is_ok());

        let strict = CertifyOptions { legacy_zones: false, ..Default::default() };
        assert!(matches!(certify(&bytes, &strict), Err(CryError::RoundTripMismatch { start: 51, .. })));
    }

    #[test]
    fn length_difference_is_fatal() {
        let original = [1u8, 2, 3, 4];
        let regenerated = [1u8, 2, 3];
        assert!(matches!(
            compare(&original, &regenerated, &[]),
            Err(CryError::RoundTripMismatch { start: 3, end: 4, .. })
        ));
    }
}
