use crychunks::chunks::{
    CompiledBone, CompiledBonesChunk, CompiledIntFacesChunk, DataStreamChunk, MeshSubset,
    MeshSubsetsChunk, NodeChunk, OpaqueChunk, SourceInfoChunk, FLAG_BONE_INDICES, FLAG_TEXEL_DENSITY,
};
use crychunks::{
    certify, certify_files, ChunkHeader, ChunkType, CertifyOptions, Container, CryError, Dialect,
    Endian, FileType, FileVersion,
};
use tempfile::{tempdir, NamedTempFile};

fn header(chunk_type: ChunkType, version: u32) -> ChunkHeader {
    ChunkHeader::new(chunk_type, version, Endian::Little, 0)
}

fn node(name: &str) -> NodeChunk {
    NodeChunk { name: name.into(), properties: "lod=0".into(), ..NodeChunk::default() }
}

/// One chunk of most variants, mixed byte orders.
fn character() -> Container {
    let mut c = Container::new(FileType::Geometry, FileVersion::V0745);
    c.add_chunk_le(
        ChunkType::SOURCE_INFO,
        0,
        SourceInfoChunk { header: header(ChunkType::SOURCE_INFO, 0), body: b"hero.max\0\0\0".to_vec() },
    )
    .unwrap();
    c.add_chunk_be(
        ChunkType::COMPILED_BONES,
        0x800,
        CompiledBonesChunk {
            header: header(ChunkType::COMPILED_BONES, 0x800),
            bones:  vec![CompiledBone { name: "Bip01".into(), mass: 1.0, ..CompiledBone::default() }],
        },
    )
    .unwrap();
    c.add_chunk_be(
        ChunkType::MESH_SUBSETS,
        0x800,
        MeshSubsetsChunk {
            header:   header(ChunkType::MESH_SUBSETS, 0x800),
            flags:    FLAG_BONE_INDICES | FLAG_TEXEL_DENSITY,
            reserved: [0, 0],
            subsets:  vec![MeshSubset { index_count: 3, vertex_count: 3, bone_ids: vec![0], ..MeshSubset::default() }],
        },
    )
    .unwrap();
    c.add_chunk_be(
        ChunkType::DATA_STREAM,
        0x800,
        DataStreamChunk {
            header:       header(ChunkType::DATA_STREAM, 0x800),
            flags:        0,
            stream_type:  5,
            count:        3,
            element_size: 2,
            reserved:     [0, 0],
            data:         vec![0, 0, 0, 1, 0, 2],
            data_endian:  Endian::Big,
        },
    )
    .unwrap();
    c.add_chunk_le(
        ChunkType::COMPILED_INT_FACES,
        0x800,
        CompiledIntFacesChunk { header: header(ChunkType::COMPILED_INT_FACES, 0x800), faces: vec![[0, 1, 2]] },
    )
    .unwrap();
    c.add_chunk_le(ChunkType::NODE, 0x823, node("hero")).unwrap();
    c.add_chunk_le(ChunkType::MTL_NAME, 0x800, OpaqueChunk::new(header(ChunkType::MTL_NAME, 0x800), vec![3; 7]))
        .unwrap();
    c
}

#[test]
fn test_two_chunk_layout() {
    let mut c = Container::new(FileType::Geometry, FileVersion::V0745);
    let first = c
        .add_chunk_le(ChunkType::MESH, 0x800, OpaqueChunk::new(header(ChunkType::MESH, 0x800), Vec::new()))
        .unwrap();
    let second = c
        .add_chunk_le(
            ChunkType::SOURCE_INFO,
            0,
            SourceInfoChunk { header: header(ChunkType::SOURCE_INFO, 0), body: b"0123456789".to_vec() },
        )
        .unwrap();
    assert_eq!((first, second), (1, 2));

    let bytes = c.to_bytes(Dialect::Padded).unwrap();
    let entries = c.layout(Dialect::Padded).unwrap();
    assert_eq!(entries[0].header.offset, 24 + 2 * 20);
    assert_eq!(entries[1].header.offset, 64 + 16);
    assert_eq!((entries[0].size, entries[1].size), (16, 10));
    assert_eq!(bytes.len(), 80 + 10);

    let back = Container::from_bytes_unchecked(&bytes, Dialect::Padded).unwrap();
    assert_eq!(back.ids().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(back.get(1).unwrap().written_size(), 16);
    assert_eq!(back.get(2).unwrap().written_size(), 10);
    assert_eq!(back, c);
}

#[test]
fn test_empty_container_is_bare_header() {
    for dialect in [Dialect::Padded, Dialect::Exact] {
        let mut c = Container::new(FileType::Animation, FileVersion::V0744);
        let bytes = c.to_bytes(dialect).unwrap();
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[16..20], &20u32.to_le_bytes());
        assert_eq!(&bytes[20..24], &0u32.to_le_bytes());

        let back = Container::from_bytes_unchecked(&bytes, dialect).unwrap();
        assert!(back.is_empty());
        assert_eq!(back.file_type, FileType::Animation);
    }
}

#[test]
fn test_mixed_container_certifies() {
    let mut c = character();
    let bytes = c.to_bytes(Dialect::Padded).unwrap();
    let (decoded, report) = certify(&bytes, &CertifyOptions::default()).unwrap();
    assert_eq!(decoded, c);
    assert_eq!(report.tolerated_bytes, 0);

    // idempotent: a second pass reproduces the same bytes
    let mut again = decoded.clone();
    assert_eq!(again.to_bytes(Dialect::Padded).unwrap(), bytes);
}

#[test]
fn test_unregistered_pair_fails() {
    let mut c = Container::new(FileType::Geometry, FileVersion::V0745);
    c.add_chunk_le(ChunkType::NODE, 0x823, node("root")).unwrap();
    let mut bytes = c.to_bytes(Dialect::Padded).unwrap();
    // version_raw of the only table entry
    bytes[28..32].copy_from_slice(&0x824u32.to_le_bytes());

    match Container::from_bytes_unchecked(&bytes, Dialect::Padded) {
        Err(CryError::UnsupportedChunk(t, v)) => {
            assert_eq!(t, ChunkType::NODE);
            assert_eq!(v, 0x824);
        }
        other => panic!("expected UnsupportedChunk, got {other:?}"),
    }
}

/// Every chunk of `c`, declared one byte short or long, must be rejected.
fn assert_off_by_one_rejected(mut c: Container) {
    let bytes = c.to_bytes(Dialect::Padded).unwrap();
    let entries = c.layout(Dialect::Padded).unwrap();

    for (index, entry) in entries.iter().enumerate() {
        let size_field = 24 + index * 20 + 16;
        for declared in [entry.size - 1, entry.size + 1] {
            let mut patched = bytes.clone();
            patched[size_field..size_field + 4].copy_from_slice(&declared.to_le_bytes());
            match Container::from_bytes_unchecked(&patched, Dialect::Padded) {
                Err(CryError::ChunkLengthMismatch { id, expected, .. }) => {
                    assert_eq!(id, entry.header.id);
                    assert_eq!(expected, declared);
                }
                other => panic!("chunk {} declared {declared}: got {other:?}", entry.header.id),
            }
        }
    }
}

#[test]
fn test_declared_size_off_by_one() {
    let mut c = Container::new(FileType::Geometry, FileVersion::V0745);
    c.add_chunk_le(ChunkType::NODE, 0x823, node("root")).unwrap();
    c.add_chunk_le(
        ChunkType::COMPILED_INT_FACES,
        0x800,
        CompiledIntFacesChunk { header: header(ChunkType::COMPILED_INT_FACES, 0x800), faces: vec![[0, 1, 2]; 4] },
    )
    .unwrap();
    assert_off_by_one_rejected(c);
}

#[test]
fn test_declared_size_off_by_one_for_table_sized_bodies() {
    let mut c = Container::new(FileType::Geometry, FileVersion::V0745);
    c.add_chunk_le(ChunkType::MESH, 0x800, OpaqueChunk::new(header(ChunkType::MESH, 0x800), Vec::new()))
        .unwrap();
    c.add_chunk_le(
        ChunkType::SOURCE_INFO,
        0,
        SourceInfoChunk { header: header(ChunkType::SOURCE_INFO, 0), body: b"0123456789".to_vec() },
    )
    .unwrap();
    assert_off_by_one_rejected(c);
}

#[test]
fn test_bad_magic_and_pad_byte() {
    let mut c = character();
    let mut bytes = c.to_bytes(Dialect::Padded).unwrap();
    bytes[7] = 0x11;
    assert!(Container::from_bytes_unchecked(&bytes, Dialect::Padded).is_ok());
    assert!(matches!(
        Container::from_bytes_unchecked(&bytes, Dialect::Exact),
        Err(CryError::BadMagic { .. })
    ));

    bytes[5] = b'X';
    assert!(matches!(
        Container::from_bytes_unchecked(&bytes, Dialect::Padded),
        Err(CryError::BadMagic { .. })
    ));
}

#[test]
fn test_truncated_payload_is_an_error() {
    let mut c = character();
    let bytes = c.to_bytes(Dialect::Padded).unwrap();
    let cut = &bytes[..bytes.len() - 3];
    assert!(Container::from_bytes_unchecked(cut, Dialect::Padded).is_err());
}

#[test]
fn test_save_and_open() {
    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path().to_path_buf();

    let mut c = character();
    c.save(&path, Dialect::Exact).unwrap();
    let opened = Container::open(&path, Dialect::Exact).unwrap();
    assert_eq!(opened, c);
    assert_eq!(std::fs::read(&path).unwrap(), c.to_bytes(Dialect::Exact).unwrap());
}

#[test]
fn test_certify_files_keeps_input_order() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good.chr");
    let bad = dir.path().join("bad.chr");

    let mut c = character();
    c.save(&good, Dialect::Padded).unwrap();
    let mut bytes = c.to_bytes(Dialect::Padded).unwrap();
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    std::fs::write(&bad, &bytes).unwrap();

    let results = certify_files(&[good.clone(), bad.clone()], &CertifyOptions::default());
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, good);
    assert!(results[0].1.is_ok());
    assert_eq!(results[1].0, bad);
    // trailing bytes after a table-sized payload are charged to that chunk
    assert!(matches!(results[1].1, Err(CryError::ChunkLengthMismatch { id: 7, expected: 23, actual: 27 })));
}
