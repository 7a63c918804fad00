//! Container codec: file header, chunk table and payload region.
//!
//! # Read path
//! 1. Validate the fixed header (magic, file type, file version, table
//!    offset self-check).
//! 2. Read `chunk_count` table entries.
//! 3. Check the declared extents: no payload runs into the next one or past
//!    the end of the stream.
//! 4. For each entry: resolve `(type, version)` in the registry, seek to the
//!    declared offset and decode exactly `size` bytes.
//! 5. Re-walk the entries: every chunk's `written_size` must equal its
//!    declared size.
//! 6. The stream must end exactly where the last chunk ended.
//!
//! # Write path
//! Chunks are laid out in ascending id order.  The first payload starts
//! right after the table; each following payload starts at the previous
//! offset plus the previous size rounded up to 4.  Padding is written before
//! a chunk, never after the last one.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use crate::chunk_type::ChunkType;
use crate::chunks::Chunk;
use crate::endian::{align4, Endian, WriteEndian};
use crate::error::{invalid_data, CryError, Result};
use crate::header::{Dialect, FileHeader, FileType, FileVersion};
use crate::registry;
use crate::table::{ChunkHeader, SummaryEntry, SUMMARY_ENTRY_SIZE};
use crate::verify::{certify_file, CertifyOptions};

// ── Container ────────────────────────────────────────────────────────────────

/// A decoded chunk file: file-level type and version plus every chunk keyed
/// by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub file_type:    FileType,
    pub file_version: FileVersion,
    chunks:           BTreeMap<u32, Chunk>,
}

impl Container {
    pub fn new(file_type: FileType, file_version: FileVersion) -> Self {
        Self { file_type, file_version, chunks: BTreeMap::new() }
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn get(&self, id: u32) -> Option<&Chunk> {
        self.chunks.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Chunk> {
        self.chunks.get_mut(&id)
    }

    /// Chunks in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Chunk)> + '_ {
        self.chunks.iter().map(|(&id, chunk)| (id, chunk))
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.chunks.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Remove a chunk.  Remaining ids are left untouched.
    pub fn remove(&mut self, id: u32) -> Option<Chunk> {
        self.chunks.remove(&id)
    }

    /// Id the next [`add_chunk`](Self::add_chunk) call will assign:
    /// highest existing id plus one, or 1 when empty.
    pub fn next_id(&self) -> u32 {
        self.chunks.keys().next_back().map_or(1, |&max| max.saturating_add(1))
    }

    // ── Building ─────────────────────────────────────────────────────────────

    /// Append `chunk` under a fresh id and stamp its header.
    ///
    /// `(chunk_type, version)` must be registered and must decode to the
    /// variant of `chunk`.
    pub fn add_chunk(
        &mut self,
        chunk_type: ChunkType,
        version:    u32,
        endian:     Endian,
        chunk:      impl Into<Chunk>,
    ) -> Result<u32> {
        let mut chunk = chunk.into();
        let kind = registry::lookup(chunk_type, version)?;
        if chunk.kind() != kind {
            return Err(CryError::ChunkKindMismatch {
                chunk_type,
                version,
                expected: kind.name(),
                actual:   chunk.kind().name(),
            });
        }

        let id = self.next_id();
        if self.chunks.contains_key(&id) {
            return Err(CryError::DuplicateChunkId(id));
        }
        *chunk.header_mut() = ChunkHeader::new(chunk_type, version, endian, id);
        self.chunks.insert(id, chunk);
        Ok(id)
    }

    pub fn add_chunk_le(&mut self, chunk_type: ChunkType, version: u32, chunk: impl Into<Chunk>) -> Result<u32> {
        self.add_chunk(chunk_type, version, Endian::Little, chunk)
    }

    pub fn add_chunk_be(&mut self, chunk_type: ChunkType, version: u32, chunk: impl Into<Chunk>) -> Result<u32> {
        self.add_chunk(chunk_type, version, Endian::Big, chunk)
    }

    // ── Layout ───────────────────────────────────────────────────────────────

    /// Table entries the next write will produce, in id order.
    pub fn layout(&self, dialect: Dialect) -> Result<Vec<SummaryEntry>> {
        let count = self.chunks.len() as u64;
        let mut offset = dialect.header_size() as u64 + count * SUMMARY_ENTRY_SIZE as u64;
        let mut entries = Vec::with_capacity(self.chunks.len());

        for (&id, chunk) in &self.chunks {
            let size = chunk.written_size();
            let mut header = *chunk.header();
            header.id = id;
            header.offset = u32::try_from(offset)
                .map_err(|_| invalid_data(format!("chunk {id} offset {offset} exceeds 32 bits")))?;
            entries.push(SummaryEntry { header, size });
            offset += align4(size as u64);
        }
        Ok(entries)
    }

    // ── Read ─────────────────────────────────────────────────────────────────

    /// Decode a container starting at the reader's current position.
    pub fn read_from<R: Read + Seek>(reader: &mut R, dialect: Dialect) -> Result<Self> {
        let base = reader.stream_position()?;
        let header = FileHeader::read(reader, dialect, base)?;
        debug!(
            "header: {:?} {:?}, {} chunks",
            header.file_type, header.file_version, header.chunk_count
        );

        let entries = (0..header.chunk_count)
            .map(|_| SummaryEntry::read(&mut *reader))
            .collect::<std::io::Result<Vec<_>>>()?;

        let mut end = reader.stream_position()? - base;
        let length = reader.seek(SeekFrom::End(0))? - base;
        check_extents(&entries, length)?;

        let mut chunks = BTreeMap::new();

        for entry in &entries {
            let table = entry.header;
            let kind = registry::lookup(table.chunk_type, table.version())?;

            let start = base + table.offset as u64;
            reader.seek(SeekFrom::Start(start))?;
            let chunk = kind.decode(reader, &table, entry.size)?;
            let position = reader.stream_position()?;

            let consumed = position - start;
            if consumed != entry.size as u64 {
                return Err(CryError::ChunkLengthMismatch {
                    id:       table.id,
                    expected: entry.size,
                    actual:   consumed,
                });
            }
            debug!("decoded {table} as {} ({} bytes)", kind.name(), entry.size);

            if chunks.insert(table.id, chunk).is_some() {
                return Err(CryError::DuplicateChunkId(table.id));
            }
            end = position - base;
        }

        check_declared_sizes(&entries, &chunks)?;

        if end != length {
            return Err(CryError::TruncatedFile { position: end, length });
        }

        Ok(Self { file_type: header.file_type, file_version: header.file_version, chunks })
    }

    /// Plain decode of an in-memory file, without round-trip certification.
    pub fn from_bytes_unchecked(bytes: &[u8], dialect: Dialect) -> Result<Self> {
        Self::read_from(&mut Cursor::new(bytes), dialect)
    }

    /// Read and certify a file.
    pub fn open<P: AsRef<Path>>(path: P, dialect: Dialect) -> Result<Self> {
        let options = CertifyOptions { dialect, ..CertifyOptions::default() };
        let (container, _) = certify_file(path, &options)?;
        Ok(container)
    }

    // ── Write ────────────────────────────────────────────────────────────────

    /// Encode the container at the writer's current position.
    ///
    /// Every chunk header's `offset` and `id` are refreshed to the computed
    /// layout before anything is written.
    pub fn write_to<W: Write + Seek>(&mut self, writer: &mut W, dialect: Dialect) -> Result<()> {
        let entries = self.layout(dialect)?;
        for entry in &entries {
            if let Some(chunk) = self.chunks.get_mut(&entry.header.id) {
                let header = chunk.header_mut();
                header.offset = entry.header.offset;
                header.id = entry.header.id;
            }
        }

        let base = writer.stream_position()?;
        FileHeader {
            dialect,
            file_type:    self.file_type,
            file_version: self.file_version,
            chunk_count:  entries.len() as u32,
        }
        .write(&mut *writer)?;
        for entry in &entries {
            entry.write(writer)?;
        }

        for (entry, chunk) in entries.iter().zip(self.chunks.values()) {
            let id = entry.header.id;
            let position = writer.stream_position()? - base;
            writer.write_zeroes((align4(position) - position) as usize)?;

            let start = align4(position);
            if start != entry.header.offset as u64 {
                return Err(CryError::LayoutMismatch { id, expected: entry.header.offset as u64, actual: start });
            }

            chunk.encode(writer, chunk.header().endian())?;
            let written = writer.stream_position()? - base - start;
            if written != entry.size as u64 {
                return Err(CryError::SizeSymmetryMismatch(id));
            }
            debug!("encoded {} as {} ({} bytes)", entry.header, chunk.kind().name(), entry.size);
        }
        Ok(())
    }

    /// Canonical encoding as a fresh buffer.
    pub fn to_bytes(&mut self, dialect: Dialect) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(&mut cursor, dialect)?;
        Ok(cursor.into_inner())
    }

    pub fn save<P: AsRef<Path>>(&mut self, path: P, dialect: Dialect) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer, dialect)?;
        writer.flush()?;
        Ok(())
    }
}

// ── Table checks ─────────────────────────────────────────────────────────────

/// Declared extents, in offset order.  A payload may not run into the next
/// one or past the end of the stream.  Variants sized only by the table must
/// also end where the layout puts the next chunk: inside its alignment slot,
/// or at the end of the stream for the last chunk.
fn check_extents(entries: &[SummaryEntry], length: u64) -> Result<()> {
    let mut by_offset: Vec<&SummaryEntry> = entries.iter().collect();
    by_offset.sort_by_key(|e| (e.header.offset, e.header.id));

    for (i, entry) in by_offset.iter().enumerate() {
        let table = entry.header;
        let kind = registry::lookup(table.chunk_type, table.version())?;

        let start = table.offset as u64;
        let end = start + entry.size as u64;
        let next = by_offset.get(i + 1).map(|n| n.header.offset as u64);
        let limit = next.unwrap_or(length).min(length);

        let fits = if end > limit {
            false
        } else if !kind.sized_by_table() {
            true
        } else {
            match next {
                Some(next) => align4(end) == next,
                None       => end == length,
            }
        };
        if !fits {
            return Err(CryError::ChunkLengthMismatch {
                id:       table.id,
                expected: entry.size,
                actual:   limit.saturating_sub(start),
            });
        }
    }
    Ok(())
}

/// Every decoded chunk must report the size its table entry declared.  The
/// registered decoders consume exactly `written_size` bytes, so this only
/// trips when a decoder and its encoder drift apart.
fn check_declared_sizes(entries: &[SummaryEntry], chunks: &BTreeMap<u32, Chunk>) -> Result<()> {
    for entry in entries {
        let written = chunks.get(&entry.header.id).map(Chunk::written_size);
        if written != Some(entry.size) {
            return Err(CryError::SizeSymmetryMismatch(entry.header.id));
        }
    }
    Ok(())
}
