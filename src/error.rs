//! Error taxonomy for the container codec.
//!
//! Every variant is terminal for the current read/write call.  Nothing here
//! is retried or defaulted: a file that is only partially understood is a
//! failed file.

use std::io;
use thiserror::Error;

use crate::chunk_type::ChunkType;

#[derive(Error, Debug)]
pub enum CryError {
    #[error("Invalid magic: expected {expected}, found {found}")]
    BadMagic { expected: String, found: String },
    #[error("Bad file type: {0:#010x}")]
    BadFileType(u32),
    #[error("Bad file version: {0:#06x}")]
    BadFileVersion(u32),
    /// The stored table offset disagrees with the fixed header layout.
    #[error("Chunk table offset {declared} does not match header layout (position {position})")]
    TableOffsetMismatch { declared: u32, position: u64 },
    #[error("Unsupported chunk: type {0}, version {1:#x}")]
    UnsupportedChunk(ChunkType, u32),
    /// `actual` is what the decoder consumed, or the span available before the
    /// next chunk when the declared extent does not fit.
    #[error("Chunk {id}: declared {expected} bytes, payload spans {actual}")]
    ChunkLengthMismatch { id: u32, expected: u32, actual: u64 },
    #[error("Chunk {0}: written size disagrees with declared size")]
    SizeSymmetryMismatch(u32),
    #[error("Duplicate chunk id {0} in chunk table")]
    DuplicateChunkId(u32),
    #[error("Chunk type {chunk_type} version {version:#x} expects a {expected} payload, got {actual}")]
    ChunkKindMismatch {
        chunk_type: ChunkType,
        version:    u32,
        expected:   &'static str,
        actual:     &'static str,
    },
    /// Stream was not consumed up to its end after the last chunk.
    #[error("File not fully consumed: stopped at {position}, length {length}")]
    TruncatedFile { position: u64, length: u64 },
    /// Internal layout invariant: a chunk did not land on its precomputed offset.
    #[error("Layout mismatch for chunk {id}: expected offset {expected}, writer at {actual}")]
    LayoutMismatch { id: u32, expected: u64, actual: u64 },
    #[error(
        "Round-trip mismatch in bytes {start}..{end}: original {} vs regenerated {}",
        hex::encode(.original),
        hex::encode(.regenerated)
    )]
    RoundTripMismatch {
        start:       usize,
        end:         usize,
        original:    Vec<u8>,
        regenerated: Vec<u8>,
    },
    #[error("Encoding not supported for {0}")]
    EncodeUnsupported(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, CryError>;

/// Build an `InvalidData` I/O error for malformed primitive fields.
pub(crate) fn invalid_data(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}
