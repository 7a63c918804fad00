pub mod chunk_type;
pub mod chunks;
pub mod container;
pub mod endian;
pub mod error;
pub mod header;
pub mod registry;
pub mod table;
pub mod verify;

pub use chunk_type::ChunkType;
pub use chunks::{Chunk, ChunkKind, ChunkPayload};
pub use container::Container;
pub use endian::Endian;
pub use error::{CryError, Result};
pub use header::{Dialect, FileHeader, FileType, FileVersion};
pub use table::{ChunkHeader, SummaryEntry};
pub use verify::{certify, certify_file, certify_files, CertifyOptions, CertifyReport, IgnoreZone, ZoneReason};
