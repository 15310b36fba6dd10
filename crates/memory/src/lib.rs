//! Memory collaborators for homeclaw.

pub mod document;
pub mod noop;
pub mod in_memory;
pub mod file_backend;

pub use document::{MemoryDocument, MemoryRecord, RecordKind};
pub use noop::NoopMemory;
pub use in_memory::InMemoryMemory;
pub use file_backend::FileMemory;
