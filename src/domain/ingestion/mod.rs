//! Document ingestion domain types

pub mod chunker;

pub use chunker::{Chunk, ChunkingConfig, ChunkingStrategy};
