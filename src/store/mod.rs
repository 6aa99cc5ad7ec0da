//! Versioned object store: generation-partitioned response storage.
//!
//! The store maps (generation, request identity) to a stored response.
//! Generations are atomically replaceable partitions; strategies and the
//! lifecycle manager share one store instance without extra coordination
//! because the only mutation points are idempotent (`put` overwrites,
//! `delete_generation` only ever targets non-active generations).

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::GenerationStore;
