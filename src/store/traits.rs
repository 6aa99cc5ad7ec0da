//! Storage trait for generation-partitioned response caching.

use color_eyre::Result;

use crate::request::RequestIdentity;
use crate::response::StoredResponse;

/// Trait for versioned object store backends.
///
/// A concurrent `get` during a `put` for the same identity observes either
/// the old or the new value, never a corrupted mix.
pub trait GenerationStore: Send + Sync {
  /// Store a response under (generation, identity), overwriting any
  /// existing entry.
  fn put(
    &self,
    generation: &str,
    identity: &RequestIdentity,
    response: &StoredResponse,
  ) -> Result<()>;

  /// Look up the stored response for (generation, identity).
  fn get(&self, generation: &str, identity: &RequestIdentity) -> Result<Option<StoredResponse>>;

  /// All known generation identifiers.
  fn list_generations(&self) -> Result<Vec<String>>;

  /// Remove a generation and all its entries. Atomic from the caller's
  /// perspective: no partial deletes are observable.
  fn delete_generation(&self, generation: &str) -> Result<()>;
}
