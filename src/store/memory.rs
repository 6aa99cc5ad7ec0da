//! In-memory store backend.

use color_eyre::{eyre::eyre, Result};
use std::collections::HashMap;
use std::sync::Mutex;

use super::traits::GenerationStore;
use crate::request::RequestIdentity;
use crate::response::StoredResponse;

/// Store backend that keeps everything in process memory.
///
/// Used in tests and by ephemeral clients that have no persistence; the
/// cache simply starts cold on every launch.
#[derive(Default)]
pub struct MemoryStore {
  generations: Mutex<HashMap<String, HashMap<String, StoredResponse>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl GenerationStore for MemoryStore {
  fn put(
    &self,
    generation: &str,
    identity: &RequestIdentity,
    response: &StoredResponse,
  ) -> Result<()> {
    let mut generations = self
      .generations
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    generations
      .entry(generation.to_string())
      .or_default()
      .insert(identity.cache_hash(), response.clone());

    Ok(())
  }

  fn get(&self, generation: &str, identity: &RequestIdentity) -> Result<Option<StoredResponse>> {
    let generations = self
      .generations
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    Ok(
      generations
        .get(generation)
        .and_then(|entries| entries.get(&identity.cache_hash()))
        .cloned(),
    )
  }

  fn list_generations(&self) -> Result<Vec<String>> {
    let generations = self
      .generations
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    Ok(generations.keys().cloned().collect())
  }

  fn delete_generation(&self, generation: &str) -> Result<()> {
    let mut generations = self
      .generations
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    generations.remove(generation);
    Ok(())
  }
}
