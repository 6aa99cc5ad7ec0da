//! The four caching strategies, one per resource class.
//!
//! Each strategy maps (request identity, active generation) to a served
//! response with defined side effects on the store:
//!
//! - documents: cache-first with network fallback, then offline document
//! - structured data: network-first with write-through, cache fallback,
//!   synthesized empty collection as the last resort
//! - images: cache-first with background-free refill on miss
//! - everything else: passthrough with cache fallback
//!
//! Network failure is never fatal to the caller except for the passthrough
//! class, whose caching semantics are unknown.

use color_eyre::{eyre::eyre, Result};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::request::RequestIdentity;
use crate::response::{ServedResponse, StoredResponse};
use crate::store::GenerationStore;

/// Strategy layer executing cache policies against one store.
///
/// This layer sits between the request boundary and the network, providing
/// transparent caching with offline support. The fetcher closures follow
/// the same shape everywhere: they resolve to a full response or a
/// transport error, and are only invoked when the strategy decides to go to
/// the network.
pub struct StrategyLayer<S: GenerationStore> {
  store: Arc<S>,
}

impl<S: GenerationStore> StrategyLayer<S> {
  /// Create a strategy layer over the given store.
  pub fn new(store: Arc<S>) -> Self {
    Self { store }
  }

  /// Cache-first with network fallback, for navigational documents.
  ///
  /// 1. Look up the identity in the active generation - hit returns
  ///    immediately without touching the network
  /// 2. On miss, fetch from the network
  /// 3. On network failure, serve the offline fallback document
  ///
  /// Never writes to the store: documents are only populated at install
  /// time from the core manifest. A missing fallback document means install
  /// did not complete and is a fatal configuration error.
  pub async fn document_cache_first<F, Fut>(
    &self,
    generation: &str,
    identity: &RequestIdentity,
    fallback: &RequestIdentity,
    fetcher: F,
  ) -> Result<ServedResponse>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<StoredResponse>>,
  {
    if let Some(cached) = self.store.get(generation, identity)? {
      return Ok(ServedResponse::from_cache(cached));
    }

    match fetcher().await {
      Ok(response) => Ok(ServedResponse::from_network(response)),
      Err(err) => {
        debug!(url = identity.url(), %err, "document fetch failed, serving offline fallback");

        let document = self.store.get(generation, fallback)?.ok_or_else(|| {
          eyre!(
            "Offline fallback {} missing from generation {}: install did not complete",
            fallback.url(),
            generation
          )
        })?;

        Ok(ServedResponse::fallback(document))
      }
    }
  }

  /// Network-first with cache fallback, for structured data.
  ///
  /// Always attempts the network. On success the fresh response is written
  /// through to the store before it is handed back, so a caller holding a
  /// fresh response may rely on the store being updated. On failure the
  /// cached entry is served; with no cached entry the result is a
  /// synthesized empty collection, never an error.
  pub async fn data_network_first<F, Fut>(
    &self,
    generation: &str,
    identity: &RequestIdentity,
    fetcher: F,
  ) -> Result<ServedResponse>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<StoredResponse>>,
  {
    match fetcher().await {
      Ok(fresh) => {
        if fresh.is_success() {
          self.store.put(generation, identity, &fresh)?;
        }
        Ok(ServedResponse::from_network(fresh))
      }
      Err(err) => {
        debug!(url = identity.url(), %err, "data fetch failed, falling back to cache");

        if let Some(cached) = self.store.get(generation, identity)? {
          Ok(ServedResponse::offline(cached))
        } else {
          // "No data available", indistinguishable from an empty catalog
          // on purpose; the source tag is the only marker.
          Ok(ServedResponse::synthesized(
            StoredResponse::empty_collection(),
          ))
        }
      }
    }
  }

  /// Cache-first with refill, for images.
  ///
  /// A hit is served immediately and never triggers a network fetch. A miss
  /// fetches from the network and stores a copy for future lookups; if the
  /// fetch fails the caller gets a plain not-found and nothing is stored.
  pub async fn image_cache_refill<F, Fut>(
    &self,
    generation: &str,
    identity: &RequestIdentity,
    fetcher: F,
  ) -> Result<ServedResponse>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<StoredResponse>>,
  {
    if let Some(cached) = self.store.get(generation, identity)? {
      return Ok(ServedResponse::from_cache(cached));
    }

    match fetcher().await {
      Ok(response) => {
        if response.is_success() {
          self.store.put(generation, identity, &response)?;
        }
        Ok(ServedResponse::from_network(response))
      }
      Err(err) => {
        debug!(url = identity.url(), %err, "image fetch failed, returning not-found");
        Ok(ServedResponse::synthesized(StoredResponse::not_found()))
      }
    }
  }

  /// Passthrough with cache fallback, for everything else.
  ///
  /// Always attempts the network and never stores anything. On failure any
  /// stored entry for the identity is served; with neither, the failure
  /// propagates to the caller.
  pub async fn passthrough<F, Fut>(
    &self,
    generation: &str,
    identity: &RequestIdentity,
    fetcher: F,
  ) -> Result<ServedResponse>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<StoredResponse>>,
  {
    match fetcher().await {
      Ok(response) => Ok(ServedResponse::from_network(response)),
      Err(err) => match self.store.get(generation, identity)? {
        Some(cached) => {
          warn!(url = identity.url(), "network failed, serving cached passthrough entry");
          Ok(ServedResponse::offline(cached))
        }
        None => Err(err),
      },
    }
  }
}

impl<S: GenerationStore> Clone for StrategyLayer<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
    }
  }
}
