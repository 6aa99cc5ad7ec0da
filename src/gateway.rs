//! Request-boundary facade wiring router, strategies and lifecycle.

use color_eyre::Result;
use std::sync::Arc;
use tracing::debug;

use crate::fetch::Fetch;
use crate::lifecycle::{GenerationState, LifecycleManager};
use crate::manifest::CoreManifest;
use crate::request::OutgoingRequest;
use crate::response::ServedResponse;
use crate::router::{classify, ResourceClass};
use crate::store::GenerationStore;
use crate::strategy::StrategyLayer;

/// Transparent caching proxy for every request the hosting client issues.
///
/// Classifies each intercepted request and dispatches it to the matching
/// strategy against the active generation. The lifecycle side (deploying a
/// new generation) runs through the same gateway but is not on the
/// per-request path.
pub struct CacheGateway<S: GenerationStore, C: Fetch> {
  client: Arc<C>,
  strategies: StrategyLayer<S>,
  lifecycle: LifecycleManager<S>,
  manifest: CoreManifest,
}

impl<S: GenerationStore, C: Fetch> CacheGateway<S, C> {
  /// Create a gateway over the given store, network client and manifest.
  pub fn new(store: Arc<S>, client: C, manifest: CoreManifest) -> Self {
    Self {
      client: Arc::new(client),
      strategies: StrategyLayer::new(Arc::clone(&store)),
      lifecycle: LifecycleManager::new(store),
      manifest,
    }
  }

  /// Install and activate `version` unless it is already active.
  pub async fn deploy(&self, version: &str) -> Result<bool> {
    self
      .lifecycle
      .deploy(version, &self.manifest, self.client.as_ref())
      .await
  }

  /// The currently active generation identifier, if any.
  pub fn active_generation(&self) -> Result<Option<String>> {
    self.lifecycle.active_generation()
  }

  /// The lifecycle state of the newest generation.
  pub fn generation_state(&self) -> Result<GenerationState> {
    self.lifecycle.state()
  }

  /// Handle one intercepted request: classify, then dispatch to the
  /// matching strategy.
  ///
  /// Before the first successful deploy there is no generation to consult,
  /// so requests pass straight through to the network.
  pub async fn handle(&self, request: &OutgoingRequest) -> Result<ServedResponse> {
    let Some(generation) = self.lifecycle.active_generation()? else {
      debug!(url = request.identity.url(), "no active generation, passing through");
      let response = self.client.fetch(&request.identity).await?;
      return Ok(ServedResponse::from_network(response));
    };

    let identity = &request.identity;
    let client = Arc::clone(&self.client);
    let id = identity.clone();
    let fetcher = move || async move { client.fetch(&id).await };

    match classify(request, &self.manifest) {
      ResourceClass::Document => {
        self
          .strategies
          .document_cache_first(&generation, identity, self.manifest.fallback(), fetcher)
          .await
      }
      ResourceClass::Data => {
        self
          .strategies
          .data_network_first(&generation, identity, fetcher)
          .await
      }
      ResourceClass::Image => {
        self
          .strategies
          .image_cache_refill(&generation, identity, fetcher)
          .await
      }
      ResourceClass::Other => {
        self
          .strategies
          .passthrough(&generation, identity, fetcher)
          .await
      }
    }
  }
}
