//! Generation lifecycle: install, activate, and stale-generation cleanup.

use color_eyre::{eyre::eyre, Result};
use futures::future;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

use crate::fetch::Fetch;
use crate::manifest::CoreManifest;
use crate::request::RequestIdentity;
use crate::response::StoredResponse;
use crate::store::GenerationStore;

/// Observable lifecycle state of the newest generation.
///
/// Superseded generations are only observable as absence from
/// `list_generations`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
  /// No generation has been installed yet
  Idle,
  /// A new generation is being populated with the core manifest
  Installing,
  /// Install succeeded; the generation awaits immediate promotion
  Waiting,
  /// The generation serves all requests
  Active,
}

struct LifecycleInner {
  active: Option<String>,
  state: GenerationState,
}

/// Governs install/activate transitions against a shared store.
///
/// Installation of a new generation never mutates the currently active one,
/// so in-flight reads are never disturbed by a concurrent install of their
/// successor.
pub struct LifecycleManager<S: GenerationStore> {
  store: Arc<S>,
  inner: Mutex<LifecycleInner>,
}

impl<S: GenerationStore> LifecycleManager<S> {
  /// Create a lifecycle manager over the given store.
  pub fn new(store: Arc<S>) -> Self {
    Self {
      store,
      inner: Mutex::new(LifecycleInner {
        active: None,
        state: GenerationState::Idle,
      }),
    }
  }

  fn lock_inner(&self) -> Result<MutexGuard<'_, LifecycleInner>> {
    self.inner.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }

  /// The currently active generation identifier, if any.
  pub fn active_generation(&self) -> Result<Option<String>> {
    Ok(self.lock_inner()?.active.clone())
  }

  /// The lifecycle state of the newest generation.
  pub fn state(&self) -> Result<GenerationState> {
    Ok(self.lock_inner()?.state)
  }

  /// Install a new generation: fetch and store every core manifest entry.
  ///
  /// All-or-nothing: if any entry fails to fetch (or comes back with a
  /// non-success status), the whole install is aborted, the partial
  /// generation is removed, and the previously active generation (if any)
  /// continues serving untouched. Installing the active version is refused
  /// outright: install never mutates the generation that is serving. On
  /// success the generation is `Waiting` and requests immediate promotion.
  pub async fn install<C: Fetch>(
    &self,
    version: &str,
    manifest: &CoreManifest,
    client: &C,
  ) -> Result<()> {
    let previous_state = {
      let mut inner = self.lock_inner()?;
      if inner.active.as_deref() == Some(version) {
        return Err(eyre!(
          "Generation {} is already active; bump the version token to redeploy",
          version
        ));
      }
      let previous = inner.state;
      inner.state = GenerationState::Installing;
      previous
    };

    info!(generation = version, "installing new generation");

    match self.populate(version, manifest, client).await {
      Ok(()) => {
        self.lock_inner()?.state = GenerationState::Waiting;
        info!(generation = version, "install complete, requesting promotion");
        Ok(())
      }
      Err(err) => {
        // Leave no partial generation behind
        if let Err(cleanup) = self.store.delete_generation(version) {
          warn!(generation = version, %cleanup, "failed to remove partial generation");
        }
        self.lock_inner()?.state = previous_state;
        Err(err.wrap_err(format!("Install of generation {} failed", version)))
      }
    }
  }

  async fn populate<C: Fetch>(
    &self,
    version: &str,
    manifest: &CoreManifest,
    client: &C,
  ) -> Result<()> {
    // Fetch everything first; store writes only happen once every fetch
    // has fully resolved.
    let fetches = manifest.entries().iter().map(|identity| async move {
      let response = client.fetch(identity).await?;
      if !response.is_success() {
        return Err(eyre!(
          "Manifest entry {} returned status {}",
          identity.url(),
          response.status
        ));
      }
      Ok::<(&RequestIdentity, StoredResponse), color_eyre::Report>((identity, response))
    });

    let fetched = future::try_join_all(fetches).await?;

    for (identity, response) in &fetched {
      self.store.put(version, identity, response)?;
    }

    Ok(())
  }

  /// Activate an installed generation.
  ///
  /// Deletes every generation whose identifier differs from `version`, then
  /// marks `version` active. Takes effect for all subsequent requests
  /// immediately; no stale generation continues serving. The version must
  /// name an installed generation: a mistyped token would otherwise delete
  /// every real generation and promote an empty one.
  pub fn activate(&self, version: &str) -> Result<()> {
    let known = self.store.list_generations()?;
    if !known.iter().any(|g| g == version) {
      return Err(eyre!(
        "Cannot activate generation {}: it was never installed",
        version
      ));
    }

    for stale in known {
      if stale != version {
        self.store.delete_generation(&stale)?;
        info!(generation = %stale, "deleted stale generation");
      }
    }

    let mut inner = self.lock_inner()?;
    inner.active = Some(version.to_string());
    inner.state = GenerationState::Active;
    info!(generation = version, "generation active");

    Ok(())
  }

  /// Install and immediately activate `version` unless it is already
  /// active. The version token comparison is the sole signal for whether a
  /// cycle is needed. Returns whether a new generation was deployed.
  pub async fn deploy<C: Fetch>(
    &self,
    version: &str,
    manifest: &CoreManifest,
    client: &C,
  ) -> Result<bool> {
    if self.active_generation()?.as_deref() == Some(version) {
      return Ok(false);
    }

    self.install(version, manifest, client).await?;
    self.activate(version)?;

    Ok(true)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::MemoryStore;
  use async_trait::async_trait;
  use std::collections::HashMap;
  use std::sync::atomic::{AtomicUsize, Ordering};

  /// Fetcher serving canned responses by path, with a failure switch.
  struct FakeFetcher {
    responses: HashMap<String, StoredResponse>,
    fetches: AtomicUsize,
  }

  impl FakeFetcher {
    fn new(paths: &[&str]) -> Self {
      let responses = paths
        .iter()
        .map(|path| {
          let identity = RequestIdentity::get(*path);
          let body = format!("body of {}", path);
          (
            identity.path(),
            StoredResponse::new(200, Vec::new(), body.into_bytes()),
          )
        })
        .collect();

      Self {
        responses,
        fetches: AtomicUsize::new(0),
      }
    }

    fn fetch_count(&self) -> usize {
      self.fetches.load(Ordering::SeqCst)
    }
  }

  #[async_trait]
  impl Fetch for FakeFetcher {
    async fn fetch(&self, identity: &RequestIdentity) -> Result<StoredResponse> {
      self.fetches.fetch_add(1, Ordering::SeqCst);
      self
        .responses
        .get(&identity.path())
        .cloned()
        .ok_or_else(|| eyre!("connection refused: {}", identity.url()))
    }
  }

  fn manifest() -> CoreManifest {
    CoreManifest::new(
      &["./index.html", "./styles.css", "./app.js", "./offline.html"],
      "./offline.html",
    )
    .unwrap()
  }

  #[tokio::test]
  async fn successful_install_populates_every_manifest_entry() {
    let store = Arc::new(MemoryStore::new());
    let lifecycle = LifecycleManager::new(Arc::clone(&store));
    let client = FakeFetcher::new(&["/index.html", "/styles.css", "/app.js", "/offline.html"]);

    lifecycle.deploy("v1", &manifest(), &client).await.unwrap();

    assert_eq!(lifecycle.active_generation().unwrap().as_deref(), Some("v1"));
    assert_eq!(lifecycle.state().unwrap(), GenerationState::Active);

    for identity in manifest().entries() {
      assert!(
        store.get("v1", identity).unwrap().is_some(),
        "{} missing after install",
        identity.url()
      );
    }
  }

  #[tokio::test]
  async fn failed_install_leaves_no_partial_generation() {
    let store = Arc::new(MemoryStore::new());
    let lifecycle = LifecycleManager::new(Arc::clone(&store));
    // styles.css is unreachable
    let client = FakeFetcher::new(&["/index.html", "/app.js", "/offline.html"]);

    let result = lifecycle.install("v1", &manifest(), &client).await;

    assert!(result.is_err());
    assert!(store.list_generations().unwrap().is_empty());
    assert_eq!(lifecycle.active_generation().unwrap(), None);
    assert_eq!(lifecycle.state().unwrap(), GenerationState::Idle);
  }

  #[tokio::test]
  async fn failed_install_keeps_previous_generation_serving() {
    let store = Arc::new(MemoryStore::new());
    let lifecycle = LifecycleManager::new(Arc::clone(&store));
    let good = FakeFetcher::new(&["/index.html", "/styles.css", "/app.js", "/offline.html"]);

    lifecycle.deploy("v1", &manifest(), &good).await.unwrap();

    let broken = FakeFetcher::new(&["/index.html"]);
    let result = lifecycle.deploy("v2", &manifest(), &broken).await;

    assert!(result.is_err());
    assert_eq!(lifecycle.active_generation().unwrap().as_deref(), Some("v1"));
    assert_eq!(lifecycle.state().unwrap(), GenerationState::Active);
    assert!(store
      .get("v1", &RequestIdentity::get("./index.html"))
      .unwrap()
      .is_some());
  }

  #[tokio::test]
  async fn reinstalling_the_active_version_is_refused_and_touches_nothing() {
    let store = Arc::new(MemoryStore::new());
    let lifecycle = LifecycleManager::new(Arc::clone(&store));
    let good = FakeFetcher::new(&["/index.html", "/styles.css", "/app.js", "/offline.html"]);

    lifecycle.deploy("v1", &manifest(), &good).await.unwrap();

    // A broken fetcher must not matter: the install is rejected before any
    // fetch or cleanup can run against the serving generation.
    let broken = FakeFetcher::new(&[]);
    let result = lifecycle.install("v1", &manifest(), &broken).await;

    assert!(result.is_err());
    assert_eq!(broken.fetch_count(), 0);
    assert_eq!(lifecycle.active_generation().unwrap().as_deref(), Some("v1"));
    assert_eq!(lifecycle.state().unwrap(), GenerationState::Active);
    for identity in manifest().entries() {
      assert!(
        store.get("v1", identity).unwrap().is_some(),
        "{} vanished from the active generation",
        identity.url()
      );
    }
  }

  #[tokio::test]
  async fn activating_an_uninstalled_version_is_refused() {
    let store = Arc::new(MemoryStore::new());
    let lifecycle = LifecycleManager::new(Arc::clone(&store));
    let client = FakeFetcher::new(&["/index.html", "/styles.css", "/app.js", "/offline.html"]);

    lifecycle.deploy("v1", &manifest(), &client).await.unwrap();

    assert!(lifecycle.activate("v2-typo").is_err());

    // The mistyped token deleted nothing and promotion did not happen
    assert_eq!(store.list_generations().unwrap(), vec!["v1".to_string()]);
    assert_eq!(lifecycle.active_generation().unwrap().as_deref(), Some("v1"));
  }

  #[tokio::test]
  async fn activate_deletes_all_superseded_generations() {
    let store = Arc::new(MemoryStore::new());
    let lifecycle = LifecycleManager::new(Arc::clone(&store));
    let client = FakeFetcher::new(&["/index.html", "/styles.css", "/app.js", "/offline.html"]);

    lifecycle.deploy("v1", &manifest(), &client).await.unwrap();
    lifecycle.deploy("v2", &manifest(), &client).await.unwrap();

    assert_eq!(store.list_generations().unwrap(), vec!["v2".to_string()]);
    assert!(store
      .get("v1", &RequestIdentity::get("./index.html"))
      .unwrap()
      .is_none());
    assert_eq!(lifecycle.active_generation().unwrap().as_deref(), Some("v2"));
  }

  #[tokio::test]
  async fn deploying_the_active_version_is_a_no_op() {
    let store = Arc::new(MemoryStore::new());
    let lifecycle = LifecycleManager::new(Arc::clone(&store));
    let client = FakeFetcher::new(&["/index.html", "/styles.css", "/app.js", "/offline.html"]);

    assert!(lifecycle.deploy("v1", &manifest(), &client).await.unwrap());
    let fetches_after_install = client.fetch_count();

    assert!(!lifecycle.deploy("v1", &manifest(), &client).await.unwrap());
    assert_eq!(client.fetch_count(), fetches_after_install);
  }
}
