//! Core manifest: the fixed set of resources a generation must hold.

use color_eyre::{eyre::eyre, Result};

use crate::request::RequestIdentity;

/// The ordered set of request identities that must be present in a
/// generation before it may be considered ready.
///
/// One entry is designated as the offline fallback document; it is served
/// for navigational requests when both cache and network fail.
#[derive(Debug, Clone)]
pub struct CoreManifest {
  entries: Vec<RequestIdentity>,
  fallback: RequestIdentity,
}

impl CoreManifest {
  /// Build a manifest from resource URLs plus the designated offline
  /// fallback, which must itself be one of the entries.
  pub fn new<S: AsRef<str>>(urls: &[S], fallback: &str) -> Result<Self> {
    if urls.is_empty() {
      return Err(eyre!("Core manifest must not be empty"));
    }

    let entries: Vec<RequestIdentity> = urls
      .iter()
      .map(|url| RequestIdentity::get(url.as_ref()))
      .collect();

    let fallback_identity = RequestIdentity::get(fallback);
    if !entries.iter().any(|e| e.path() == fallback_identity.path()) {
      return Err(eyre!(
        "Offline fallback {} is not a core manifest entry",
        fallback
      ));
    }

    Ok(Self {
      entries,
      fallback: fallback_identity,
    })
  }

  /// The manifest entries, in order.
  pub fn entries(&self) -> &[RequestIdentity] {
    &self.entries
  }

  /// The offline fallback document identity.
  pub fn fallback(&self) -> &RequestIdentity {
    &self.fallback
  }

  /// Whether a request path exactly matches a manifest entry.
  pub fn contains_path(&self, path: &str) -> bool {
    self.entries.iter().any(|e| e.path() == path)
  }
}
