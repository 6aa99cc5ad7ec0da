//! Request identity and destination hints.
//!
//! Every request the hosting client issues is described by a
//! [`RequestIdentity`] (the method + URL tuple used as the cache key) and a
//! [`Destination`] hint, mirroring what the client knows about how the
//! response will be consumed.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

/// What the hosting client intends to do with the response.
///
/// Supplied alongside each request; used by the router together with the
/// path shape to pick a caching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
  /// Top-level navigational document load
  Document,
  /// Stylesheet
  Style,
  /// Script
  Script,
  /// Image load
  Image,
  /// Anything else (data fetches carry no destination hint)
  Other,
}

/// The (method, URL) tuple that identifies a request in the cache.
///
/// Identity is stable across repeated issuance of logically-equivalent
/// requests: two requests with the same method, path and query hash to the
/// same storage key even if one was written relative and the other absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestIdentity {
  method: String,
  url: String,
}

impl RequestIdentity {
  /// Create a GET identity. Only GET-equivalent reads are ever cached.
  pub fn get(url: impl Into<String>) -> Self {
    Self {
      method: "GET".to_string(),
      url: url.into(),
    }
  }

  pub fn method(&self) -> &str {
    &self.method
  }

  pub fn url(&self) -> &str {
    &self.url
  }

  /// Whether this identity is a cacheable read.
  pub fn is_cacheable_read(&self) -> bool {
    self.method == "GET"
  }

  /// The normalized path component of the URL.
  ///
  /// Absolute URLs are parsed; relative references (as they appear in a core
  /// manifest, e.g. `./index.html`) are normalized to a leading-slash path.
  pub fn path(&self) -> String {
    if let Ok(parsed) = Url::parse(&self.url) {
      return parsed.path().to_string();
    }

    let trimmed = self.url.trim_start_matches('.');
    let without_query = trimmed.split(['?', '#']).next().unwrap_or("");
    if without_query.is_empty() {
      "/".to_string()
    } else if without_query.starts_with('/') {
      without_query.to_string()
    } else {
      format!("/{}", without_query)
    }
  }

  /// The query string, if any.
  pub fn query(&self) -> Option<String> {
    if let Ok(parsed) = Url::parse(&self.url) {
      return parsed.query().map(String::from);
    }

    let without_fragment = self.url.split('#').next().unwrap_or("");
    without_fragment.split_once('?').map(|(_, q)| q.to_string())
  }

  /// The host (with any explicit port) for absolute URLs.
  ///
  /// Relative references resolve against the deployment origin and carry
  /// no host of their own.
  pub fn host(&self) -> Option<String> {
    let parsed = Url::parse(&self.url).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
      Some(port) => format!("{}:{}", host, port),
      None => host.to_string(),
    })
  }

  /// Stable, fixed-length storage key for this identity.
  ///
  /// Absolute URLs are keyed by host as well as path, so the same path on
  /// two different hosts never shares a cache entry.
  pub fn cache_hash(&self) -> String {
    let mut input = format!("{} ", self.method);
    if let Some(host) = self.host() {
      input.push_str(&host);
    }
    input.push_str(&self.path());
    if let Some(query) = self.query() {
      input.push('?');
      input.push_str(&query);
    }

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
  }
}

/// An outgoing request as seen at the interception boundary.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
  pub identity: RequestIdentity,
  pub destination: Destination,
}

impl OutgoingRequest {
  /// Create a GET request with the given destination hint.
  pub fn get(url: impl Into<String>, destination: Destination) -> Self {
    Self {
      identity: RequestIdentity::get(url),
      destination,
    }
  }

  /// Whether this is a top-level navigational document load.
  pub fn is_navigation(&self) -> bool {
    self.destination == Destination::Document
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn relative_reference_forms_share_identity() {
    let dotted = RequestIdentity::get("./data/products.json");
    let rooted = RequestIdentity::get("/data/products.json");

    assert_eq!(dotted.path(), "/data/products.json");
    assert_eq!(dotted.cache_hash(), rooted.cache_hash());
  }

  #[test]
  fn same_path_on_different_hosts_stays_distinct() {
    let cdn = RequestIdentity::get("https://cdn.example/photo.png");
    let other = RequestIdentity::get("https://other.example/photo.png");

    assert_eq!(cdn.path(), other.path());
    assert_ne!(cdn.cache_hash(), other.cache_hash());
    assert_eq!(cdn.host().as_deref(), Some("cdn.example"));
  }

  #[test]
  fn query_is_part_of_identity() {
    let plain = RequestIdentity::get("/data/products.json");
    let filtered = RequestIdentity::get("/data/products.json?category=books");

    assert_ne!(plain.cache_hash(), filtered.cache_hash());
    assert_eq!(filtered.query().as_deref(), Some("category=books"));
  }

  #[test]
  fn manifest_style_root_reference_normalizes() {
    let root = RequestIdentity::get("./");
    assert_eq!(root.path(), "/");
  }

  #[test]
  fn hash_is_stable_across_issuance() {
    let first = RequestIdentity::get("./assets/img/photo.png");
    let second = RequestIdentity::get("./assets/img/photo.png");
    assert_eq!(first.cache_hash(), second.cache_hash());
  }
}
