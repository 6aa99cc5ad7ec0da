//! Stored response snapshots and served-response metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An immutable snapshot of a network response.
///
/// Created when a strategy decides to persist a fetched response; never
/// mutated in place. A later fetch for the same identity overwrites the
/// whole entry within the active generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResponse {
  pub status: u16,
  pub headers: Vec<(String, String)>,
  pub body: Vec<u8>,
  /// When the snapshot was taken
  pub stored_at: DateTime<Utc>,
}

impl StoredResponse {
  /// Create a snapshot taken now.
  pub fn new(status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
    Self {
      status,
      headers,
      body,
      stored_at: Utc::now(),
    }
  }

  /// A synthesized empty JSON collection.
  ///
  /// Returned for structured-data requests when both network and cache fail,
  /// so upstream consumers never need a separate "data unavailable" code
  /// path. Callers must treat it as "no data available", not as evidence the
  /// catalog is empty.
  pub fn empty_collection() -> Self {
    Self::new(
      200,
      vec![("content-type".to_string(), "application/json".to_string())],
      b"[]".to_vec(),
    )
  }

  /// A synthesized, non-cacheable "not found" response.
  pub fn not_found() -> Self {
    Self::new(404, Vec::new(), Vec::new())
  }

  /// Whether the status is in the success range.
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }

  /// Look up a header value by name (case-insensitive).
  pub fn header(&self, name: &str) -> Option<&str> {
    self
      .headers
      .iter()
      .find(|(n, _)| n.eq_ignore_ascii_case(name))
      .map(|(_, v)| v.as_str())
  }
}

/// A response handed back to the caller, including where it came from.
#[derive(Debug, Clone)]
pub struct ServedResponse {
  /// The actual response
  pub response: StoredResponse,
  /// Where the response came from
  pub source: ServedSource,
}

impl ServedResponse {
  /// Fresh response from the network.
  pub fn from_network(response: StoredResponse) -> Self {
    Self {
      response,
      source: ServedSource::Network,
    }
  }

  /// Response served from the active generation without a network attempt.
  pub fn from_cache(response: StoredResponse) -> Self {
    Self {
      response,
      source: ServedSource::Cache,
    }
  }

  /// Cached response served because the network attempt failed.
  pub fn offline(response: StoredResponse) -> Self {
    Self {
      response,
      source: ServedSource::Offline,
    }
  }

  /// The well-known offline fallback document.
  pub fn fallback(response: StoredResponse) -> Self {
    Self {
      response,
      source: ServedSource::Fallback,
    }
  }

  /// A response synthesized by a strategy (empty collection, not-found).
  pub fn synthesized(response: StoredResponse) -> Self {
    Self {
      response,
      source: ServedSource::Synthesized,
    }
  }
}

/// Indicates where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedSource {
  /// Fresh data from network
  Network,
  /// Cache hit, network never attempted
  Cache,
  /// Network failed, serving the cached entry
  Offline,
  /// Network failed, serving the offline fallback document
  Fallback,
  /// Network and cache both failed, response synthesized by the strategy
  Synthesized,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_collection_is_well_formed_json() {
    let response = StoredResponse::empty_collection();
    assert!(response.is_success());
    assert_eq!(response.header("Content-Type"), Some("application/json"));

    let parsed: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(parsed, serde_json::json!([]));
  }

  #[test]
  fn not_found_is_not_success() {
    assert!(!StoredResponse::not_found().is_success());
  }

  #[test]
  fn header_lookup_ignores_case() {
    let response = StoredResponse::new(
      200,
      vec![("Content-Type".to_string(), "text/html".to_string())],
      Vec::new(),
    );
    assert_eq!(response.header("content-type"), Some("text/html"));
    assert_eq!(response.header("etag"), None);
  }
}
