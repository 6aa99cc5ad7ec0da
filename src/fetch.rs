//! Network fetch seam and the reqwest-backed implementation.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use url::Url;

use crate::request::RequestIdentity;
use crate::response::StoredResponse;

/// Trait for issuing network fetches.
///
/// An `Err` means the transport failed (offline, DNS, reset). An HTTP
/// response with any status, including errors, is `Ok`; strategies decide
/// what to do with non-success statuses.
#[async_trait]
pub trait Fetch: Send + Sync {
  async fn fetch(&self, identity: &RequestIdentity) -> Result<StoredResponse>;
}

/// HTTP fetcher backed by reqwest.
///
/// Relative identities (manifest entries like `./index.html`) are resolved
/// against the configured origin.
#[derive(Clone)]
pub struct HttpFetcher {
  client: reqwest::Client,
  origin: Url,
}

impl HttpFetcher {
  /// Create a fetcher resolving relative URLs against the given origin.
  pub fn new(origin: Url) -> Result<Self> {
    let client = reqwest::Client::builder()
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client, origin })
  }

  fn resolve(&self, identity: &RequestIdentity) -> Result<Url> {
    self
      .origin
      .join(identity.url())
      .map_err(|e| eyre!("Failed to resolve URL {}: {}", identity.url(), e))
  }
}

#[async_trait]
impl Fetch for HttpFetcher {
  async fn fetch(&self, identity: &RequestIdentity) -> Result<StoredResponse> {
    if !identity.is_cacheable_read() {
      return Err(eyre!(
        "Only GET requests pass through the cache layer, got {}",
        identity.method()
      ));
    }

    let url = self.resolve(identity)?;

    let response = self
      .client
      .get(url.clone())
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch {}: {}", url, e))?;

    let status = response.status().as_u16();
    let headers: Vec<(String, String)> = response
      .headers()
      .iter()
      .filter_map(|(name, value)| {
        value
          .to_str()
          .ok()
          .map(|v| (name.as_str().to_string(), v.to_string()))
      })
      .collect();

    let body = response
      .bytes()
      .await
      .map_err(|e| eyre!("Failed to read body of {}: {}", url, e))?
      .to_vec();

    Ok(StoredResponse::new(status, headers, body))
  }
}
