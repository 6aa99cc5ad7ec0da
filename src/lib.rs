//! Offline-first resource cache sitting between a web client and the network.
//!
//! Every outgoing request is intercepted, classified into a resource class
//! and served by the matching strategy against a versioned object store:
//! - navigational documents: cache-first, offline fallback page as last resort
//! - structured data: network-first with write-through and cache fallback
//! - images: cache-first with refill on miss
//! - everything else: passthrough with cache fallback
//!
//! The store is partitioned into generations; a deploy installs a new
//! generation (all core manifest entries, all-or-nothing), promotes it
//! immediately and garbage-collects every superseded generation.

pub mod config;
pub mod fetch;
pub mod gateway;
pub mod lifecycle;
pub mod manifest;
pub mod request;
pub mod response;
pub mod router;
pub mod store;
pub mod strategy;

pub use config::DeployConfig;
pub use fetch::{Fetch, HttpFetcher};
pub use gateway::CacheGateway;
pub use lifecycle::{GenerationState, LifecycleManager};
pub use manifest::CoreManifest;
pub use request::{Destination, OutgoingRequest, RequestIdentity};
pub use response::{ServedResponse, ServedSource, StoredResponse};
pub use router::{classify, ResourceClass};
pub use store::{GenerationStore, MemoryStore, SqliteStore};
pub use strategy::StrategyLayer;
