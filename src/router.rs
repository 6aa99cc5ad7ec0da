//! Strategy router: classifies intercepted requests into resource classes.

use crate::manifest::CoreManifest;
use crate::request::{Destination, OutgoingRequest};

/// Classification of a request, determining which caching strategy applies.
///
/// Computed per request, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceClass {
  /// Navigational document loads and core manifest entries
  Document,
  /// Structured data fetches (`.json`)
  Data,
  /// Image loads
  Image,
  /// Everything else
  Other,
}

/// Classify a request from its destination hint and URL path.
///
/// Classification is total: every request gets exactly one class, checked
/// in priority order.
pub fn classify(request: &OutgoingRequest, manifest: &CoreManifest) -> ResourceClass {
  let path = request.identity.path();

  if request.is_navigation() || manifest.contains_path(&path) {
    ResourceClass::Document
  } else if path.ends_with(".json") {
    ResourceClass::Data
  } else if request.destination == Destination::Image {
    ResourceClass::Image
  } else {
    ResourceClass::Other
  }
}
