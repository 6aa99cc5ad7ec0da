//! Deploy descriptor: version token, core assets and offline fallback.

use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::manifest::CoreManifest;

/// Build/deploy-time description of one cache generation.
///
/// The version token is bumped whenever the deployed resource set changes;
/// comparing it to the currently active token is the sole signal for
/// whether an install/activate cycle is needed.
#[derive(Debug, Clone, Deserialize)]
pub struct DeployConfig {
  /// Generation identifier, e.g. "catalog-v1"
  pub version: String,
  /// Resources that must be cached before the generation is usable
  pub core_assets: Vec<String>,
  /// The entry served for navigations when cache and network both fail
  pub offline_fallback: String,
}

impl DeployConfig {
  /// Load a deploy descriptor from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./cachefront.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/cachefront/deploy.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Deploy descriptor not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No deploy descriptor found. Create one at ./cachefront.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("cachefront.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("cachefront").join("deploy.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read deploy descriptor {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Invalid deploy descriptor {}: {}", path.display(), e))
  }

  /// Parse a deploy descriptor from YAML.
  pub fn from_yaml(contents: &str) -> Result<Self> {
    let config: DeployConfig =
      serde_yaml::from_str(contents).map_err(|e| eyre!("Failed to parse YAML: {}", e))?;

    // Validate eagerly so a broken descriptor fails at load, not at install
    config.manifest()?;

    Ok(config)
  }

  /// The core manifest described by this deploy.
  pub fn manifest(&self) -> Result<CoreManifest> {
    CoreManifest::new(&self.core_assets, &self.offline_fallback)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const DESCRIPTOR: &str = r#"
version: catalog-v1
core_assets:
  - "./"
  - "./index.html"
  - "./offline.html"
  - "./assets/css/styles.css"
  - "./assets/js/app.js"
  - "./manifest.webmanifest"
offline_fallback: "./offline.html"
"#;

  #[test]
  fn parses_a_full_descriptor() {
    let config = DeployConfig::from_yaml(DESCRIPTOR).unwrap();

    assert_eq!(config.version, "catalog-v1");
    assert_eq!(config.core_assets.len(), 6);

    let manifest = config.manifest().unwrap();
    assert_eq!(manifest.fallback().path(), "/offline.html");
  }

  #[test]
  fn rejects_fallback_outside_the_core_set() {
    let broken = r#"
version: catalog-v1
core_assets:
  - "./index.html"
offline_fallback: "./offline.html"
"#;
    assert!(DeployConfig::from_yaml(broken).is_err());
  }
}
