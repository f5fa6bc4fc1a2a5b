//! Workspace manifest
//!
//! The manifest lives at `.fleet/manifest.toml` in the workspace root and lists
//! every project checked out in the workspace:
//!
//! ```toml
//! [[project]]
//! name = "core"
//! remote = "https://example.com/core.git"
//! path = "src/core"
//! ```
//!
//! Relative paths are resolved against the workspace root.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{FleetError, Project, Result};

/// Name of the metadata directory marking a workspace root
pub const FLEET_DIR: &str = ".fleet";

/// Manifest file name inside [`FLEET_DIR`]
pub const MANIFEST_FILE: &str = "manifest.toml";

/// Parsed `.fleet/manifest.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, rename = "project")]
    pub projects: Vec<ManifestProject>,
}

/// One `[[project]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestProject {
    pub name: String,
    pub remote: String,
    pub path: PathBuf,
}

impl Manifest {
    /// Load the manifest of the workspace rooted at `root`
    pub fn load(root: &Path) -> Result<Self> {
        let manifest_path = root.join(FLEET_DIR).join(MANIFEST_FILE);
        debug!("Loading manifest from {}", manifest_path.display());

        let content = std::fs::read_to_string(&manifest_path).map_err(|e| {
            FleetError::Discovery(format!(
                "Failed to read manifest {}: {}",
                manifest_path.display(),
                e
            ))
        })?;

        Self::parse(&content).map_err(|e| match e {
            FleetError::Discovery(msg) => {
                FleetError::Discovery(format!("{}: {}", manifest_path.display(), msg))
            }
            other => other,
        })
    }

    /// Parse manifest contents
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| FleetError::Discovery(format!("Malformed manifest: {}", e)))
    }

    /// Resolve manifest entries into projects with absolute paths
    pub fn projects(&self, root: &Path) -> Result<Vec<Project>> {
        self.projects
            .iter()
            .map(|entry| {
                if entry.name.trim().is_empty() {
                    return Err(FleetError::Discovery(format!(
                        "Manifest entry with path {} has an empty name",
                        entry.path.display()
                    )));
                }
                let path = if entry.path.is_absolute() {
                    entry.path.clone()
                } else {
                    root.join(&entry.path)
                };
                Ok(Project::new(&entry.name, &entry.remote, path))
            })
            .collect()
    }

    /// Find the workspace root by walking up from `start`
    pub fn find_root(start: &Path) -> Option<PathBuf> {
        let mut path = start;
        loop {
            if path.join(FLEET_DIR).is_dir() {
                return Some(path.to_path_buf());
            }
            path = path.parent()?;
        }
    }
}
