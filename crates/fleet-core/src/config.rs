//! Configuration management for fleet
//!
//! Workspace-level settings are read from `.fleet/config.toml`. The file is
//! optional; a workspace without one gets the defaults.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;

use crate::{FleetError, Result, FLEET_DIR};

/// Config file name inside [`FLEET_DIR`]
pub const CONFIG_FILE: &str = "config.toml";

/// Workspace-level fleet configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetConfig {
    /// Remote used for fetching, divergence checks and resets
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Tests each project can affect, keyed by project name
    #[serde(default)]
    pub project_tests: BTreeMap<String, Vec<String>>,
}

fn default_remote() -> String {
    "origin".to_string()
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            project_tests: BTreeMap::new(),
        }
    }
}

impl FleetConfig {
    /// Load configuration from `.fleet/config.toml` or use defaults
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let config_path = root.join(FLEET_DIR).join(CONFIG_FILE);

        if config_path.exists() {
            debug!("Loading config from {}", config_path.display());
            let content = std::fs::read_to_string(&config_path)?;
            Self::parse(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| FleetError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Projects known to the configuration, sorted
    pub fn projects(&self) -> impl Iterator<Item = &str> {
        self.project_tests.keys().map(String::as_str)
    }

    /// Tests affected by any of the given projects, de-duplicated and sorted
    pub fn project_tests(&self, projects: &[&str]) -> BTreeSet<String> {
        projects
            .iter()
            .filter_map(|p| self.project_tests.get(*p))
            .flatten()
            .cloned()
            .collect()
    }
}

/// Mapping from a test name to the projects whose changes can affect it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestMapping {
    tests: BTreeMap<String, BTreeSet<String>>,
}

impl TestMapping {
    /// Invert the project to tests table of a configuration
    pub fn from_config(config: &FleetConfig) -> Self {
        let mut mapping = Self::default();
        for project in config.projects() {
            for test in config.project_tests(&[project]) {
                mapping.insert(test, project);
            }
        }
        mapping
    }

    pub fn insert(&mut self, test: impl Into<String>, project: impl Into<String>) {
        self.tests
            .entry(test.into())
            .or_default()
            .insert(project.into());
    }

    /// Projects mapped to a single test
    pub fn projects_for(&self, test: &str) -> Option<&BTreeSet<String>> {
        self.tests.get(test)
    }

    /// Union of the projects mapped to each test
    ///
    /// Fails on the first test that has no mapping; a partial union would poll
    /// fewer projects than the caller asked for.
    pub fn resolve<S: AsRef<str>>(&self, tests: &[S]) -> Result<BTreeSet<String>> {
        let mut projects = BTreeSet::new();
        for test in tests {
            let test = test.as_ref();
            let mapped = self
                .projects_for(test)
                .ok_or_else(|| FleetError::UnknownTest(test.to_string()))?;
            projects.extend(mapped.iter().cloned());
        }
        Ok(projects)
    }

    /// All known test names, sorted
    pub fn test_names(&self) -> impl Iterator<Item = &str> {
        self.tests.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}
