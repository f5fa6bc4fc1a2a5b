//! Project registry for a fleet workspace

use fleet_core::{FleetError, Manifest, Project, ProjectKey, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The set of projects known to a workspace, indexed by key
#[derive(Debug, Clone)]
pub struct ProjectRegistry {
    root: PathBuf,
    projects: BTreeMap<ProjectKey, Project>,
}

/// Projects picked out of a registry by identifier
///
/// Identifiers that failed to resolve are kept alongside their error so the
/// caller can report them without aborting the rest of the selection.
#[derive(Debug, Default)]
pub struct Selection {
    pub projects: BTreeMap<ProjectKey, Project>,
    pub errors: Vec<(String, FleetError)>,
}

impl ProjectRegistry {
    /// Scan the workspace rooted at `root` using its manifest
    ///
    /// The root is canonicalized first so project paths are absolute and
    /// comparable with the working directory however the root was given.
    pub fn scan(root: impl AsRef<Path>) -> Result<Self> {
        let root = std::fs::canonicalize(root.as_ref()).map_err(|e| {
            FleetError::Discovery(format!(
                "Cannot resolve workspace root {}: {}",
                root.as_ref().display(),
                e
            ))
        })?;
        info!("Scanning fleet workspace at {}", root.display());

        let manifest = Manifest::load(&root)?;
        let registry = Self::from_projects(&root, manifest.projects(&root)?)?;

        for project in registry.projects.values() {
            if !project.path.exists() {
                warn!(
                    "Project {} is not checked out at {}",
                    project.name,
                    project.path.display()
                );
            }
        }

        debug!("Registered {} projects", registry.len());
        Ok(registry)
    }

    /// Build a registry from already discovered projects
    ///
    /// Fails if two projects share a key.
    pub fn from_projects(
        root: impl Into<PathBuf>,
        projects: impl IntoIterator<Item = Project>,
    ) -> Result<Self> {
        let mut map = BTreeMap::new();
        for project in projects {
            let key = project.key();
            if let Some(existing) = map.insert(key.clone(), project) {
                return Err(FleetError::Discovery(format!(
                    "Duplicate project {} (also at {})",
                    key,
                    existing.path.display()
                )));
            }
        }

        Ok(Self {
            root: root.into(),
            projects: map,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn projects(&self) -> &BTreeMap<ProjectKey, Project> {
        &self.projects
    }

    pub fn get(&self, key: &ProjectKey) -> Option<&Project> {
        self.projects.get(key)
    }

    /// Projects in key order
    pub fn iter(&self) -> impl Iterator<Item = (&ProjectKey, &Project)> {
        self.projects.iter()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    fn matches(&self, key: &ProjectKey, project: &Project, identifier: &str) -> bool {
        let path = Path::new(identifier);
        project.name == identifier
            || key.as_str() == identifier
            || (path.is_absolute() && project.path == path)
            || (path.is_relative() && project.path == self.root.join(path))
    }

    /// Find the single project matching `identifier` by name, key or path
    ///
    /// Relative paths are resolved against the workspace root.
    pub fn find_unique(&self, identifier: &str) -> Result<&Project> {
        let matches: Vec<(&ProjectKey, &Project)> = self
            .projects
            .iter()
            .filter(|(key, project)| self.matches(key, project, identifier))
            .collect();

        match matches.as_slice() {
            [] => Err(FleetError::NotFound(identifier.to_string())),
            [(_, project)] => Ok(*project),
            many => Err(FleetError::AmbiguousMatch {
                identifier: identifier.to_string(),
                matches: many.iter().map(|(key, _)| key.to_string()).collect(),
            }),
        }
    }

    /// Resolve identifiers to projects, or select every project if none are given
    pub fn select<S: AsRef<str>>(&self, identifiers: &[S]) -> Selection {
        if identifiers.is_empty() {
            return Selection {
                projects: self.projects.clone(),
                errors: Vec::new(),
            };
        }

        let mut selection = Selection::default();
        for identifier in identifiers {
            let identifier = identifier.as_ref();
            match self.find_unique(identifier) {
                Ok(project) => {
                    selection.projects.insert(project.key(), project.clone());
                }
                Err(e) => selection.errors.push((identifier.to_string(), e)),
            }
        }
        selection
    }

    /// Key of the innermost project containing `dir`
    pub fn project_key_for(&self, dir: &Path) -> Result<ProjectKey> {
        self.projects
            .iter()
            .filter(|(_, project)| dir.starts_with(&project.path))
            .max_by_key(|(_, project)| project.path.components().count())
            .map(|(key, _)| key.clone())
            .ok_or_else(|| FleetError::NotInProject(dir.to_path_buf()))
    }
}
