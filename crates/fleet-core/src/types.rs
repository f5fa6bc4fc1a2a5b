//! Core type definitions for fleet workspaces

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the default branch every project is reset to
pub const DEFAULT_BRANCH: &str = "master";

/// Separator between the name and remote parts of a [`ProjectKey`]
pub const KEY_SEPARATOR: &str = "=";

/// Unique, totally ordered identifier of a project within a workspace
///
/// Format: `{name}={remote}`. Ordering is lexicographic, so anything sorted by
/// key comes out grouped by project name first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectKey(String);

impl ProjectKey {
    pub fn new(name: &str, remote: &str) -> Self {
        Self(format!("{}{}{}", name, KEY_SEPARATOR, remote))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A repository registered in the workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project name, possibly slash separated (e.g. `release/go/core`)
    pub name: String,
    /// Remote URL the project is fetched from
    pub remote: String,
    /// Absolute path of the local checkout
    pub path: PathBuf,
}

impl Project {
    pub fn new(name: impl Into<String>, remote: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            remote: remote.into(),
            path: path.into(),
        }
    }

    /// Key identifying this project in a registry
    pub fn key(&self) -> ProjectKey {
        ProjectKey::new(&self.name, &self.remote)
    }

    /// Last component of the project name, used in compact displays
    pub fn base_name(&self) -> &str {
        Path::new(&self.name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.name)
    }
}

/// A local branch of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    /// Whether this is the checked-out branch
    pub is_current: bool,
    /// Whether the branch has been exported to the code review system
    pub has_review_marker: bool,
}

impl Branch {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_current: false,
            has_review_marker: false,
        }
    }

    pub fn with_review_marker(mut self) -> Self {
        self.has_review_marker = true;
        self
    }
}

/// Snapshot of one project's branch topology and dirtiness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectState {
    pub project: Project,
    pub current_branch: String,
    /// Local branches in the order the backend reported them
    pub branches: Vec<Branch>,
    pub has_uncommitted: bool,
    pub has_untracked: bool,
}

impl ProjectState {
    /// True if the project sits on a clean default branch and has no other branches
    ///
    /// This is the predicate used when listing projects. The shell prompt uses
    /// its own, looser notion of pristine.
    pub fn is_pristine(&self) -> bool {
        self.branches.len() == 1
            && self.branches[0].name == DEFAULT_BRANCH
            && self.current_branch == DEFAULT_BRANCH
            && !self.is_dirty()
    }

    /// True if the project has uncommitted changes or untracked files
    pub fn is_dirty(&self) -> bool {
        self.has_uncommitted || self.has_untracked
    }
}

/// A remote commit that is not present locally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub commit: String,
    pub author: String,
    pub email: String,
    pub description: String,
}

/// Remote changes of one project that are missing locally, in backend order
pub type ChangeSet = Vec<Change>;
