//! In-memory repository backend for testing

use async_trait::async_trait;
use fleet_core::{Branch, Change, ChangeSet, FleetError, Project, Result, DEFAULT_BRANCH};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::backend::RepositoryBackend;

/// State of one mock repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRepo {
    pub current_branch: String,
    pub branches: Vec<Branch>,
    pub uncommitted: bool,
    pub untracked: bool,
    pub remote_changes: ChangeSet,
}

impl Default for MockRepo {
    fn default() -> Self {
        Self {
            current_branch: DEFAULT_BRANCH.to_string(),
            branches: vec![Branch::new(DEFAULT_BRANCH)],
            uncommitted: false,
            untracked: false,
            remote_changes: Vec::new(),
        }
    }
}

impl MockRepo {
    /// Clean repository with only the default branch checked out
    pub fn pristine() -> Self {
        Self::default()
    }

    /// Add a local branch
    pub fn with_branch(mut self, name: &str) -> Self {
        self.branches.push(Branch::new(name));
        self
    }

    /// Add a local branch that was exported for review
    pub fn with_reviewed_branch(mut self, name: &str) -> Self {
        self.branches.push(Branch::new(name).with_review_marker());
        self
    }

    /// Check out a branch, creating it if needed
    pub fn on_branch(mut self, name: &str) -> Self {
        if !self.branches.iter().any(|b| b.name == name) {
            self.branches.push(Branch::new(name));
        }
        self.current_branch = name.to_string();
        self
    }

    pub fn uncommitted(mut self) -> Self {
        self.uncommitted = true;
        self
    }

    pub fn untracked(mut self) -> Self {
        self.untracked = true;
        self
    }

    /// Add a remote commit that is missing locally
    pub fn with_remote_change(mut self, commit: &str, description: &str) -> Self {
        self.remote_changes.push(Change {
            commit: commit.to_string(),
            author: "Mock Author".to_string(),
            email: "mock@example.com".to_string(),
            description: description.to_string(),
        });
        self
    }
}

#[derive(Debug, Default)]
struct MockState {
    repos: HashMap<String, MockRepo>,
    failing: BTreeSet<String>,
    failing_cleanup: BTreeSet<String>,
    mutations: Vec<String>,
}

/// Mock repository backend keyed by project name
///
/// Mutating calls update the stored repositories and are recorded, so tests
/// can check both the resulting state and the order of operations.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repo(self, project: &str, repo: MockRepo) -> Self {
        self.lock().repos.insert(project.to_string(), repo);
        self
    }

    /// Make every call for `project` fail
    pub fn failing(self, project: &str) -> Self {
        self.lock().failing.insert(project.to_string());
        self
    }

    /// Make only the mutating calls for `project` fail
    pub fn failing_cleanup(self, project: &str) -> Self {
        self.lock().failing_cleanup.insert(project.to_string());
        self
    }

    /// Current state of a mock repository
    pub fn repo(&self, project: &str) -> Option<MockRepo> {
        self.lock().repos.get(project).cloned()
    }

    /// Mutations performed so far, as `{operation} {project}`
    pub fn mutations(&self) -> Vec<String> {
        self.lock().mutations.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A poisoned lock only means another test thread panicked
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read<T>(&self, project: &Project, f: impl FnOnce(&MockRepo) -> T) -> Result<T> {
        let state = self.lock();
        if state.failing.contains(&project.name) {
            return Err(FleetError::GitCommand(format!(
                "mock failure for {}",
                project.name
            )));
        }
        state
            .repos
            .get(&project.name)
            .map(f)
            .ok_or_else(|| FleetError::GitCommand(format!("no mock repository for {}", project.name)))
    }

    fn mutate(
        &self,
        project: &Project,
        operation: &str,
        f: impl FnOnce(&mut MockRepo),
    ) -> Result<()> {
        let mut state = self.lock();
        if state.failing.contains(&project.name) || state.failing_cleanup.contains(&project.name) {
            return Err(FleetError::GitCommand(format!(
                "mock {} failure for {}",
                operation, project.name
            )));
        }
        let repo = state.repos.get_mut(&project.name).ok_or_else(|| {
            FleetError::GitCommand(format!("no mock repository for {}", project.name))
        })?;
        f(repo);
        state.mutations.push(format!("{} {}", operation, project.name));
        Ok(())
    }
}

#[async_trait]
impl RepositoryBackend for MockBackend {
    async fn current_branch(&self, project: &Project) -> Result<String> {
        self.read(project, |repo| repo.current_branch.clone())
    }

    async fn branches(&self, project: &Project) -> Result<Vec<Branch>> {
        self.read(project, |repo| repo.branches.clone())
    }

    async fn has_uncommitted_changes(&self, project: &Project) -> Result<bool> {
        self.read(project, |repo| repo.uncommitted)
    }

    async fn has_untracked_files(&self, project: &Project) -> Result<bool> {
        self.read(project, |repo| repo.untracked)
    }

    async fn remote_divergence(&self, project: &Project) -> Result<ChangeSet> {
        self.read(project, |repo| repo.remote_changes.clone())
    }

    async fn reset_to_default_branch(&self, project: &Project) -> Result<()> {
        self.mutate(project, "reset", |repo| {
            repo.current_branch = DEFAULT_BRANCH.to_string();
            repo.uncommitted = false;
            repo.untracked = false;
        })
    }

    async fn delete_local_branches(
        &self,
        project: &Project,
        keep: &BTreeSet<String>,
    ) -> Result<()> {
        self.mutate(project, "delete-branches", |repo| {
            repo.branches.retain(|b| keep.contains(&b.name));
        })
    }
}
