//! Repository backend trait definition.

use async_trait::async_trait;
use fleet_core::{Branch, ChangeSet, Project, Result};
use std::collections::BTreeSet;

/// Trait defining what the engine needs from a version control system.
///
/// Every call is scoped to a single project. Implementations report raw
/// failures; the engine wraps them with the project identity.
#[async_trait]
pub trait RepositoryBackend: Send + Sync {
    /// Name of the checked-out branch.
    async fn current_branch(&self, project: &Project) -> Result<String>;

    /// Local branches in backend order. `is_current` is not filled in.
    async fn branches(&self, project: &Project) -> Result<Vec<Branch>>;

    /// Whether the working tree or index differ from HEAD.
    async fn has_uncommitted_changes(&self, project: &Project) -> Result<bool>;

    /// Whether the working tree holds files unknown to the VCS.
    async fn has_untracked_files(&self, project: &Project) -> Result<bool>;

    /// Remote commits on the default branch that are not present locally.
    async fn remote_divergence(&self, project: &Project) -> Result<ChangeSet>;

    /// Check out the default branch and discard every local modification.
    async fn reset_to_default_branch(&self, project: &Project) -> Result<()>;

    /// Delete every local branch whose name is not in `keep`.
    async fn delete_local_branches(&self, project: &Project, keep: &BTreeSet<String>)
        -> Result<()>;
}
