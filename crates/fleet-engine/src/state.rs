//! Aggregation of per-project state

use fleet_core::{FleetError, Project, ProjectKey, ProjectState, Result};
use fleet_vcs::RepositoryBackend;
use futures::future::try_join_all;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use crate::registry::ProjectRegistry;

/// Project states indexed, and therefore ordered, by key
pub type ProjectStates = BTreeMap<ProjectKey, ProjectState>;

/// Options controlling a state query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateOptions {
    /// Query uncommitted changes and untracked files
    pub check_dirty: bool,
    /// Omit pristine projects from the result
    pub filter_pristine: bool,
}

impl Default for StateOptions {
    fn default() -> Self {
        Self {
            check_dirty: true,
            filter_pristine: false,
        }
    }
}

impl StateOptions {
    pub fn filtering_pristine() -> Self {
        Self {
            check_dirty: true,
            filter_pristine: true,
        }
    }
}

/// Query the state of a single project
///
/// When `check_dirty` is false the dirty flags are not queried and reported as
/// false.
#[instrument(skip(backend, project), fields(project = %project.name))]
pub async fn project_state<B>(backend: &B, project: &Project, check_dirty: bool) -> Result<ProjectState>
where
    B: RepositoryBackend + ?Sized,
{
    let query = async {
        let (current_branch, mut branches) =
            tokio::try_join!(backend.current_branch(project), backend.branches(project))?;

        let (has_uncommitted, has_untracked) = if check_dirty {
            tokio::try_join!(
                backend.has_uncommitted_changes(project),
                backend.has_untracked_files(project)
            )?
        } else {
            (false, false)
        };

        for branch in &mut branches {
            branch.is_current = branch.name == current_branch;
        }

        let current_count = branches.iter().filter(|b| b.is_current).count();
        if !branches.is_empty() && current_count != 1 {
            debug!(
                "Current branch {} matches {} local branches",
                current_branch, current_count
            );
        }

        Ok::<_, FleetError>(ProjectState {
            project: project.clone(),
            current_branch,
            branches,
            has_uncommitted,
            has_untracked,
        })
    };

    query
        .await
        .map_err(|e| FleetError::backend(project.name.clone(), e))
}

/// Query the state of every project in the registry
///
/// Projects are queried concurrently; the first failure fails the whole call
/// so callers never act on a partial view.
#[instrument(skip(backend, registry), fields(projects = registry.len()))]
pub async fn get_states<B>(
    backend: &B,
    registry: &ProjectRegistry,
    options: StateOptions,
) -> Result<ProjectStates>
where
    B: RepositoryBackend + ?Sized,
{
    // Pristine-ness depends on the dirty flags
    let check_dirty = options.check_dirty || options.filter_pristine;

    let states = try_join_all(registry.iter().map(|(key, project)| async move {
        let state = project_state(backend, project, check_dirty).await?;
        Ok::<_, FleetError>((key.clone(), state))
    }))
    .await?;

    let mut states: ProjectStates = states.into_iter().collect();
    if options.filter_pristine {
        states.retain(|_, state| !state.is_pristine());
    }

    debug!("Collected {} project states", states.len());
    Ok(states)
}

/// Key of the project containing the process working directory
///
/// The working directory is canonicalized to match the registry's paths.
pub fn current_project_key(registry: &ProjectRegistry) -> Result<ProjectKey> {
    let cwd = std::fs::canonicalize(std::env::current_dir()?)?;
    registry.project_key_for(&cwd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_vcs::{MockBackend, MockRepo};

    fn registry(names: &[&str]) -> ProjectRegistry {
        ProjectRegistry::from_projects(
            "/ws",
            names.iter().map(|name| {
                Project::new(*name, format!("https://example.com/{name}"), format!("/ws/{name}"))
            }),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_one_state_per_project() {
        let registry = registry(&["core", "tools", "docs"]);
        let backend = MockBackend::new()
            .with_repo("core", MockRepo::pristine())
            .with_repo("tools", MockRepo::pristine().on_branch("feature"))
            .with_repo("docs", MockRepo::pristine().untracked());

        let states = get_states(&backend, &registry, StateOptions::default())
            .await
            .unwrap();

        assert_eq!(states.len(), registry.len());
        for key in registry.projects().keys() {
            assert!(states.contains_key(key));
        }
    }

    #[tokio::test]
    async fn test_current_branch_is_marked() {
        let registry = registry(&["tools"]);
        let backend = MockBackend::new().with_repo(
            "tools",
            MockRepo::pristine().with_reviewed_branch("feature").on_branch("feature"),
        );

        let states = get_states(&backend, &registry, StateOptions::default())
            .await
            .unwrap();
        let state = states.values().next().unwrap();

        assert_eq!(state.current_branch, "feature");
        let current: Vec<_> = state
            .branches
            .iter()
            .filter(|b| b.is_current)
            .map(|b| b.name.as_str())
            .collect();
        assert_eq!(current, vec!["feature"]);
        assert!(state.branches[1].has_review_marker);
    }

    #[tokio::test]
    async fn test_filter_pristine() {
        let registry = registry(&["core", "tools", "docs"]);
        let backend = MockBackend::new()
            .with_repo("core", MockRepo::pristine())
            .with_repo("tools", MockRepo::pristine().with_branch("feature"))
            .with_repo("docs", MockRepo::pristine().uncommitted());

        let states = get_states(&backend, &registry, StateOptions::filtering_pristine())
            .await
            .unwrap();

        let names: Vec<_> = states.values().map(|s| s.project.name.as_str()).collect();
        assert_eq!(names, vec!["docs", "tools"]);
    }

    #[tokio::test]
    async fn test_filter_pristine_forces_dirty_checks() {
        let registry = registry(&["core"]);
        let backend = MockBackend::new().with_repo("core", MockRepo::pristine().uncommitted());
        let options = StateOptions {
            check_dirty: false,
            filter_pristine: true,
        };

        let states = get_states(&backend, &registry, options).await.unwrap();
        assert_eq!(states.len(), 1);
    }

    #[tokio::test]
    async fn test_dirty_flags_skipped_without_check() {
        let registry = registry(&["core"]);
        let backend = MockBackend::new()
            .with_repo("core", MockRepo::pristine().uncommitted().untracked());
        let options = StateOptions {
            check_dirty: false,
            filter_pristine: false,
        };

        let states = get_states(&backend, &registry, options).await.unwrap();
        let state = states.values().next().unwrap();
        assert!(!state.has_uncommitted);
        assert!(!state.has_untracked);
    }

    #[tokio::test]
    async fn test_single_failure_fails_whole_call() {
        let registry = registry(&["core", "tools"]);
        let backend = MockBackend::new()
            .with_repo("core", MockRepo::pristine())
            .with_repo("tools", MockRepo::pristine())
            .failing("tools");

        let err = get_states(&backend, &registry, StateOptions::default())
            .await
            .unwrap_err();
        match err {
            FleetError::Backend { project, .. } => assert_eq!(project, "tools"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
