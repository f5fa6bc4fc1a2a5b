//! Restoring projects to their pristine state

use fleet_core::{FleetError, Project, ProjectKey, Result, DEFAULT_BRANCH};
use fleet_vcs::RepositoryBackend;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, instrument};

/// Options controlling a cleanup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Delete every local branch except the default branch
    pub delete_branches: bool,
}

/// Reset each project to its default branch, discarding local changes
///
/// Destructive. Projects are processed one at a time in key order and the
/// first failure aborts the batch; projects after it are left untouched.
#[instrument(skip(backend, projects), fields(projects = projects.len()))]
pub async fn cleanup<B>(
    backend: &B,
    projects: &BTreeMap<ProjectKey, Project>,
    options: CleanupOptions,
) -> Result<()>
where
    B: RepositoryBackend + ?Sized,
{
    let keep = BTreeSet::from([DEFAULT_BRANCH.to_string()]);

    for project in projects.values() {
        info!("Cleaning up project {}", project.name);

        backend
            .reset_to_default_branch(project)
            .await
            .map_err(|e| FleetError::cleanup(project.name.clone(), e))?;

        if options.delete_branches {
            backend
                .delete_local_branches(project, &keep)
                .await
                .map_err(|e| FleetError::cleanup(project.name.clone(), e))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_vcs::{MockBackend, MockRepo};

    fn projects(names: &[&str]) -> BTreeMap<ProjectKey, Project> {
        names
            .iter()
            .map(|name| {
                let p = Project::new(*name, format!("https://example.com/{name}"), format!("/ws/{name}"));
                (p.key(), p)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_reset_without_branch_deletion() {
        let backend = MockBackend::new().with_repo(
            "core",
            MockRepo::pristine().with_branch("wip").on_branch("wip").uncommitted(),
        );

        cleanup(&backend, &projects(&["core"]), CleanupOptions::default())
            .await
            .unwrap();

        let repo = backend.repo("core").unwrap();
        assert_eq!(repo.current_branch, DEFAULT_BRANCH);
        assert!(!repo.uncommitted);
        assert_eq!(repo.branches.len(), 2);
        assert_eq!(backend.mutations(), vec!["reset core"]);
    }

    #[tokio::test]
    async fn test_delete_branches_resets_before_deleting() {
        let backend = MockBackend::new()
            .with_repo("core", MockRepo::pristine().with_branch("a").on_branch("b"))
            .with_repo("tools", MockRepo::pristine().untracked());
        let options = CleanupOptions {
            delete_branches: true,
        };

        cleanup(&backend, &projects(&["core", "tools"]), options)
            .await
            .unwrap();

        assert_eq!(backend.repo("core"), Some(MockRepo::pristine()));
        assert_eq!(backend.repo("tools"), Some(MockRepo::pristine()));
        assert_eq!(
            backend.mutations(),
            vec![
                "reset core",
                "delete-branches core",
                "reset tools",
                "delete-branches tools",
            ]
        );
    }

    #[tokio::test]
    async fn test_first_failure_aborts_batch() {
        let backend = MockBackend::new()
            .with_repo("a", MockRepo::pristine())
            .with_repo("b", MockRepo::pristine().on_branch("wip"))
            .with_repo("c", MockRepo::pristine().on_branch("wip"))
            .failing_cleanup("b");

        let err = cleanup(&backend, &projects(&["a", "b", "c"]), CleanupOptions::default())
            .await
            .unwrap_err();

        match err {
            FleetError::Cleanup { project, .. } => assert_eq!(project, "b"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(backend.mutations(), vec!["reset a"]);
        assert_eq!(backend.repo("c").unwrap().current_branch, "wip");
    }

    #[tokio::test]
    async fn test_empty_selection_touches_nothing() {
        let backend = MockBackend::new().with_repo("core", MockRepo::pristine().on_branch("wip"));

        cleanup(&backend, &BTreeMap::new(), CleanupOptions { delete_branches: true })
            .await
            .unwrap();

        assert!(backend.mutations().is_empty());
    }
}
