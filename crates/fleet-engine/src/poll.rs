//! Polling projects for remote changes

use fleet_core::{ChangeSet, FleetError, Project, Result, TestMapping};
use fleet_vcs::RepositoryBackend;
use futures::future::try_join_all;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument};

use crate::registry::ProjectRegistry;

/// Pending remote changes keyed by project name
///
/// Only projects with at least one change appear.
pub type PollResult = BTreeMap<String, ChangeSet>;

/// Poll projects for remote changes that are not present locally
///
/// An empty `project_names` polls every registered project. Names that match
/// no registered project select nothing.
#[instrument(skip(backend, registry))]
pub async fn poll<B>(
    backend: &B,
    registry: &ProjectRegistry,
    project_names: &BTreeSet<String>,
) -> Result<PollResult>
where
    B: RepositoryBackend + ?Sized,
{
    let selected: Vec<&Project> = registry
        .iter()
        .map(|(_, project)| project)
        .filter(|project| project_names.is_empty() || project_names.contains(&project.name))
        .collect();

    info!("Polling {} projects", selected.len());

    let polled = try_join_all(selected.into_iter().map(|project| async move {
        let changes = backend
            .remote_divergence(project)
            .await
            .map_err(|e| FleetError::backend(project.name.clone(), e))?;
        Ok::<_, FleetError>((project.name.clone(), changes))
    }))
    .await?;

    let mut update = PollResult::new();
    for (name, changes) in polled {
        // Projects sharing a name are reported together
        update.entry(name).or_default().extend(changes);
    }
    update.retain(|_, changes| !changes.is_empty());

    debug!("{} projects have pending changes", update.len());
    Ok(update)
}

/// Poll the projects that can affect any of `tests`
///
/// With no tests every project is polled. A test missing from the mapping
/// fails the call before anything is queried.
pub async fn poll_tests<B, S>(
    backend: &B,
    registry: &ProjectRegistry,
    mapping: &TestMapping,
    tests: &[S],
) -> Result<PollResult>
where
    B: RepositoryBackend + ?Sized,
    S: AsRef<str>,
{
    let project_names = mapping.resolve(tests)?;
    poll(backend, registry, &project_names).await
}

/// Pretty-printed JSON for a poll result, or `None` when nothing changed
pub fn render_poll(update: &PollResult) -> Result<Option<String>> {
    if update.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_string_pretty(update)?))
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

    fn backend() -> MockBackend {
        MockBackend::new()
            .with_repo("core", MockRepo::pristine().with_remote_change("c1", "Fix core"))
            .with_repo("tools", MockRepo::pristine())
            .with_repo(
                "docs",
                MockRepo::pristine()
                    .with_remote_change("d2", "Second")
                    .with_remote_change("d1", "First"),
            )
    }

    fn mapping() -> TestMapping {
        let mut mapping = TestMapping::default();
        mapping.insert("core-test", "core");
        mapping.insert("tools-test", "tools");
        mapping.insert("site-test", "docs");
        mapping.insert("site-test", "tools");
        mapping
    }

    #[tokio::test]
    async fn test_poll_all_keeps_only_pending() {
        let registry = registry(&["core", "tools", "docs"]);

        let update = poll(&backend(), &registry, &BTreeSet::new()).await.unwrap();

        assert_eq!(update.keys().collect::<Vec<_>>(), vec!["core", "docs"]);
        assert_eq!(update["docs"].len(), 2);
        assert_eq!(update["docs"][0].commit, "d2");
    }

    #[tokio::test]
    async fn test_poll_restricted_to_names() {
        let registry = registry(&["core", "tools", "docs"]);
        let names = BTreeSet::from(["docs".to_string(), "unregistered".to_string()]);

        let update = poll(&backend(), &registry, &names).await.unwrap();
        assert_eq!(update.keys().collect::<Vec<_>>(), vec!["docs"]);
    }

    #[tokio::test]
    async fn test_poll_backend_failure_fails_call() {
        let registry = registry(&["core", "tools", "docs"]);
        let backend = backend().failing("tools");

        let err = poll(&backend, &registry, &BTreeSet::new()).await.unwrap_err();
        assert!(matches!(err, FleetError::Backend { ref project, .. } if project == "tools"));
    }

    #[tokio::test]
    async fn test_poll_tests_known_test() {
        let registry = registry(&["core", "tools", "docs"]);

        let update = poll_tests(&backend(), &registry, &mapping(), &["site-test"])
            .await
            .unwrap();
        assert_eq!(update.keys().collect::<Vec<_>>(), vec!["docs"]);
    }

    #[tokio::test]
    async fn test_poll_tests_unknown_test() {
        let registry = registry(&["core", "tools", "docs"]);
        let backend = backend();

        let err = poll_tests(&backend, &registry, &mapping(), &["core-test", "nonexistent-test"])
            .await
            .unwrap_err();
        assert!(matches!(err, FleetError::UnknownTest(ref name) if name == "nonexistent-test"));
    }

    #[tokio::test]
    async fn test_poll_tests_without_tests_polls_everything() {
        let registry = registry(&["core", "tools", "docs"]);

        let update = poll_tests::<_, &str>(&backend(), &registry, &mapping(), &[])
            .await
            .unwrap();
        assert_eq!(update.len(), 2);
    }

    #[test]
    fn test_render_poll() {
        assert_eq!(render_poll(&PollResult::new()).unwrap(), None);

        let mut update = PollResult::new();
        update.insert(
            "core".to_string(),
            vec![fleet_core::Change {
                commit: "c1".into(),
                author: "Jane".into(),
                email: "jane@example.com".into(),
                description: "Fix core".into(),
            }],
        );

        let json = render_poll(&update).unwrap().unwrap();
        assert!(json.starts_with("{\n  \"core\": [\n    {\n"));
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["core"][0]["commit"], "c1");
    }
}
