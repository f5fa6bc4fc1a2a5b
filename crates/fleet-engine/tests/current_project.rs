//! Resolving the current project from the process working directory
//!
//! Kept in its own test binary with a single test: the working directory is
//! process-wide state.

use fleet_core::{FleetError, FLEET_DIR, MANIFEST_FILE};
use fleet_engine::{current_project_key, ProjectRegistry};
use std::env;
use std::fs;
use tempfile::TempDir;

const MANIFEST: &str = r#"
[[project]]
name = "core"
remote = "https://example.com/core.git"
path = "core"

[[project]]
name = "plugin"
remote = "https://example.com/plugin.git"
path = "core/plugins/plugin"
"#;

#[test]
fn test_current_project_from_working_directory() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join(FLEET_DIR)).unwrap();
    fs::write(temp.path().join(FLEET_DIR).join(MANIFEST_FILE), MANIFEST).unwrap();
    fs::create_dir_all(temp.path().join("core/src")).unwrap();
    fs::create_dir_all(temp.path().join("core/plugins/plugin/lib")).unwrap();

    let original = env::current_dir().unwrap();

    // Root given relative to the working directory
    env::set_current_dir(temp.path().join("core/src")).unwrap();
    let registry = ProjectRegistry::scan("../..").unwrap();
    let key = current_project_key(&registry).unwrap();
    assert_eq!(registry.get(&key).unwrap().name, "core");

    // Nested checkouts resolve to the innermost project
    env::set_current_dir(temp.path().join("core/plugins/plugin/lib")).unwrap();
    let key = current_project_key(&registry).unwrap();
    assert_eq!(registry.get(&key).unwrap().name, "plugin");

    // The workspace root itself belongs to no project
    env::set_current_dir(temp.path()).unwrap();
    let registry = ProjectRegistry::scan(".").unwrap();
    let result = current_project_key(&registry);
    assert!(matches!(result, Err(FleetError::NotInProject(_))));

    // Absolute identifiers still match a registry scanned through a relative root
    let absolute = fs::canonicalize(temp.path().join("core")).unwrap();
    let project = registry.find_unique(absolute.to_str().unwrap()).unwrap();
    assert_eq!(project.name, "core");

    env::set_current_dir(original).unwrap();
}
