//! Git command execution abstraction

use async_trait::async_trait;
use fleet_core::{FleetError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Output from a git command
#[derive(Debug, Clone, Default)]
pub struct GitOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl GitOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            success: true,
        }
    }

    /// Failed output with the given stderr
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            success: false,
        }
    }
}

impl From<Output> for GitOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
        }
    }
}

/// Trait for executing git commands (allows mocking in tests)
#[async_trait]
pub trait GitExecutor: Send + Sync {
    /// Execute a git command inside `dir`
    async fn exec(&self, dir: &Path, args: &[&str]) -> Result<GitOutput>;
}

/// Real git command executor
#[derive(Debug, Clone)]
pub struct GitCommand {
    program: PathBuf,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCommand {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }
}

#[async_trait]
impl GitExecutor for GitCommand {
    #[instrument(skip(self), fields(dir = %dir.display()))]
    async fn exec(&self, dir: &Path, args: &[&str]) -> Result<GitOutput> {
        debug!("Executing git {:?}", args);

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            .output()
            .await
            .map_err(|e| FleetError::GitCommand(format!("Failed to execute git: {}", e)))?;

        let git_output = GitOutput::from(output);

        if !git_output.success {
            debug!("Git command failed: {}", git_output.stderr);
        }

        Ok(git_output)
    }
}

/// Mock git executor for testing
///
/// Responses are keyed by directory and the space-joined arguments.
#[derive(Debug, Clone, Default)]
pub struct MockGitExecutor {
    responses: HashMap<(PathBuf, String), GitOutput>,
    calls: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
}

impl MockGitExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, dir: impl Into<PathBuf>, command: &str, output: GitOutput) -> Self {
        self.responses
            .insert((dir.into(), command.to_string()), output);
        self
    }

    /// Commands executed so far, as `git <args>`
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl GitExecutor for MockGitExecutor {
    async fn exec(&self, dir: &Path, args: &[&str]) -> Result<GitOutput> {
        let key = args.join(" ");
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(format!("git {}", key));
        }
        self.responses
            .get(&(dir.to_path_buf(), key.clone()))
            .cloned()
            .ok_or_else(|| {
                FleetError::GitCommand(format!(
                    "No mock response for: {} in {}",
                    key,
                    dir.display()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_executor() {
        let executor = MockGitExecutor::new().with_response(
            "/ws/core",
            "rev-parse --abbrev-ref HEAD",
            GitOutput::ok("master\n"),
        );

        let output = executor
            .exec(Path::new("/ws/core"), &["rev-parse", "--abbrev-ref", "HEAD"])
            .await
            .unwrap();
        assert!(output.success);
        assert_eq!(output.stdout, "master\n");
        assert_eq!(executor.calls(), vec!["git rev-parse --abbrev-ref HEAD"]);
    }

    #[tokio::test]
    async fn test_mock_executor_is_scoped_by_dir() {
        let executor = MockGitExecutor::new().with_response(
            "/ws/core",
            "status",
            GitOutput::ok(""),
        );

        let result = executor.exec(Path::new("/ws/tools"), &["status"]).await;
        assert!(matches!(result, Err(FleetError::GitCommand(_))));
    }
}
