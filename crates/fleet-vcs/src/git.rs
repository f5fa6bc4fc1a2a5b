//! Git backend implementation driving the `git` binary.

use async_trait::async_trait;
use fleet_core::{Branch, Change, ChangeSet, FleetError, Project, Result, DEFAULT_BRANCH};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, instrument, warn};

use crate::backend::RepositoryBackend;
use crate::command::{GitCommand, GitExecutor};

/// Directory under `.git` holding per-branch review metadata
pub const REVIEW_METADATA_DIR: &str = "fleet";

/// File whose presence marks a branch as exported for review
pub const REVIEW_MESSAGE_FILE: &str = ".review_message";

/// Unit separator between fields of a formatted log line
const FIELD_SEPARATOR: char = '\u{1f}';

const LOG_FORMAT: &str = "--format=%H%x1f%an%x1f%ae%x1f%s";

/// Git repository backend.
#[derive(Debug, Clone)]
pub struct GitBackend<E: GitExecutor = GitCommand> {
    executor: E,
    remote: String,
}

impl GitBackend<GitCommand> {
    /// Backend using the `git` binary on `PATH`
    pub fn system(remote: impl Into<String>) -> Self {
        Self::new(GitCommand::new(), remote)
    }
}

impl<E: GitExecutor> GitBackend<E> {
    pub fn new(executor: E, remote: impl Into<String>) -> Self {
        Self {
            executor,
            remote: remote.into(),
        }
    }

    /// Run git in the project checkout and return stdout, failing on non-zero exit
    async fn run(&self, project: &Project, args: &[&str]) -> Result<String> {
        let output = self.executor.exec(&project.path, args).await?;
        if !output.success {
            return Err(FleetError::GitCommand(format!(
                "git {}: {}",
                args.join(" "),
                output.stderr.trim()
            )));
        }
        Ok(output.stdout)
    }

    fn review_message_path(&self, project: &Project, branch: &str) -> PathBuf {
        project
            .path
            .join(".git")
            .join(REVIEW_METADATA_DIR)
            .join(branch)
            .join(REVIEW_MESSAGE_FILE)
    }

    fn remote_default_branch(&self) -> String {
        format!("{}/{}", self.remote, DEFAULT_BRANCH)
    }
}

/// Parse `git log` output produced with [`LOG_FORMAT`]
fn parse_log(stdout: &str) -> ChangeSet {
    stdout
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let mut fields = line.splitn(4, FIELD_SEPARATOR);
            let mut next = || fields.next().unwrap_or_default().to_string();
            Change {
                commit: next(),
                author: next(),
                email: next(),
                description: next(),
            }
        })
        .collect()
}

#[async_trait]
impl<E: GitExecutor> RepositoryBackend for GitBackend<E> {
    #[instrument(skip(self, project), fields(project = %project.name))]
    async fn current_branch(&self, project: &Project) -> Result<String> {
        let stdout = self
            .run(project, &["rev-parse", "--abbrev-ref", "HEAD"])
            .await?;
        Ok(stdout.trim().to_string())
    }

    #[instrument(skip(self, project), fields(project = %project.name))]
    async fn branches(&self, project: &Project) -> Result<Vec<Branch>> {
        let stdout = self
            .run(
                project,
                &["for-each-ref", "--format=%(refname:short)", "refs/heads"],
            )
            .await?;

        let mut branches = Vec::new();
        for name in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let mut branch = Branch::new(name);
            if tokio::fs::try_exists(self.review_message_path(project, name)).await? {
                branch = branch.with_review_marker();
            }
            branches.push(branch);
        }

        debug!("Found {} branches", branches.len());
        Ok(branches)
    }

    #[instrument(skip(self, project), fields(project = %project.name))]
    async fn has_uncommitted_changes(&self, project: &Project) -> Result<bool> {
        let stdout = self
            .run(project, &["status", "--porcelain", "--untracked-files=no"])
            .await?;
        Ok(!stdout.trim().is_empty())
    }

    #[instrument(skip(self, project), fields(project = %project.name))]
    async fn has_untracked_files(&self, project: &Project) -> Result<bool> {
        let stdout = self
            .run(
                project,
                &["ls-files", "--others", "--directory", "--exclude-standard"],
            )
            .await?;
        Ok(!stdout.trim().is_empty())
    }

    #[instrument(skip(self, project), fields(project = %project.name))]
    async fn remote_divergence(&self, project: &Project) -> Result<ChangeSet> {
        self.run(project, &["fetch", self.remote.as_str()]).await?;

        let range = format!("{}..{}", DEFAULT_BRANCH, self.remote_default_branch());
        let stdout = self.run(project, &["log", LOG_FORMAT, range.as_str()]).await?;
        let changes = parse_log(&stdout);

        debug!("{} remote changes missing locally", changes.len());
        Ok(changes)
    }

    #[instrument(skip(self, project), fields(project = %project.name))]
    async fn reset_to_default_branch(&self, project: &Project) -> Result<()> {
        let current = self.current_branch(project).await?;
        if current != DEFAULT_BRANCH {
            debug!("Checking out {} (was on {})", DEFAULT_BRANCH, current);
            self.run(project, &["checkout", "-f", DEFAULT_BRANCH]).await?;
        }

        self.run(project, &["clean", "-d", "-f"]).await?;

        let target = self.remote_default_branch();
        self.run(project, &["reset", "--hard", target.as_str()]).await?;
        Ok(())
    }

    #[instrument(skip(self, project, keep), fields(project = %project.name))]
    async fn delete_local_branches(
        &self,
        project: &Project,
        keep: &BTreeSet<String>,
    ) -> Result<()> {
        for branch in self.branches(project).await? {
            if keep.contains(&branch.name) {
                continue;
            }
            if branch.has_review_marker {
                warn!("Deleting branch {} which was exported for review", branch.name);
            }
            self.run(project, &["branch", "-D", branch.name.as_str()]).await?;
        }
        Ok(())
    }
}
