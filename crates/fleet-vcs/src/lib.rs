//! # fleet-vcs
//!
//! Repository backends for fleet.
//!
//! The engine only talks to repositories through [`RepositoryBackend`]. This
//! crate provides:
//! - The backend trait itself
//! - A git adapter driving the `git` binary through a [`GitExecutor`]
//! - Mocks of both layers for tests

mod backend;
mod command;
mod git;
mod mock;

pub use backend::RepositoryBackend;
pub use command::{GitCommand, GitExecutor, GitOutput, MockGitExecutor};
pub use git::{GitBackend, REVIEW_MESSAGE_FILE, REVIEW_METADATA_DIR};
pub use mock::{MockBackend, MockRepo};
