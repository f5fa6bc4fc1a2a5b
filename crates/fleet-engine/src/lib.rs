//! # fleet-engine
//!
//! Project state and poll engine for fleet workspaces.
//!
//! This crate provides:
//! - The project registry built from the workspace manifest
//! - Aggregation of per-project branch and dirty state
//! - Listing and shell prompt summaries of that state
//! - Cleanup of projects back to their pristine default branch
//! - Polling for remote changes, optionally narrowed to the projects a test depends on
//!
//! Every operation that queries several projects is all-or-nothing: a backend
//! failure in one project fails the whole call.

mod cleanup;
mod listing;
mod poll;
mod prompt;
mod registry;
mod state;

pub use cleanup::{cleanup, CleanupOptions};
pub use listing::{render_listing, ListOptions, REVIEW_ANNOTATION};
pub use poll::{poll, poll_tests, render_poll, PollResult};
pub use prompt::{is_prompt_pristine, prompt_line, status_suffix, summarize, PromptOptions};
pub use registry::{ProjectRegistry, Selection};
pub use state::{current_project_key, get_states, project_state, ProjectStates, StateOptions};
