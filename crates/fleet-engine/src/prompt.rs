//! Compact status summaries for shell prompts
//!
//! A prompt line lists the current project's branch first, followed by every
//! other project that is off the default branch or dirty:
//!
//! ```text
//! feature*,tools:wip%,docs:master*
//! ```
//!
//! `*` marks uncommitted changes, `%` marks untracked files.

use fleet_core::{ProjectKey, ProjectState, DEFAULT_BRANCH};

use crate::state::ProjectStates;

/// Options controlling a prompt summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptOptions {
    /// Report dirtiness; without it dirty default branches are hidden
    pub check_dirty: bool,
    /// Prefix the current project's entry with its name
    pub show_name: bool,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            check_dirty: true,
            show_name: false,
        }
    }
}

/// Dirtiness markers for a project: `*` then `%`
pub fn status_suffix(state: &ProjectState, check_dirty: bool) -> String {
    let mut suffix = String::new();
    if check_dirty {
        if state.has_uncommitted {
            suffix.push('*');
        }
        if state.has_untracked {
            suffix.push('%');
        }
    }
    suffix
}

/// Whether a non-current project can be left out of the prompt
///
/// Unlike [`ProjectState::is_pristine`], extra local branches do not matter
/// here, only the checked-out branch and, when checked, dirtiness.
pub fn is_prompt_pristine(state: &ProjectState, check_dirty: bool) -> bool {
    let on_default = state.current_branch == DEFAULT_BRANCH;
    if check_dirty {
        on_default && !state.is_dirty()
    } else {
        on_default
    }
}

/// Summarize states into prompt entries
///
/// Entries for other projects follow key order; the current project's entry is
/// always first regardless of where its key sorts.
pub fn summarize(states: &ProjectStates, current: &ProjectKey, options: PromptOptions) -> Vec<String> {
    let mut statuses: Vec<String> = Vec::new();

    for (key, state) in states {
        let short = format!(
            "{}{}",
            state.current_branch,
            status_suffix(state, options.check_dirty)
        );
        let long = format!("{}:{}", state.project.base_name(), short);

        if key == current {
            let entry = if options.show_name { long } else { short };
            statuses.insert(0, entry);
        } else if !is_prompt_pristine(state, options.check_dirty) {
            statuses.push(long);
        }
    }

    statuses
}

/// Summary joined into a single prompt line
pub fn prompt_line(states: &ProjectStates, current: &ProjectKey, options: PromptOptions) -> String {
    summarize(states, current, options).join(",")
}
