//! Line-oriented listing of project states

use crate::state::ProjectStates;

/// Suffix of branch lines whose branch was exported for review
pub const REVIEW_ANNOTATION: &str = " (exported to gerrit)";

/// Options controlling a listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Show each project's branches under it
    pub branches: bool,
    /// Skip pristine projects
    pub no_pristine: bool,
}

/// Double-quote a field with C-style escapes
///
/// ASCII controls without a short escape become `\xNN` and other control
/// characters `\uNNNN`, so DEL is written `\x7f` rather than `{:?}`'s `\u{7f}`.
fn quote(field: &str) -> String {
    let mut quoted = String::with_capacity(field.len() + 2);
    quoted.push('"');
    for c in field.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\u{07}' => quoted.push_str("\\a"),
            '\u{08}' => quoted.push_str("\\b"),
            '\u{0c}' => quoted.push_str("\\f"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            '\u{0b}' => quoted.push_str("\\v"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                quoted.push_str(&format!("\\x{:02x}", c as u32));
            }
            c if c.is_control() => quoted.push_str(&format!("\\u{:04x}", c as u32)),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Render one line per project, in key order, optionally followed by its branches
///
/// ```text
/// name="core" remote="https://example.com/core" path="/ws/core"
///   * feature (exported to gerrit)
///   master
/// ```
pub fn render_listing(states: &ProjectStates, options: ListOptions) -> Vec<String> {
    let mut lines = Vec::new();

    for state in states.values() {
        if options.no_pristine && state.is_pristine() {
            continue;
        }

        let project = &state.project;
        lines.push(format!(
            "name={} remote={} path={}",
            quote(&project.name),
            quote(&project.remote),
            quote(&project.path.display().to_string())
        ));

        if options.branches {
            for branch in &state.branches {
                let mut line = String::from("  ");
                if branch.name == state.current_branch {
                    line.push_str("* ");
                }
                line.push_str(&branch.name);
                if branch.has_review_marker {
                    line.push_str(REVIEW_ANNOTATION);
                }
                lines.push(line);
            }
        }
    }

    lines
}
