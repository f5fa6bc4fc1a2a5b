//! Unified error types for fleet

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for all fleet operations
#[derive(Error, Debug)]
pub enum FleetError {
    // Workspace discovery errors
    #[error("Workspace discovery failed: {0}")]
    Discovery(String),

    #[error("Project not found: {0}")]
    NotFound(String),

    #[error("Ambiguous project {identifier:?}, matches: {}", matches.join(", "))]
    AmbiguousMatch {
        identifier: String,
        matches: Vec<String>,
    },

    #[error("Not inside any fleet project: {}", .0.display())]
    NotInProject(PathBuf),

    // Backend errors
    #[error("Git command failed: {0}")]
    GitCommand(String),

    #[error("Project {project}: {source}")]
    Backend {
        project: String,
        #[source]
        source: Box<FleetError>,
    },

    #[error("Cleanup of project {project} failed: {source}")]
    Cleanup {
        project: String,
        #[source]
        source: Box<FleetError>,
    },

    // Poll errors
    #[error("Failed to find any projects for test {0:?}")]
    UnknownTest(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

impl FleetError {
    /// Wrap a backend failure with the identity of the project it came from
    pub fn backend(project: impl Into<String>, source: FleetError) -> Self {
        Self::Backend {
            project: project.into(),
            source: Box::new(source),
        }
    }

    /// Wrap a failure raised while cleaning up a project
    pub fn cleanup(project: impl Into<String>, source: FleetError) -> Self {
        Self::Cleanup {
            project: project.into(),
            source: Box::new(source),
        }
    }
}

/// Result type alias using FleetError
pub type Result<T> = std::result::Result<T, FleetError>;
