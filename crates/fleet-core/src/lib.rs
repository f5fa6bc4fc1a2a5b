//! # fleet-core
//!
//! Core types for the fleet multi-repository workspace manager.
//!
//! A fleet workspace is a directory holding a `.fleet/` metadata directory and
//! any number of checked-out repositories ("projects"). This crate defines:
//!
//! - The project data model (`Project`, `ProjectKey`, `Branch`, `ProjectState`, `Change`)
//! - The unified error type shared by every fleet crate
//! - Loading of the workspace manifest and configuration
//! - The test to project mapping used when polling

mod config;
mod error;
mod manifest;
mod types;

pub use config::{FleetConfig, TestMapping, CONFIG_FILE};
pub use error::{FleetError, Result};
pub use manifest::{Manifest, ManifestProject, FLEET_DIR, MANIFEST_FILE};
pub use types::*;
