//!
//! Core logic for azgrant
//!
//! Provides the directory data model, the lookup and reconciliation
//! components, the tenant report compiler, and the ambient utilities
//! (config, paths, logging) shared by the connector and CLI crates.
#![deny(missing_docs)]

pub use directory::{DirectoryApi, DirectoryAudit};
pub use error::DirectoryError;

pub mod config;
pub mod directory;
pub mod error;
pub mod logging;
pub mod lookup;
pub mod project;
pub mod reconcile;
pub mod report;
pub mod wellknown;
