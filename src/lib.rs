//! stash - timestamped project archives with selective restore
//!
//! This library provides the core functionality of the stash CLI: writing
//! filtered `.tar.gz` snapshots of a project and reconciling the live
//! project against a snapshot when extracting or restoring it.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Options document and project path management
//! - `error`: Custom error types
//! - `archive`: Pattern matching, listing, writing and extracting archives
//! - `restore`: Live tree reconciliation and staged restore operations
//! - `display`: Terminal formatting
//! - `cli`: Create command, options editor and interactive menu
//!
//! # Example
//!
//! ```rust,ignore
//! use stash::config::{Options, ProjectPaths};
//! use stash::restore::RestoreExecutor;
//!
//! let paths = ProjectPaths::new()?;
//! let executor = RestoreExecutor::from_options(paths, &Options::default())?;
//! let plan = executor.plan_restore(archive.as_ref())?;
//! ```

pub mod archive;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod restore;

pub use error::StashError;
