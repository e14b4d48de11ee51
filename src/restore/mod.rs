//! Restoring a project from an archive
//!
//! Reconciliation of the live tree against an archive and the staged
//! delete-then-extract operations built on it.

pub mod executor;
pub mod reconcile;

pub use executor::{RestoreExecutor, RestoreReport, Stage};
pub use reconcile::{diff, retain_deletable, scoped_diff};
