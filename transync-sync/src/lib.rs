//! # transync-sync
//!
//! Reconciliation and repair engine between a CI registry and a translation
//! platform.
//!
//! Call [`pipeline::run`] with a [`SyncContext`] to perform one pass. The
//! building blocks are usable on their own:
//! [`reconcile::reconcile`] → [`repair::repair`] → [`provision::ensure`],
//! all reading and refreshing a [`Catalog`].

pub mod admin;
pub mod catalog;
pub mod context;
pub mod error;
pub mod pages;
pub mod pipeline;
pub mod ports;
pub mod provision;
pub mod reconcile;
pub mod repair;

pub use catalog::Catalog;
pub use context::SyncContext;
pub use error::{FailureKind, PortError, SyncError};
pub use pipeline::{BranchOutcome, RunReport};
pub use ports::{CiRegistry, CommandExecutor, DryRunExecutor, Page, PlatformClient, PlatformConnector};
