//! Error types for transync-sync.

use serde::Serialize;
use thiserror::Error;

use crate::repair::RepairStep;

/// Failure reported by a collaborator adapter (registry, platform, executor).
#[derive(Debug, Error)]
pub enum PortError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("transport error talking to {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    /// Non-2xx HTTP status.
    #[error("{endpoint} answered HTTP {status}")]
    Status { endpoint: String, status: u16 },

    /// Response body did not have the expected shape.
    #[error("unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// The remote procedure returned an error object.
    #[error("remote call failed: {0}")]
    Rpc(String),

    /// An administrative command could not be spawned or exited non-zero.
    #[error("command `{command}` failed ({status}): {stderr}")]
    Command {
        command: String,
        status: String,
        stderr: String,
    },
}

/// All errors that can arise from a sync pass.
///
/// Only [`SyncError::RegistryUnavailable`] and [`SyncError::CatalogUnavailable`]
/// end a run; everything else is recorded against one (repository, branch)
/// and the pass continues.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("CI registry unavailable: {source}")]
    RegistryUnavailable {
        #[source]
        source: PortError,
    },

    #[error("platform catalog at {endpoint} unavailable: {source}")]
    CatalogUnavailable {
        endpoint: String,
        #[source]
        source: PortError,
    },

    #[error("could not create project '{project}' for {repository} @ {branch}: {reason}")]
    ProjectCreationFailed {
        repository: String,
        branch: String,
        project: String,
        reason: String,
    },

    #[error("could not create component for branch {branch} in project '{project}': {source}")]
    ComponentCreationFailed {
        project: String,
        branch: String,
        #[source]
        source: PortError,
    },

    #[error("repair step '{step}' failed for component '{component}' in project '{project}': {source}")]
    RepairStepFailed {
        project: String,
        component: String,
        step: RepairStep,
        #[source]
        source: PortError,
    },
}

/// Serializable classification of a [`SyncError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    RegistryUnavailable,
    CatalogUnavailable,
    ProjectCreationFailed,
    ComponentCreationFailed,
    RepairStepFailed,
}

impl SyncError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SyncError::RegistryUnavailable { .. } => FailureKind::RegistryUnavailable,
            SyncError::CatalogUnavailable { .. } => FailureKind::CatalogUnavailable,
            SyncError::ProjectCreationFailed { .. } => FailureKind::ProjectCreationFailed,
            SyncError::ComponentCreationFailed { .. } => FailureKind::ComponentCreationFailed,
            SyncError::RepairStepFailed { .. } => FailureKind::RepairStepFailed,
        }
    }

    /// Fatal errors abort the pass.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind(),
            FailureKind::RegistryUnavailable | FailureKind::CatalogUnavailable
        )
    }
}
