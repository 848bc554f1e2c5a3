//! transync core library: domain types, slug derivation, configuration.
//!
//! - [`types`]: repositories, branches, platform projects and components
//! - [`slug`]: project identity derivation from repository URLs
//! - [`config`]: load / save / validate the YAML configuration
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod slug;
pub mod types;

pub use config::Config;
pub use error::ConfigError;
pub use slug::ProjectIdentity;
pub use types::{Branch, Component, PlatformEndpoint, Project, Repository};
