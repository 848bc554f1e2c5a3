//! Domain types shared by the reconciliation engine and its adapters.
//!
//! [`Repository`] and [`Branch`] belong to the CI registry and are read-only.
//! [`Project`] and [`Component`] mirror the translation platform's REST
//! payloads; the `components` list on a project is cache state filled in by
//! the catalog, never by deserialization.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Prefix of a component repository reference that points at a sibling
/// component's checkout instead of an external URL.
pub const INDIRECTION_SCHEME: &str = "weblate://";

/// Deserialize `null` as the type's default (empty string, empty vec).
fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// CI registry side
// ---------------------------------------------------------------------------

/// Where a repository's translations live: platform API base URL + token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformEndpoint {
    pub url: String,
    #[serde(skip_serializing)]
    pub token: String,
}

impl PlatformEndpoint {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
        }
    }
}

/// A source repository tracked by the CI registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: i64,
    /// Clone URL, SSH (`git@host:owner/repo.git`) or HTTP(S).
    pub url: String,
    pub platform: PlatformEndpoint,
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.url.fmt(f)
    }
}

/// A branch of a [`Repository`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: i64,
    pub name: String,
    pub repo_id: i64,
    /// Flagged for translation sync in the CI registry.
    pub uses_translation: bool,
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Translation platform side
// ---------------------------------------------------------------------------

/// A translation platform project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub slug: String,
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub web: String,
    #[serde(skip)]
    pub components: Vec<Component>,
}

impl Project {
    /// Component tracking `branch`, if any.
    pub fn component_for_branch(&self, branch: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.branch == branch)
    }

    pub fn component(&self, slug: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.slug == slug)
    }
}

/// A per-branch translatable unit inside a [`Project`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub slug: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub branch: String,
    /// Direct VCS URL or a `weblate://project/component` indirection.
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub repo: String,
    /// Non-empty when the component exports its own checkout.
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub git_export: String,
}

impl Component {
    /// True when this component maintains its own clone of the repository.
    pub fn owns_checkout(&self) -> bool {
        !self.git_export.is_empty() && !self.is_indirect()
    }

    pub fn is_indirect(&self) -> bool {
        self.repo.starts_with(INDIRECTION_SCHEME)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
