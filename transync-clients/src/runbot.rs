//! CI registry client for an Odoo runbot instance.
//!
//! Talks JSON-RPC to `<url>/jsonrpc`:
//!
//! ```text
//! common.login(db, user, password)                         → uid | false
//! object.execute(db, uid, password, model, method, *args)  → result
//! ```
//!
//! Repositories are `runbot.repo` records with both `weblate_url` and
//! `weblate_token` set; eligible branches are `runbot.branch` records with
//! `uses_weblate = True`.

use std::cell::Cell;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

use transync_core::config::RegistrySettings;
use transync_core::{Branch, PlatformEndpoint, Repository};
use transync_sync::{CiRegistry, PortError};

use crate::http_err;

const REPO_FIELDS: [&str; 3] = ["name", "weblate_url", "weblate_token"];
const BRANCH_FIELDS: [&str; 3] = ["branch_name", "repo_id", "uses_weblate"];

pub struct RunbotClient {
    agent: ureq::Agent,
    endpoint: String,
    db: String,
    username: String,
    password: String,
    /// Set by the first successful login.
    uid: Cell<Option<i64>>,
    next_id: Cell<u64>,
}

impl RunbotClient {
    /// No I/O happens until the first query, which logs in.
    pub fn new(settings: &RegistrySettings, timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            endpoint: format!("{}/jsonrpc", settings.url.trim_end_matches('/')),
            db: settings.db.clone(),
            username: settings.username.clone(),
            password: settings.password.clone(),
            uid: Cell::new(None),
            next_id: Cell::new(1),
        }
    }

    fn uid(&self) -> Result<i64, PortError> {
        if let Some(uid) = self.uid.get() {
            return Ok(uid);
        }
        let result = self.call(
            "common",
            "login",
            json!([self.db, self.username, self.password]),
        )?;
        let uid = result.as_i64().ok_or_else(|| {
            PortError::Rpc(format!(
                "login refused for {}@{} on {}",
                self.username, self.db, self.endpoint
            ))
        })?;
        tracing::debug!("logged into {} as uid {uid}", self.endpoint);
        self.uid.set(Some(uid));
        Ok(uid)
    }

    fn call(&self, service: &str, method: &str, args: Value) -> Result<Value, PortError> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let body = json!({
            "jsonrpc": "2.0",
            "method": "call",
            "params": { "service": service, "method": method, "args": args },
            "id": id,
        });
        let response: RpcResponse = self
            .agent
            .post(&self.endpoint)
            .send_json(body)
            .map_err(|e| http_err(&self.endpoint, e))?
            .into_json()
            .map_err(|e| PortError::Decode {
                endpoint: self.endpoint.clone(),
                message: e.to_string(),
            })?;
        response.into_result()
    }

    fn execute(&self, model: &str, method: &str, args: &[Value]) -> Result<Value, PortError> {
        let mut all = vec![
            json!(self.db),
            json!(self.uid()?),
            json!(self.password),
            json!(model),
            json!(method),
        ];
        all.extend_from_slice(args);
        self.call("object", "execute", Value::Array(all))
    }

    /// `search` then `read` with the given fields.
    fn search_read<T: DeserializeOwned>(
        &self,
        model: &str,
        domain: Value,
        fields: &[&str],
    ) -> Result<Vec<T>, PortError> {
        let ids = self.execute(model, "search", &[domain])?;
        let records = self.execute(model, "read", &[ids, json!(fields)])?;
        decode(&self.endpoint, records)
    }
}

impl CiRegistry for RunbotClient {
    fn list_repos_with_translation_enabled(&self) -> Result<Vec<Repository>, PortError> {
        let records: Vec<RepoRecord> = self.search_read(
            "runbot.repo",
            json!([["weblate_token", "!=", ""], ["weblate_url", "!=", ""]]),
            &REPO_FIELDS,
        )?;
        Ok(records.into_iter().filter_map(RepoRecord::into_repository).collect())
    }

    fn list_eligible_branches(&self, repo: &Repository) -> Result<Vec<Branch>, PortError> {
        let records: Vec<BranchRecord> = self.search_read(
            "runbot.branch",
            json!([["uses_weblate", "=", true], ["repo_id", "=", repo.id]]),
            &BRANCH_FIELDS,
        )?;
        Ok(records
            .into_iter()
            .map(|r| r.into_branch(repo.id))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<RpcErrorData>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorData {
    #[serde(default)]
    message: String,
}

impl RpcResponse {
    fn into_result(self) -> Result<Value, PortError> {
        if let Some(err) = self.error {
            let detail = err.data.map(|d| d.message).unwrap_or_default();
            return Err(PortError::Rpc(if detail.is_empty() {
                err.message
            } else {
                format!("{}: {}", err.message, detail)
            }));
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

/// Odoo renders empty char fields as `false`.
fn false_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OdooStr {
        Str(String),
        Bool(bool),
    }
    Ok(match OdooStr::deserialize(deserializer)? {
        OdooStr::Str(s) => s,
        OdooStr::Bool(_) => String::new(),
    })
}

/// Many2one fields are `[id, "display name"]` or `false`.
fn many2one_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Many2One {
        Pair(i64, String),
        Unset(bool),
    }
    Ok(match Many2One::deserialize(deserializer)? {
        Many2One::Pair(id, _) => Some(id),
        Many2One::Unset(_) => None,
    })
}

#[derive(Debug, Deserialize)]
struct RepoRecord {
    id: i64,
    #[serde(deserialize_with = "false_as_empty")]
    name: String,
    #[serde(deserialize_with = "false_as_empty")]
    weblate_url: String,
    #[serde(deserialize_with = "false_as_empty")]
    weblate_token: String,
}

impl RepoRecord {
    fn into_repository(self) -> Option<Repository> {
        if self.name.is_empty() || self.weblate_url.is_empty() || self.weblate_token.is_empty() {
            tracing::warn!("runbot.repo {} lacks a URL or platform credentials; ignored", self.id);
            return None;
        }
        Some(Repository {
            id: self.id,
            url: self.name,
            platform: PlatformEndpoint::new(self.weblate_url, self.weblate_token),
        })
    }
}

#[derive(Debug, Deserialize)]
struct BranchRecord {
    id: i64,
    #[serde(deserialize_with = "false_as_empty")]
    branch_name: String,
    #[serde(default, deserialize_with = "many2one_id")]
    repo_id: Option<i64>,
    #[serde(default)]
    uses_weblate: bool,
}

impl BranchRecord {
    fn into_branch(self, fallback_repo: i64) -> Branch {
        Branch {
            id: self.id,
            name: self.branch_name,
            repo_id: self.repo_id.unwrap_or(fallback_repo),
            uses_translation: self.uses_weblate,
        }
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T, PortError> {
    serde_json::from_value(value).map_err(|e| PortError::Decode {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}
