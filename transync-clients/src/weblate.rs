//! Weblate REST client.
//!
//! Endpoints used, relative to the API base URL:
//!
//! ```text
//! GET projects/?page=N
//! GET projects/<slug>/components/?page=N
//! GET projects/<slug>/
//! ```
//!
//! List responses are `{ "next": <url|null>, "results": [...] }`.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use transync_core::{Component, PlatformEndpoint, Project};
use transync_sync::{Page, PlatformClient, PlatformConnector, PortError};

use crate::http_err;

pub struct WeblateClient {
    agent: ureq::Agent,
    base: String,
    token: String,
}

impl WeblateClient {
    pub fn new(endpoint: &PlatformEndpoint, user_agent: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(user_agent)
            .timeout(timeout)
            .build();
        Self {
            agent,
            base: endpoint.url.trim_end_matches('/').to_string(),
            token: endpoint.token.clone(),
        }
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, PortError> {
        let url = format!("{}/{}", self.base, path);
        tracing::debug!("GET {url}");
        self.agent
            .get(&url)
            .set("Authorization", &format!("Token {}", self.token))
            .set("Accept", "application/json")
            .call()
            .map_err(|e| http_err(&url, e))?
            .into_json()
            .map_err(|e| PortError::Decode {
                endpoint: url.clone(),
                message: e.to_string(),
            })
    }

    fn list<T: DeserializeOwned>(&self, path: &str, page: u32) -> Result<Page<T>, PortError> {
        let response: ListResponse<T> = self.get(&format!("{path}?page={page}"))?;
        Ok(Page {
            next: response.next.as_deref().and_then(next_page),
            items: response.results,
        })
    }
}

impl PlatformClient for WeblateClient {
    fn list_projects(&self, page: u32) -> Result<Page<Project>, PortError> {
        self.list("projects/", page)
    }

    fn list_components(&self, project_slug: &str, page: u32) -> Result<Page<Component>, PortError> {
        self.list(&format!("projects/{project_slug}/components/"), page)
    }

    fn get_project(&self, slug: &str) -> Result<Option<Project>, PortError> {
        match self.get(&format!("projects/{slug}/")) {
            Ok(project) => Ok(Some(project)),
            Err(PortError::Status { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Opens a [`WeblateClient`] per endpoint with shared HTTP settings.
#[derive(Debug, Clone)]
pub struct WeblateConnector {
    user_agent: String,
    timeout: Duration,
}

impl WeblateConnector {
    pub fn new(user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            timeout,
        }
    }
}

impl PlatformConnector for WeblateConnector {
    fn connect(&self, endpoint: &PlatformEndpoint) -> Result<Box<dyn PlatformClient>, PortError> {
        if endpoint.url.is_empty() {
            return Err(PortError::Transport {
                endpoint: String::new(),
                message: "empty platform URL".to_string(),
            });
        }
        Ok(Box::new(WeblateClient::new(
            endpoint,
            &self.user_agent,
            self.timeout,
        )))
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default)]
    next: Option<String>,
    results: Vec<T>,
}

/// Page number carried by a `next` link, if any.
fn next_page(url: &str) -> Option<u32> {
    let query = url.split_once('?')?.1;
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("page="))
        .and_then(|n| n.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://w.example.com/api/projects/?page=3", Some(3))]
    #[case("https://w.example.com/api/projects/?format=json&page=12", Some(12))]
    #[case("https://w.example.com/api/projects/", None)]
    #[case("https://w.example.com/api/projects/?page=x", None)]
    fn next_page_from_link(#[case] url: &str, #[case] expected: Option<u32>) {
        assert_eq!(next_page(url), expected);
    }

    #[test]
    fn project_list_decodes() {
        let body = r#"{
            "count": 3,
            "next": "https://w.example.com/api/projects/?page=2",
            "previous": null,
            "results": [
                {"slug": "a", "name": "A", "web": "http://a.example.com", "id": 1},
                {"slug": "b", "name": "B", "web": null}
            ]
        }"#;
        let response: ListResponse<Project> = serde_json::from_str(body).unwrap();
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[1].web, "");
        assert!(response.results[0].components.is_empty());
        assert_eq!(response.next.as_deref().and_then(next_page), Some(2));
    }

    #[test]
    fn component_list_decodes() {
        let body = r#"{
            "next": null,
            "results": [
                {"slug": "base", "name": "base", "branch": "16.0",
                 "repo": "git@github.com:acme/widgets.git",
                 "git_export": "https://w.example.com/git/p/base/",
                 "file_format": "po"},
                {"slug": "web", "name": "web", "branch": "16.0",
                 "repo": "weblate://p/base", "git_export": null}
            ]
        }"#;
        let response: ListResponse<Component> = serde_json::from_str(body).unwrap();
        assert!(response.next.is_none());
        assert!(response.results[0].owns_checkout());
        assert!(response.results[1].is_indirect());
        assert_eq!(response.results[1].git_export, "");
    }

    #[test]
    fn connector_rejects_empty_url() {
        let connector = WeblateConnector::new("transync", Duration::from_secs(5));
        let err = connector
            .connect(&PlatformEndpoint::new("", "t"))
            .err()
            .expect("empty url must fail");
        assert!(matches!(err, PortError::Transport { .. }));
    }
}
