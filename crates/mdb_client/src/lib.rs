//! HTTP command resolver backed by the mission database REST API.

use async_trait::async_trait;
use command_page::CommandResolver;
use reqwest::{header::ACCEPT, Client, StatusCode};
use shared::{
    domain::{InstanceName, QualifiedName},
    error::ApiError,
    protocol::CommandDefinition,
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid server url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("command {name} not found")]
    NotFound { name: QualifiedName },
    #[error(
        "server rejected request for {name} with status {status}{}",
        .body.as_ref().map(|body| format!(" ({body})")).unwrap_or_default()
    )]
    Status {
        name: QualifiedName,
        status: u16,
        body: Option<ApiError>,
    },
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed command payload for {name}")]
    Decode {
        name: QualifiedName,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct MdbClient {
    http: Client,
    base_url: Url,
}

impl MdbClient {
    pub fn new(base_url: &str) -> Result<Self, ResolveError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, ResolveError> {
        let parsed = Url::parse(base_url.trim()).map_err(|err| ResolveError::InvalidUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ResolveError::InvalidUrl {
                url: base_url.to_string(),
                reason: "url cannot carry a path".to_string(),
            });
        }
        Ok(Self {
            http,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/api/mdb/{instance}/commands/{segment}/...`, every segment percent-encoded.
    pub fn command_url(&self, instance: &InstanceName, name: &QualifiedName) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "mdb", instance.as_str(), "commands"])
                .extend(name.segments());
        }
        url
    }

    pub async fn get_command(
        &self,
        instance: &InstanceName,
        name: &QualifiedName,
    ) -> Result<CommandDefinition, ResolveError> {
        let url = self.command_url(instance, name);
        debug!(instance = %instance, qualified_name = %name, url = %url, "mdb: fetching command");

        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ResolveError::NotFound { name: name.clone() });
        }
        if !status.is_success() {
            let body = response
                .bytes()
                .await
                .ok()
                .and_then(|bytes| serde_json::from_slice::<ApiError>(&bytes).ok());
            warn!(qualified_name = %name, status = status.as_u16(), "mdb: request rejected");
            return Err(ResolveError::Status {
                name: name.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| ResolveError::Decode {
            name: name.clone(),
            source,
        })
    }
}

#[async_trait]
impl CommandResolver for MdbClient {
    async fn resolve(
        &self,
        instance: &InstanceName,
        qualified_name: &QualifiedName,
    ) -> anyhow::Result<CommandDefinition> {
        Ok(self.get_command(instance, qualified_name).await?)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
