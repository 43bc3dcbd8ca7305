//! REST client for the Agent Shaker API (`<server>/api`).

mod error;
mod filter;

pub use error::ApiError;
pub use filter::ListFilter;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::CoreConfig;
use crate::models::{Documentation, Entity, Heartbeat, NewDocumentation, NewHeartbeat};

/// Thin typed wrapper over the backend's REST resources. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    health_url: String,
}

impl ApiClient {
    pub fn new(config: &CoreConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            http,
            base_url: config.api_base_url(),
            health_url: config.health_url(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("API error ({}) from {}: {}", status, url, body.trim());
            return Err(ApiError::Status {
                status,
                url: url.to_string(),
                body: body.trim().to_string(),
            });
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &str,
    ) -> Result<T, ApiError> {
        self.send(request, url)
            .await?
            .json::<T>()
            .await
            .map_err(|source| ApiError::Decode {
                url: url.to_string(),
                source,
            })
    }

    /// `GET /<resource>` with optional filters. A `null` body is an empty list.
    pub async fn list<E: Entity>(&self, filter: &ListFilter) -> Result<Vec<E>, ApiError> {
        let url = self.url(E::RESOURCE);
        let request = self.http.get(&url).query(filter.pairs());
        let items: Option<Vec<E>> = self.send_json(request, &url).await?;
        Ok(items.unwrap_or_default())
    }

    pub async fn get<E: Entity>(&self, id: &str) -> Result<E, ApiError> {
        let url = self.url(&format!("{}/{}", E::RESOURCE, id));
        self.send_json(self.http.get(&url), &url).await
    }

    pub async fn create<E, D>(&self, data: &D) -> Result<E, ApiError>
    where
        E: Entity,
        D: Serialize + ?Sized,
    {
        let url = self.url(E::RESOURCE);
        self.send_json(self.http.post(&url).json(data), &url).await
    }

    pub async fn update<E, D>(&self, id: &str, data: &D) -> Result<E, ApiError>
    where
        E: Entity,
        D: Serialize + ?Sized,
    {
        let url = self.url(&format!("{}/{}", E::RESOURCE, id));
        self.send_json(self.http.put(&url).json(data), &url).await
    }

    /// `PUT /<resource>/{id}/status` with `{"status": ...}`.
    pub async fn update_status<E: Entity>(
        &self,
        id: &str,
        status: &str,
    ) -> Result<E, ApiError> {
        let url = self.url(&format!("{}/{}/status", E::RESOURCE, id));
        let body = serde_json::json!({ "status": status });
        self.send_json(self.http.put(&url).json(&body), &url).await
    }

    pub async fn delete<E: Entity>(&self, id: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("{}/{}", E::RESOURCE, id));
        self.send(self.http.delete(&url), &url).await?;
        Ok(())
    }

    pub async fn dashboard(&self) -> Result<serde_json::Value, ApiError> {
        let url = self.url("dashboard");
        self.send_json(self.http.get(&url), &url).await
    }

    pub async fn record_heartbeat(&self, heartbeat: &NewHeartbeat) -> Result<Heartbeat, ApiError> {
        let url = self.url("heartbeats");
        self.send_json(self.http.post(&url).json(heartbeat), &url).await
    }

    pub async fn agent_heartbeats(
        &self,
        agent_id: &str,
        limit: u32,
    ) -> Result<Vec<Heartbeat>, ApiError> {
        let url = self.url(&format!("agents/{}/heartbeats", agent_id));
        let request = self.http.get(&url).query(&[("limit", limit)]);
        let items: Option<Vec<Heartbeat>> = self.send_json(request, &url).await?;
        Ok(items.unwrap_or_default())
    }

    pub async fn create_documentation(
        &self,
        documentation: &NewDocumentation,
    ) -> Result<Documentation, ApiError> {
        let url = self.url("documentation");
        self.send_json(self.http.post(&url).json(documentation), &url)
            .await
    }

    pub async fn task_documentation(&self, task_id: &str) -> Result<Vec<Documentation>, ApiError> {
        let url = self.url(&format!("tasks/{}/documentation", task_id));
        let items: Option<Vec<Documentation>> = self.send_json(self.http.get(&url), &url).await?;
        Ok(items.unwrap_or_default())
    }

    /// `GET /health`; true on any 2xx. Never errors.
    pub async fn check_health(&self) -> bool {
        match self.http.get(&self.health_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!("Health check against {} failed: {}", self.health_url, e);
                false
            }
        }
    }
}
