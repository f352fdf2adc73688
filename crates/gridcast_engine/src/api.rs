use std::time::Duration;

use gridcast_core::{Feature, JobId, StatusUpdate};
use gridcast_logging::gc_debug;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use url::Url;

use crate::types::{Envelope, StartData, StatusData};
use crate::ApiError;

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000/api".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Server-side job runner: start, observe, and cancel long-running jobs.
#[async_trait::async_trait]
pub trait JobApi: Send + Sync {
    async fn start(&self, feature: Feature, payload: &serde_json::Value) -> Result<JobId, ApiError>;

    async fn status(&self, feature: Feature, job_id: &JobId) -> Result<StatusUpdate, ApiError>;

    /// Requests cancellation. Success means the request was accepted, not that
    /// the job has stopped; returns the server's message.
    async fn cancel(&self, feature: Feature, job_id: &JobId) -> Result<String, ApiError>;
}

/// Project bookkeeping endpoints that are not job-shaped.
#[async_trait::async_trait]
pub trait ProjectApi: Send + Sync {
    async fn remove_recent_project(&self, path: &str) -> Result<(), ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestJobApi {
    base: Url,
    client: reqwest::Client,
}

impl ReqwestJobApi {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::InvalidUrl(format!("{}: {err}", settings.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(settings.base_url.clone()));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Ok(Self { base, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Envelope<T>, ApiError> {
        gc_debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        read_envelope(response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &serde_json::Value,
    ) -> Result<Envelope<T>, ApiError> {
        gc_debug!("POST {}", url);
        let bytes = serde_json::to_vec(body).map_err(|err| ApiError::Decode(err.to_string()))?;
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(bytes)
            .send()
            .await?;
        read_envelope(response).await
    }
}

/// Reads a JSON envelope. Error statuses that still carry an envelope surface
/// the server's message; anything else becomes `HttpStatus`.
async fn read_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<Envelope<T>, ApiError> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        if let Ok(envelope) = serde_json::from_slice::<Envelope<serde_json::Value>>(&body) {
            if !envelope.is_success() {
                envelope.into_data()?;
            }
        }
        return Err(ApiError::HttpStatus {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    serde_json::from_slice(&body).map_err(|err| ApiError::Decode(err.to_string()))
}

#[async_trait::async_trait]
impl JobApi for ReqwestJobApi {
    async fn start(&self, feature: Feature, payload: &serde_json::Value) -> Result<JobId, ApiError> {
        let url = self.endpoint(&[feature.id(), feature.start_endpoint()])?;
        let data: Option<StartData> = self.post_json(url, payload).await?.into_data()?;
        match data {
            Some(StartData { job_id }) if !job_id.trim().is_empty() => Ok(JobId::new(job_id)),
            _ => Err(ApiError::Decode("start response carried no job id".to_string())),
        }
    }

    async fn status(&self, feature: Feature, job_id: &JobId) -> Result<StatusUpdate, ApiError> {
        let url = self.endpoint(&[feature.id(), "status", job_id.as_str()])?;
        let data: Option<StatusData> = self.get_json(url).await?.into_data()?;
        data.map(StatusUpdate::from)
            .ok_or_else(|| ApiError::Decode("status response carried no data".to_string()))
    }

    async fn cancel(&self, feature: Feature, job_id: &JobId) -> Result<String, ApiError> {
        let url = self.endpoint(&[feature.id(), "cancel", job_id.as_str()])?;
        let envelope: Envelope<serde_json::Value> =
            self.post_json(url, &serde_json::json!({})).await?;
        let message = envelope.message.clone().unwrap_or_default();
        envelope.into_data()?;
        Ok(message)
    }
}

#[async_trait::async_trait]
impl ProjectApi for ReqwestJobApi {
    async fn remove_recent_project(&self, path: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&[Feature::Project.id(), "recent", "delete"])?;
        let envelope: Envelope<serde_json::Value> = self
            .post_json(url, &serde_json::json!({ "path": path }))
            .await?;
        envelope.into_data()?;
        Ok(())
    }
}
