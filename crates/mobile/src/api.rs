use std::future::Future;

use cimes_shared::geo::BoundingBox;
use cimes_shared::models::{Report, ReportCreation};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{FetchPolicy, SessionConfig};
use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server returned {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// Error body the backend sends with every non-2xx status.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Message for a non-2xx answer: the body's `detail`, else the status reason phrase.
fn error_detail(status: reqwest::StatusCode, body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) => parsed.detail,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    }
}

/// Report backend as seen by the session.
pub trait ReportApi {
    fn fetch_reports(
        &self,
        area: Option<BoundingBox>,
    ) -> impl Future<Output = Result<Vec<Report>, ApiError>> + Send;

    fn fetch_report(&self, id: Uuid) -> impl Future<Output = Result<Report, ApiError>> + Send;

    fn submit_report(
        &self,
        creation: ReportCreation,
    ) -> impl Future<Output = Result<Report, ApiError>> + Send;
}

/// Build `<base>/reports`, with the area as a `bbox` query when given.
pub fn build_reports_url(base_url: &str, area: Option<&BoundingBox>) -> String {
    let base = base_url.trim_end_matches('/');
    match area {
        Some(area) => format!("{}/reports?bbox={}", base, area.to_query_value()),
        None => format!("{}/reports", base),
    }
}

pub fn build_report_url(base_url: &str, id: &Uuid) -> String {
    format!("{}/reports/{}", base_url.trim_end_matches('/'), id)
}

#[derive(Debug, Clone)]
pub struct HttpReportApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpReportApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpReportApi {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.api_base_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn decode<T: for<'de> Deserialize<'de>>(
        resp: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.bytes().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail: error_detail(status, &body),
            });
        }
        resp.json().await.map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl ReportApi for HttpReportApi {
    async fn fetch_reports(&self, area: Option<BoundingBox>) -> Result<Vec<Report>, ApiError> {
        let resp = self
            .client
            .get(build_reports_url(&self.base_url, area.as_ref()))
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Self::decode(resp).await
    }

    async fn fetch_report(&self, id: Uuid) -> Result<Report, ApiError> {
        let resp = self
            .client
            .get(build_report_url(&self.base_url, &id))
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Self::decode(resp).await
    }

    async fn submit_report(&self, creation: ReportCreation) -> Result<Report, ApiError> {
        let resp = self
            .client
            .post(build_reports_url(&self.base_url, None))
            .json(&creation)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Self::decode(resp).await
    }
}

/// Fetch the report collection, retrying with exponential backoff.
pub async fn fetch_with_retry<A: ReportApi>(
    api: &A,
    area: Option<BoundingBox>,
    policy: &FetchPolicy,
) -> Result<Vec<Report>, CoreError> {
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match api.fetch_reports(area).await {
            Ok(reports) => {
                tracing::info!(count = reports.len(), attempt, "Fetched reports");
                return Ok(reports);
            }
            Err(e) if attempt < attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    error = %e,
                    attempt,
                    retry_in_ms = delay.as_millis() as u64,
                    "Report fetch failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(error = %e, attempts, "Report fetch failed");
                return Err(CoreError::FetchFailed(e.to_string()));
            }
        }
    }
}
