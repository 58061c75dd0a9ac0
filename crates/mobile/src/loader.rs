use std::sync::Arc;

use cimes_shared::geo::BoundingBox;
use cimes_shared::models::Report;
use tokio::task::JoinHandle;

use crate::api::{fetch_with_retry, ReportApi};
use crate::config::FetchPolicy;
use crate::error::CoreError;

/// The mount-time report fetch, running on its own task.
///
/// Dropping the loader aborts the fetch.
#[derive(Debug, Default)]
pub struct ReportLoader {
    handle: Option<JoinHandle<Result<Vec<Report>, CoreError>>>,
}

impl ReportLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch, aborting any fetch already running.
    pub fn start<A>(&mut self, api: Arc<A>, area: Option<BoundingBox>, policy: FetchPolicy)
    where
        A: ReportApi + Send + Sync + 'static,
    {
        self.abort();
        self.handle = Some(tokio::spawn(async move {
            fetch_with_retry(api.as_ref(), area, &policy).await
        }));
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Wait for the running fetch. Pends forever when nothing is running.
    pub async fn finished(&mut self) -> Result<Vec<Report>, CoreError> {
        let Some(handle) = self.handle.as_mut() else {
            return std::future::pending().await;
        };
        let result = handle.await;
        self.handle = None;
        match result {
            Ok(outcome) => outcome,
            Err(e) => Err(CoreError::FetchFailed(e.to_string())),
        }
    }

    pub fn abort(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!("Report fetch aborted");
        }
    }
}

impl Drop for ReportLoader {
    fn drop(&mut self) {
        self.abort();
    }
}
