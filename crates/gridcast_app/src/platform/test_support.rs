use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gridcast_core::{Feature, JobId, JobStatus, StatusUpdate};
use gridcast_engine::{ApiError, EngineHandle, JobApi, PollSettings, RetryPolicy};

/// In-process server: statuses come from a script, or flip to `cancelled`
/// once a cancel request has been seen.
pub struct FakeApi {
    statuses: Mutex<VecDeque<StatusUpdate>>,
    honours_cancel: bool,
    start_error: Option<ApiError>,
    cancel_seen: AtomicBool,
    pub start_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
}

impl FakeApi {
    fn build(statuses: Vec<StatusUpdate>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            honours_cancel: false,
            start_error: None,
            cancel_seen: AtomicBool::new(false),
            start_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
        }
    }

    /// running 10% -> running 55% -> completed with a result.
    pub fn completing() -> Arc<Self> {
        Arc::new(Self::build(vec![
            StatusUpdate::new(JobStatus::Running).with_progress(10.0),
            StatusUpdate::new(JobStatus::Running).with_progress(55.0),
            StatusUpdate::new(JobStatus::Completed)
                .with_progress(100.0)
                .with_result(serde_json::json!({"file": "peak.csv"})),
        ]))
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self::build(vec![
            StatusUpdate::new(JobStatus::Running).with_progress(30.0),
            StatusUpdate::new(JobStatus::Failed).with_message(message),
        ]))
    }

    /// Runs until a cancel request arrives.
    pub fn until_cancelled() -> Arc<Self> {
        let mut api = Self::build(Vec::new());
        api.honours_cancel = true;
        Arc::new(api)
    }

    pub fn rejecting(message: &str) -> Arc<Self> {
        let mut api = Self::build(Vec::new());
        api.start_error = Some(ApiError::Server(message.to_string()));
        Arc::new(api)
    }
}

#[async_trait::async_trait]
impl JobApi for FakeApi {
    async fn start(&self, _feature: Feature, _payload: &serde_json::Value) -> Result<JobId, ApiError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        match &self.start_error {
            Some(err) => Err(err.clone()),
            None => Ok(JobId::new("job-1")),
        }
    }

    async fn status(&self, _feature: Feature, _job_id: &JobId) -> Result<StatusUpdate, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if self.honours_cancel {
            let status = if self.cancel_seen.load(Ordering::SeqCst) {
                JobStatus::Cancelled
            } else {
                JobStatus::Running
            };
            return Ok(StatusUpdate::new(status));
        }
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            Ok(statuses.pop_front().unwrap())
        } else {
            statuses
                .front()
                .cloned()
                .ok_or_else(|| ApiError::Transport("no script".to_string()))
        }
    }

    async fn cancel(&self, _feature: Feature, _job_id: &JobId) -> Result<String, ApiError> {
        self.cancel_seen.store(true, Ordering::SeqCst);
        Ok("Cancellation requested".to_string())
    }
}

pub fn fast_engine(api: Arc<FakeApi>) -> EngineHandle {
    EngineHandle::with_api(
        api,
        PollSettings {
            interval: Duration::from_millis(5),
            retry: RetryPolicy {
                max_delay: Duration::from_millis(20),
                multiplier: 2.0,
                max_consecutive_failures: Some(3),
            },
        },
    )
    .unwrap()
}
