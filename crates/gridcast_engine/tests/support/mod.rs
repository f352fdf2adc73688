#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use gridcast_core::{Feature, JobId, StatusUpdate};
use gridcast_engine::{ApiError, EngineEvent, EventSink, JobApi};

/// Status responses served in order; the last one repeats once the script runs out.
pub struct ScriptedApi {
    statuses: Mutex<VecDeque<Result<StatusUpdate, ApiError>>>,
    last: Mutex<Option<Result<StatusUpdate, ApiError>>>,
    pub start_result: Result<JobId, ApiError>,
    pub cancel_result: Result<String, ApiError>,
    status_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn new(statuses: Vec<Result<StatusUpdate, ApiError>>) -> Arc<Self> {
        Arc::new(Self::build(statuses))
    }

    pub fn build(statuses: Vec<Result<StatusUpdate, ApiError>>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            last: Mutex::new(None),
            start_result: Ok(JobId::new("job-1")),
            cancel_result: Ok("Cancellation requested".to_string()),
            status_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
        }
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl JobApi for ScriptedApi {
    async fn start(&self, _feature: Feature, _payload: &serde_json::Value) -> Result<JobId, ApiError> {
        self.start_result.clone()
    }

    async fn status(&self, _feature: Feature, _job_id: &JobId) -> Result<StatusUpdate, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.statuses.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(result) => {
                *last = Some(result.clone());
                result
            }
            None => last
                .clone()
                .unwrap_or_else(|| Err(ApiError::Transport("script empty".to_string()))),
        }
    }

    async fn cancel(&self, _feature: Feature, _job_id: &JobId) -> Result<String, ApiError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        self.cancel_result.clone()
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingSink {
    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}
