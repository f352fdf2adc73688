use std::time::Duration;

use crate::{Feature, JobId, SubmissionId};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// POST the payload to the feature's start endpoint.
    StartJob {
        submission: SubmissionId,
        feature: Feature,
        payload: serde_json::Value,
    },
    BeginPolling { feature: Feature, job_id: JobId },
    /// Tear down a poll loop for a job the user stopped tracking.
    StopPolling { job_id: JobId },
    CancelJob { feature: Feature, job_id: JobId },
    /// Deliver `Msg::RemovalDue` for the job after the delay.
    ScheduleRemoval { job_id: JobId, after: Duration },
    /// Success handler for a completed job.
    JobCompleted {
        job_id: JobId,
        feature: Feature,
        result: Option<serde_json::Value>,
    },
    /// Error handler for a failed job.
    JobFailed {
        job_id: JobId,
        feature: Feature,
        message: String,
    },
    Toast(Toast),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient alert shown once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub text: String,
}

impl Toast {
    pub fn new(level: ToastLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}
