use gridcast_core::{JobId, JobStatus, StatusUpdate, SubmissionId};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    JobStarted {
        submission: SubmissionId,
        job_id: JobId,
    },
    SubmitFailed {
        submission: SubmissionId,
        error: ApiError,
    },
    Status {
        job_id: JobId,
        update: StatusUpdate,
    },
    PollFailed {
        job_id: JobId,
        attempt: u32,
        error: ApiError,
    },
    /// Emitted exactly once per poll loop, whatever ended it.
    PollingEnded {
        job_id: JobId,
        outcome: PollOutcome,
    },
    CancelAnswered {
        job_id: JobId,
        result: Result<String, ApiError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Terminal(JobStatus),
    /// Gave up after this many consecutive failed status requests.
    Abandoned { failures: u32 },
    /// Stopped by its cancellation token.
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Transport(String),
    #[error("http status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    /// Business error reported by the server; the message is shown verbatim.
    #[error("{0}")]
    Server(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// `{status: 'success'|'error', data?, message?}` wrapper used by every endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub status: String,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }

    /// Converts an error envelope into the server's message.
    pub fn into_data(self) -> Result<Option<T>, ApiError> {
        if self.is_success() {
            Ok(self.data)
        } else {
            let message = self
                .message
                .or(self.error)
                .unwrap_or_else(|| format!("server reported status '{}'", self.status));
            Err(ApiError::Server(message))
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StartData {
    #[serde(alias = "jobId", alias = "task_id")]
    pub job_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusData {
    pub status: String,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub current_sector: Option<String>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl From<StatusData> for StatusUpdate {
    fn from(data: StatusData) -> Self {
        let (status, stage) = JobStatus::parse_wire(&data.status);
        let message = match (data.message, data.error) {
            (Some(message), _) if !message.is_empty() => Some(message),
            (_, Some(error)) => Some(error),
            (message, None) => message,
        };
        StatusUpdate {
            status,
            stage,
            progress: data.progress,
            message,
            current_sector: data.current_sector,
            result: data.result,
        }
    }
}
