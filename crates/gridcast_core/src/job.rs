use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque server-assigned job identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Client-side handle for a submission that has not been assigned a job id yet.
pub type SubmissionId = u64;

/// Server feature area owning a family of jobs. The id doubles as the REST path prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Feature {
    DemandProjection,
    LoadProfile,
    Project,
}

impl Feature {
    pub const ALL: [Feature; 3] = [
        Feature::DemandProjection,
        Feature::LoadProfile,
        Feature::Project,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Feature::DemandProjection => "demand_projection",
            Feature::LoadProfile => "load_profile",
            Feature::Project => "project",
        }
    }

    /// Path segment of the job-start endpoint under [`Feature::id`].
    pub fn start_endpoint(self) -> &'static str {
        match self {
            Feature::DemandProjection => "run_forecast",
            Feature::LoadProfile => "generate_profile",
            Feature::Project => "validate",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Feature::DemandProjection => "Demand Forecast",
            Feature::LoadProfile => "Load Profile",
            Feature::Project => "Project",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|feature| {
            feature.id() == id || feature.id().replace('_', "-") == id
        })
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::from_id(s.trim()).ok_or_else(|| {
            let known: Vec<&str> = Feature::ALL.iter().map(|f| f.id()).collect();
            format!("unknown feature '{s}' (expected one of {})", known.join(", "))
        })
    }
}

/// Job lifecycle: `Queued -> Running -> {Completed | Failed | Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Maps a wire status string to a status plus an optional advisory stage label.
    ///
    /// `processing_<stage>` and unrecognised values are treated as `Running`; the
    /// stage text is carried along for display only.
    pub fn parse_wire(raw: &str) -> (JobStatus, Option<String>) {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "queued" | "pending" | "submitted" => (JobStatus::Queued, None),
            "running" | "started" | "in_progress" => (JobStatus::Running, None),
            "completed" | "complete" | "success" | "done" => (JobStatus::Completed, None),
            "failed" | "error" => (JobStatus::Failed, None),
            "cancelled" | "canceled" => (JobStatus::Cancelled, None),
            other => {
                let stage = other
                    .strip_prefix("processing_")
                    .map(|rest| rest.replace('_', " "))
                    .unwrap_or_else(|| raw.trim().to_string());
                (JobStatus::Running, Some(stage).filter(|s| !s.is_empty()))
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }
}

/// One status observation for a tracked job, as delivered by the poller.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusUpdate {
    pub status: JobStatus,
    pub stage: Option<String>,
    pub progress: Option<f64>,
    pub message: Option<String>,
    pub current_sector: Option<String>,
    pub result: Option<serde_json::Value>,
}

impl StatusUpdate {
    pub fn new(status: JobStatus) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_result(mut self, result: serde_json::Value) -> Self {
        self.result = Some(result);
        self
    }
}
