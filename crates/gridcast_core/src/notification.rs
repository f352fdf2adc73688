use crate::{Feature, JobId, JobStatus, RunGuard, StatusUpdate};

/// Visual accent of a notification row (border and badge colour).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Danger,
    Warning,
}

impl Tone {
    pub fn class_name(self) -> &'static str {
        match self {
            Tone::Info => "info",
            Tone::Success => "success",
            Tone::Danger => "danger",
            Tone::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Hourglass,
    Spinner,
    Check,
    Cross,
    Ban,
}

/// UI record for one tracked job.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub job_id: JobId,
    pub feature: Feature,
    pub name: String,
    pub status: JobStatus,
    pub stage: Option<String>,
    pub progress: u8,
    pub message: String,
    pub cancellable: bool,
    pub cancel_requested: bool,
    /// Last transport error seen while polling; cleared by the next good response.
    pub connection_issue: Option<String>,
}

impl Notification {
    fn new(job_id: JobId, feature: Feature, name: String, cancellable: bool) -> Self {
        Self {
            job_id,
            feature,
            name,
            status: JobStatus::Queued,
            stage: None,
            progress: 0,
            message: String::new(),
            cancellable,
            cancel_requested: false,
            connection_issue: None,
        }
    }

    pub fn tone(&self) -> Tone {
        match self.status {
            JobStatus::Queued | JobStatus::Running => Tone::Info,
            JobStatus::Completed => Tone::Success,
            JobStatus::Failed => Tone::Danger,
            JobStatus::Cancelled => Tone::Warning,
        }
    }

    pub fn icon(&self) -> Icon {
        match self.status {
            JobStatus::Queued => Icon::Hourglass,
            JobStatus::Running => Icon::Spinner,
            JobStatus::Completed => Icon::Check,
            JobStatus::Failed => Icon::Cross,
            JobStatus::Cancelled => Icon::Ban,
        }
    }

    pub fn shows_cancel(&self) -> bool {
        self.cancellable && !self.cancel_requested && !self.status.is_terminal()
    }
}

/// Result of applying a status observation to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Unknown,
    /// The job already reached a terminal state; the observation was dropped.
    AlreadyTerminal,
    Updated,
    BecameTerminal(JobStatus),
}

/// Tracked notifications, newest first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NotificationRegistry {
    items: Vec<Notification>,
}

impl NotificationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a notification, or refreshes the name and cancel flag of an existing one.
    pub fn add(&mut self, job_id: JobId, feature: Feature, name: impl Into<String>, cancellable: bool) {
        let name = name.into();
        if let Some(existing) = self.get_mut(&job_id) {
            existing.name = name;
            existing.cancellable = cancellable;
            return;
        }
        self.items
            .insert(0, Notification::new(job_id, feature, name, cancellable));
    }

    pub fn update_status(&mut self, job_id: &JobId, update: &StatusUpdate) -> UpdateOutcome {
        let Some(item) = self.get_mut(job_id) else {
            return UpdateOutcome::Unknown;
        };
        if item.status.is_terminal() {
            return UpdateOutcome::AlreadyTerminal;
        }

        item.status = update.status;
        item.connection_issue = None;
        if let Some(progress) = update.progress {
            item.progress = clamp_percent(progress);
        } else if update.status == JobStatus::Completed {
            item.progress = 100;
        }
        if let Some(message) = &update.message {
            item.message = message.clone();
        }
        item.stage = match (&update.stage, &update.current_sector) {
            (Some(stage), _) => Some(stage.clone()),
            (None, Some(sector)) => Some(format!("processing {sector}")),
            (None, None) if update.status.is_terminal() => None,
            (None, None) => item.stage.take(),
        };

        if update.status.is_terminal() {
            UpdateOutcome::BecameTerminal(update.status)
        } else {
            UpdateOutcome::Updated
        }
    }

    /// Forces a failed state when the client can no longer observe the job.
    pub fn fail_locally(&mut self, job_id: &JobId, message: impl Into<String>) -> UpdateOutcome {
        let update = StatusUpdate::new(JobStatus::Failed).with_message(message);
        self.update_status(job_id, &update)
    }

    pub fn note_connection_issue(&mut self, job_id: &JobId, error: impl Into<String>) -> bool {
        match self.get_mut(job_id) {
            Some(item) if !item.status.is_terminal() => {
                item.connection_issue = Some(error.into());
                true
            }
            _ => false,
        }
    }

    /// Returns whether the flag changed.
    pub fn set_cancel_requested(&mut self, job_id: &JobId, requested: bool) -> bool {
        match self.get_mut(job_id) {
            Some(item) if item.cancel_requested != requested => {
                item.cancel_requested = requested;
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, job_id: &JobId) -> Option<Notification> {
        let index = self.items.iter().position(|item| &item.job_id == job_id)?;
        Some(self.items.remove(index))
    }

    pub fn get(&self, job_id: &JobId) -> Option<&Notification> {
        self.items.iter().find(|item| &item.job_id == job_id)
    }

    fn get_mut(&mut self, job_id: &JobId) -> Option<&mut Notification> {
        self.items.iter_mut().find(|item| &item.job_id == job_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn badge_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_task_prefix_running(&self, prefix: &str) -> bool {
        self.is_guard_running(&RunGuard::Prefix(prefix.to_string()))
    }

    pub fn is_guard_running(&self, guard: &RunGuard) -> bool {
        self.items
            .iter()
            .any(|item| !item.status.is_terminal() && guard.matches(&item.name))
    }
}

fn clamp_percent(progress: f64) -> u8 {
    if progress.is_nan() {
        return 0;
    }
    progress.round().clamp(0.0, 100.0) as u8
}
