use crate::{FieldError, Icon, JobId, JobStatus, Notification, Tone};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    /// Always equal to `notifications.len()`.
    pub badge_count: usize,
    pub notifications: Vec<NotificationView>,
    pub pending_submissions: usize,
    pub field_errors: Vec<FieldError>,
    pub submit_error: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationView {
    pub job_id: JobId,
    pub name: String,
    pub status: JobStatus,
    pub tone: Tone,
    pub icon: Icon,
    pub progress: u8,
    pub message: String,
    pub stage: Option<String>,
    pub shows_cancel: bool,
    pub cancel_requested: bool,
    pub connection_issue: Option<String>,
}

impl From<&Notification> for NotificationView {
    fn from(item: &Notification) -> Self {
        Self {
            job_id: item.job_id.clone(),
            name: item.name.clone(),
            status: item.status,
            tone: item.tone(),
            icon: item.icon(),
            progress: item.progress,
            message: item.message.clone(),
            stage: item.stage.clone(),
            shows_cancel: item.shows_cancel(),
            cancel_requested: item.cancel_requested,
            connection_issue: item.connection_issue.clone(),
        }
    }
}
