use std::collections::BTreeMap;
use std::time::Duration;

use crate::view_model::{AppViewModel, NotificationView};
use crate::{Feature, FieldError, JobId, NotificationRegistry, RunGuard, SubmissionId};

/// Delay between a job reaching a terminal state and its notification disappearing.
pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreSettings {
    pub notification_ttl: Duration,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            notification_ttl: DEFAULT_NOTIFICATION_TTL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingSubmission {
    pub feature: Feature,
    pub name: String,
    pub cancellable: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    settings: CoreSettings,
    notifications: NotificationRegistry,
    pending: BTreeMap<SubmissionId, PendingSubmission>,
    next_submission: SubmissionId,
    field_errors: Vec<FieldError>,
    submit_error: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: CoreSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> CoreSettings {
        self.settings
    }

    pub fn view(&self) -> AppViewModel {
        let notifications: Vec<NotificationView> =
            self.notifications.iter().map(NotificationView::from).collect();
        AppViewModel {
            badge_count: self.notifications.badge_count(),
            notifications,
            pending_submissions: self.pending.len(),
            field_errors: self.field_errors.clone(),
            submit_error: self.submit_error.clone(),
            dirty: self.dirty,
        }
    }

    pub fn notifications(&self) -> &NotificationRegistry {
        &self.notifications
    }

    /// True when nothing is in flight and no notification is on screen.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.notifications.is_empty()
    }

    /// Duplicate-submission guard: tracked jobs and in-flight submissions both count.
    pub fn is_task_prefix_running(&self, prefix: &str) -> bool {
        self.is_guard_running(&RunGuard::Prefix(prefix.to_string()))
    }

    pub fn is_guard_running(&self, guard: &RunGuard) -> bool {
        self.notifications.is_guard_running(guard)
            || self
                .pending
                .values()
                .any(|pending| guard.matches(&pending.name))
    }

    /// Returns whether state changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn notifications_mut(&mut self) -> &mut NotificationRegistry {
        &mut self.notifications
    }

    pub(crate) fn begin_submission(&mut self, pending: PendingSubmission) -> SubmissionId {
        self.next_submission += 1;
        let id = self.next_submission;
        self.pending.insert(id, pending);
        self.submit_error = None;
        self.mark_dirty();
        id
    }

    pub(crate) fn finish_submission(&mut self, id: SubmissionId) -> Option<PendingSubmission> {
        let pending = self.pending.remove(&id);
        if pending.is_some() {
            self.mark_dirty();
        }
        pending
    }

    pub(crate) fn set_field_errors(&mut self, errors: Vec<FieldError>) {
        if self.field_errors != errors {
            self.field_errors = errors;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_submit_error(&mut self, error: Option<String>) {
        self.submit_error = error;
        self.mark_dirty();
    }

    pub(crate) fn contains_job(&self, job_id: &JobId) -> bool {
        self.notifications.get(job_id).is_some()
    }
}
