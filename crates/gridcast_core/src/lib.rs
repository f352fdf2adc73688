//! Gridcast core: pure job-lifecycle state machine and view-model helpers.
mod effect;
mod job;
mod msg;
mod notification;
mod recent;
mod request;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, Toast, ToastLevel};
pub use job::{Feature, JobId, JobStatus, StatusUpdate, SubmissionId};
pub use msg::Msg;
pub use notification::{Icon, Notification, NotificationRegistry, Tone, UpdateOutcome};
pub use recent::{RecentProjectEntry, RecentProjects, MAX_RECENT_PROJECTS};
pub use request::{
    FieldError, ForecastConfig, JobRequest, LoadProfileConfig, ProfileMethod, ProjectValidation,
    RunGuard, SectorConfiguration, ValidationError,
};
pub use state::{AppState, CoreSettings, DEFAULT_NOTIFICATION_TTL};
pub use update::update;
pub use view_model::{AppViewModel, NotificationView};
