//! Gridcast engine: REST job client, status polling, and local state storage.
mod api;
mod engine;
mod persist;
mod poller;
mod recent;
mod retry;
mod store;
mod types;

pub use api::{ApiSettings, JobApi, ProjectApi, ReqwestJobApi};
pub use engine::{EngineConfig, EngineError, EngineHandle};
pub use persist::PersistError;
pub use poller::{poll_until_terminal, ChannelEventSink, EventSink, PollSettings};
pub use recent::{utc_now, Clock, FeatureUsage, RecentProjectsError, RecentProjectsStore};
pub use retry::{next_delay, RetryPolicy};
pub use store::{
    FileStore, KeyValueStore, MemoryStore, StoreError, FEATURE_USAGE_KEY,
    LOAD_PROFILE_ANALYSIS_KEY, RECENT_PROJECTS_KEY, SIDEBAR_COLLAPSED_KEY,
};
pub use types::{ApiError, EngineEvent, PollOutcome};
