use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use gridcast_core::{Feature, RecentProjectEntry, RecentProjects};
use gridcast_logging::{gc_info, gc_warn};
use thiserror::Error;

use crate::store::{KeyValueStore, StoreError, FEATURE_USAGE_KEY, RECENT_PROJECTS_KEY};
use crate::{ApiError, ProjectApi};

/// Produces ISO-8601 timestamps; injectable for deterministic tests.
pub type Clock = Arc<dyn Fn() -> String + Send + Sync>;

pub fn utc_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn system_clock() -> Clock {
    Arc::new(utc_now)
}

#[derive(Debug, Error)]
pub enum RecentProjectsError {
    #[error("server refused to forget project: {0}")]
    Api(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Recent-project list persisted under [`RECENT_PROJECTS_KEY`].
pub struct RecentProjectsStore {
    store: Arc<dyn KeyValueStore>,
    clock: Clock,
}

impl RecentProjectsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(store, system_clock())
    }

    pub fn with_clock(store: Arc<dyn KeyValueStore>, clock: Clock) -> Self {
        Self { store, clock }
    }

    /// Stored list; unreadable JSON is logged and treated as empty.
    pub fn list(&self) -> Result<RecentProjects, StoreError> {
        let Some(raw) = self.store.get(RECENT_PROJECTS_KEY)? else {
            return Ok(RecentProjects::new());
        };
        match serde_json::from_str::<Vec<RecentProjectEntry>>(&raw) {
            Ok(entries) => Ok(RecentProjects::from_entries(entries)),
            Err(err) => {
                gc_warn!("Ignoring unreadable {} value: {}", RECENT_PROJECTS_KEY, err);
                Ok(RecentProjects::new())
            }
        }
    }

    pub fn add(&self, name: &str, path: &str) -> Result<RecentProjects, StoreError> {
        let mut recent = self.list()?;
        recent.add(name, path, (self.clock)());
        self.save(&recent)?;
        gc_info!("Recorded recent project {} at {}", name, path);
        Ok(recent)
    }

    /// Asks the server to forget the project, then drops it locally.
    ///
    /// When the server call fails the local list is left untouched.
    pub async fn remove(
        &self,
        remote: &dyn ProjectApi,
        path: &str,
    ) -> Result<RecentProjects, RecentProjectsError> {
        remote.remove_recent_project(path).await?;
        let mut recent = self.list()?;
        if recent.remove(path) {
            self.save(&recent)?;
        }
        Ok(recent)
    }

    fn save(&self, recent: &RecentProjects) -> Result<(), StoreError> {
        let raw = serde_json::to_string(recent.entries())?;
        self.store.set(RECENT_PROJECTS_KEY, &raw)
    }
}

/// Last-used timestamps per feature, persisted under [`FEATURE_USAGE_KEY`].
pub struct FeatureUsage {
    store: Arc<dyn KeyValueStore>,
    clock: Clock,
}

impl FeatureUsage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(store, system_clock())
    }

    pub fn with_clock(store: Arc<dyn KeyValueStore>, clock: Clock) -> Self {
        Self { store, clock }
    }

    pub fn record(&self, feature: Feature) -> Result<(), StoreError> {
        let mut usage = self.all()?;
        usage.insert(feature.id().to_string(), (self.clock)());
        let raw = serde_json::to_string(&usage)?;
        self.store.set(FEATURE_USAGE_KEY, &raw)
    }

    pub fn last_used(&self, feature: Feature) -> Result<Option<String>, StoreError> {
        Ok(self.all()?.remove(feature.id()))
    }

    pub fn all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let Some(raw) = self.store.get(FEATURE_USAGE_KEY)? else {
            return Ok(BTreeMap::new());
        };
        match serde_json::from_str(&raw) {
            Ok(usage) => Ok(usage),
            Err(err) => {
                gc_warn!("Ignoring unreadable {} value: {}", FEATURE_USAGE_KEY, err);
                Ok(BTreeMap::new())
            }
        }
    }
}
