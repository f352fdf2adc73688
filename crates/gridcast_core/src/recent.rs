use serde::{Deserialize, Serialize};

pub const MAX_RECENT_PROJECTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentProjectEntry {
    pub name: String,
    pub path: String,
    /// ISO-8601 timestamp of the last open.
    pub last_opened: String,
}

/// Most-recently-used project list: unique by path, newest first, capped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecentProjects {
    entries: Vec<RecentProjectEntry>,
}

impl RecentProjects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from stored entries, dropping later duplicates and overflow.
    pub fn from_entries(entries: Vec<RecentProjectEntry>) -> Self {
        let mut list = Self::new();
        for entry in entries {
            if list.entries.iter().any(|e| e.path == entry.path) {
                continue;
            }
            list.entries.push(entry);
        }
        list.entries.truncate(MAX_RECENT_PROJECTS);
        list
    }

    pub fn add(
        &mut self,
        name: impl Into<String>,
        path: impl Into<String>,
        opened_at: impl Into<String>,
    ) {
        let path = path.into();
        self.entries.retain(|entry| entry.path != path);
        self.entries.insert(
            0,
            RecentProjectEntry {
                name: name.into(),
                path,
                last_opened: opened_at.into(),
            },
        );
        self.entries.truncate(MAX_RECENT_PROJECTS);
    }

    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.path != path);
        self.entries.len() != before
    }

    pub fn entries(&self) -> &[RecentProjectEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<RecentProjectEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
