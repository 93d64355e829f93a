use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Wall-clock timestamp in milliseconds since the Unix epoch.
pub type EpochMillis = i64;

/// Contract violations detected on records handed over by the session log.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("command {id} (run {run}) ends at {end} before it starts at {start}")]
    NegativeDuration {
        id: CommandId,
        run: u32,
        start: EpochMillis,
        end: EpochMillis,
    },
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct CommandId(pub u64);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NavigationId(pub u64);

impl fmt::Display for NavigationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab:{}", self.0)
    }
}

/// Load milestones a page navigation moves through.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum LoadStatus {
    HttpRequested,
    HttpRedirected,
    HttpResponded,
    DomContentLoaded,
    AllContentLoaded,
    ContentPaint,
}

impl LoadStatus {
    pub fn label(&self) -> &'static str {
        match self {
            LoadStatus::HttpRequested => "http requested",
            LoadStatus::HttpRedirected => "http redirected",
            LoadStatus::HttpResponded => "http responded",
            LoadStatus::DomContentLoaded => "dom content loaded",
            LoadStatus::AllContentLoaded => "all content loaded",
            LoadStatus::ContentPaint => "content paint",
        }
    }

    /// Milestones after which the rendered page can look different.
    pub fn is_visual_milestone(&self) -> bool {
        matches!(
            self,
            LoadStatus::DomContentLoaded | LoadStatus::AllContentLoaded | LoadStatus::ContentPaint
        )
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One attempted execution of a scripted command.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandRecord {
    pub id: CommandId,
    pub run: u32,
    pub run_start_date: EpochMillis,
    pub end_date: EpochMillis,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub client_start_date: Option<EpochMillis>,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub reused_command_from_run: Option<u32>,
}

impl CommandRecord {
    pub fn new(id: u64, run: u32, run_start_date: EpochMillis, end_date: EpochMillis) -> Self {
        Self {
            id: CommandId(id),
            run,
            run_start_date,
            end_date,
            client_start_date: None,
            reused_command_from_run: None,
        }
    }

    pub fn with_client_start(mut self, client_start_date: EpochMillis) -> Self {
        self.client_start_date = Some(client_start_date);
        self
    }

    pub fn reused_from(mut self, run: u32) -> Self {
        self.reused_command_from_run = Some(run);
        self
    }

    pub fn validate(&self) -> Result<(), RecordError> {
        if self.end_date < self.run_start_date {
            return Err(RecordError::NegativeDuration {
                id: self.id,
                run: self.run,
                start: self.run_start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }
}

/// One page navigation observed during the session.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NavigationRecord {
    pub id: NavigationId,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub tab_id: Option<TabId>,
    pub url: String,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub status_changes: BTreeMap<LoadStatus, EpochMillis>,
}

impl NavigationRecord {
    pub fn new(id: u64, url: impl Into<String>) -> Self {
        Self {
            id: NavigationId(id),
            tab_id: None,
            url: url.into(),
            status_changes: BTreeMap::new(),
        }
    }

    pub fn in_tab(mut self, tab: TabId) -> Self {
        self.tab_id = Some(tab);
        self
    }

    pub fn with_status(mut self, status: LoadStatus, timestamp: EpochMillis) -> Self {
        self.status_changes.insert(status, timestamp);
        self
    }

    pub fn status_time(&self, status: LoadStatus) -> Option<EpochMillis> {
        self.status_changes.get(&status).copied()
    }

    /// Earliest recorded status change, if any.
    pub fn started_at(&self) -> Option<EpochMillis> {
        self.status_changes.values().copied().min()
    }

    /// Most recent status reached at or before `timestamp`.
    pub fn status_at(&self, timestamp: EpochMillis) -> Option<(LoadStatus, EpochMillis)> {
        self.status_changes
            .iter()
            .filter(|(_, ts)| **ts <= timestamp)
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)))
            .map(|(status, ts)| (*status, *ts))
    }
}
