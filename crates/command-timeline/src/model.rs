use serde::Serialize;
use timetravel_core_types::{CommandRecord, EpochMillis, LoadStatus, NavigationId, TabId};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    /// Command execution, or one half of a command split at a waypoint.
    Command,
    VisibleGap,
    ElidedGap,
}

/// One contiguous slice of the real timeline and where it lands on the scrubber.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CompressedSegment {
    pub start: EpochMillis,
    pub end: EpochMillis,
    pub relative_start: i64,
    pub relative_end: i64,
    pub kind: SegmentKind,
}

impl CompressedSegment {
    pub fn is_elided(&self) -> bool {
        self.kind == SegmentKind::ElidedGap
    }

    pub fn real_ms(&self) -> i64 {
        self.end - self.start
    }

    pub fn compressed_ms(&self) -> i64 {
        self.relative_end - self.relative_start
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CommandTimelineEntry {
    pub command: CommandRecord,
    /// Real idle time before this command started, before compression.
    pub command_gap_ms: i64,
    pub relative_start_ms: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NavigationTick {
    pub navigation_id: NavigationId,
    pub url: String,
    pub status: LoadStatus,
    pub timestamp: EpochMillis,
    pub offset_percent: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NavigationState {
    pub navigation_id: NavigationId,
    pub tab_id: Option<TabId>,
    pub url: String,
    pub status: LoadStatus,
    pub status_reached_at: EpochMillis,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ScreenshotRef {
    pub tab_id: TabId,
    pub timestamp: EpochMillis,
}
