use crate::model::ScreenshotRef;
use timetravel_core_types::{EpochMillis, TabId};

/// Read side of the screenshot store that recorded the session.
pub trait ScreenshotPort: Send + Sync {
    /// Newest image captured for `tab` at or before `timestamp`.
    fn image_at(&self, tab: TabId, timestamp: EpochMillis) -> Option<ScreenshotRef>;
}
