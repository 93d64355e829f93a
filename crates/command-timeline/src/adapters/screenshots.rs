use crate::model::ScreenshotRef;
use crate::ports::ScreenshotPort;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use timetravel_core_types::{EpochMillis, TabId};

/// Capture index kept in memory; only records which tab had an image at which time.
#[derive(Default)]
pub struct InMemoryScreenshots {
    by_tab: RwLock<HashMap<TabId, BTreeSet<EpochMillis>>>,
}

impl InMemoryScreenshots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, tab: TabId, timestamp: EpochMillis) {
        self.by_tab.write().entry(tab).or_default().insert(timestamp);
    }

    pub fn len(&self) -> usize {
        self.by_tab.read().values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ScreenshotPort for InMemoryScreenshots {
    fn image_at(&self, tab: TabId, timestamp: EpochMillis) -> Option<ScreenshotRef> {
        let guard = self.by_tab.read();
        let captured = guard.get(&tab)?.range(..=timestamp).next_back()?;
        Some(ScreenshotRef {
            tab_id: tab,
            timestamp: *captured,
        })
    }
}
