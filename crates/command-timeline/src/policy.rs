use crate::errors::TlResult;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelinePolicyView {
    /// Idle gaps longer than this collapse to zero width on the scrubber.
    pub max_visible_gap_ms: u64,
    pub align_start_to_http_request: bool,
    pub screenshot_max_age_ms: Option<u64>,
}

impl Default for TimelinePolicyView {
    fn default() -> Self {
        Self {
            max_visible_gap_ms: 500,
            align_start_to_http_request: true,
            screenshot_max_age_ms: None,
        }
    }
}

impl TimelinePolicyView {
    pub fn from_json(raw: &str) -> TlResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

static GLOBAL_POLICY: OnceCell<Arc<RwLock<TimelinePolicyView>>> = OnceCell::new();

fn policy_cell() -> Arc<RwLock<TimelinePolicyView>> {
    GLOBAL_POLICY
        .get_or_init(|| Arc::new(RwLock::new(TimelinePolicyView::default())))
        .clone()
}

/// Shared, swappable policy. The global one backs [`current_policy`]; isolated ones let a
/// caller tune its own timelines without touching the process default.
#[derive(Clone)]
pub struct TimelinePolicyHandle {
    view: Arc<RwLock<TimelinePolicyView>>,
}

impl TimelinePolicyHandle {
    pub fn isolated(view: TimelinePolicyView) -> Self {
        Self {
            view: Arc::new(RwLock::new(view)),
        }
    }

    pub fn global() -> Self {
        Self {
            view: policy_cell(),
        }
    }

    pub fn snapshot(&self) -> TimelinePolicyView {
        self.view.read().clone()
    }

    /// Swaps in `view` and returns the one it replaced.
    pub fn replace(&self, view: TimelinePolicyView) -> TimelinePolicyView {
        std::mem::replace(&mut *self.view.write(), view)
    }
}

pub fn set_policy(view: TimelinePolicyView) {
    TimelinePolicyHandle::global().replace(view);
}

pub fn current_policy() -> TimelinePolicyView {
    TimelinePolicyHandle::global().snapshot()
}
