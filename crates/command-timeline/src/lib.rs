pub mod adapters;
pub mod api;
pub mod errors;
pub mod model;
pub mod policy;
pub mod ports;
pub mod reader;
pub mod stitch;

pub use api::{CommandTimeline, CommandTimelineBuilder, UNMAPPED_OFFSET};
pub use errors::{TlError, TlResult};
pub use model::{
    CommandTimelineEntry, CompressedSegment, NavigationState, NavigationTick, ScreenshotRef,
    SegmentKind,
};
pub use policy::{TimelinePolicyHandle, TimelinePolicyView};
