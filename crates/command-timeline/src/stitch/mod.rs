pub mod compress;
pub mod segments;

pub use compress::compress;
pub use segments::{build_spans, RawSpan, SpanKind, TimelineWindow};
