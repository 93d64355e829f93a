use super::segments::{RawSpan, SpanKind};
use crate::model::{CompressedSegment, SegmentKind};
use tracing::trace;

/// Assigns scrubber positions to `spans` in one forward pass.
///
/// Intervals map 1:1. Gaps up to `max_visible_gap_ms` are kept verbatim; longer ones
/// stay in the table with zero compressed width. Returns the segments and the total
/// compressed runtime.
pub fn compress(spans: &[RawSpan], max_visible_gap_ms: u64) -> (Vec<CompressedSegment>, i64) {
    let ceiling = i64::try_from(max_visible_gap_ms).unwrap_or(i64::MAX);
    let mut segments = Vec::with_capacity(spans.len());
    let mut running = 0i64;

    for span in spans {
        let len = span.len_ms();
        let (kind, contributed) = match span.kind {
            SpanKind::Interval => (SegmentKind::Command, len),
            SpanKind::Gap if len <= ceiling => (SegmentKind::VisibleGap, len),
            SpanKind::Gap => {
                trace!(start = span.start, end = span.end, len, "eliding idle gap");
                (SegmentKind::ElidedGap, 0)
            }
        };
        segments.push(CompressedSegment {
            start: span.start,
            end: span.end,
            relative_start: running,
            relative_end: running + contributed,
            kind,
        });
        running += contributed;
    }

    (segments, running)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_gaps_collapse_short_gaps_stay() {
        let spans = vec![
            RawSpan::interval(500, 600),
            RawSpan::gap(600, 601),
            RawSpan::interval(601, 610),
            RawSpan::gap(610, 1500),
            RawSpan::interval(1500, 1510),
        ];
        let (segments, runtime) = compress(&spans, 500);

        assert_eq!(runtime, 120);
        let kinds: Vec<_> = segments.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SegmentKind::Command,
                SegmentKind::VisibleGap,
                SegmentKind::Command,
                SegmentKind::ElidedGap,
                SegmentKind::Command,
            ]
        );
        assert_eq!(segments[3].relative_start, 110);
        assert_eq!(segments[3].relative_end, 110);
        assert_eq!(segments[4].relative_start, 110);
        assert_eq!(segments[4].relative_end, 120);
    }

    #[test]
    fn gap_at_ceiling_is_kept() {
        let spans = vec![
            RawSpan::interval(0, 10),
            RawSpan::gap(10, 20),
            RawSpan::interval(20, 30),
        ];
        let (segments, runtime) = compress(&spans, 10);
        assert_eq!(runtime, 30);
        assert_eq!(segments[1].kind, SegmentKind::VisibleGap);

        let (segments, runtime) = compress(&spans, 9);
        assert_eq!(runtime, 20);
        assert!(segments[1].is_elided());
    }

    #[test]
    fn runtime_matches_sum_of_contributions() {
        let spans = vec![
            RawSpan::gap(0, 3),
            RawSpan::interval(3, 8),
            RawSpan::interval(8, 9),
            RawSpan::gap(9, 5000),
        ];
        let (segments, runtime) = compress(&spans, 100);
        let total: i64 = segments.iter().map(|s| s.compressed_ms()).sum();
        assert_eq!(runtime, total);
        assert_eq!(runtime, 9);
        assert_eq!(segments[3].real_ms(), 4991);
        assert_eq!(segments[3].compressed_ms(), 0);
    }
}
