use timetravel_core_types::{CommandRecord, EpochMillis};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Interval,
    Gap,
}

/// A real-time stretch before any compression decision has been made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSpan {
    pub start: EpochMillis,
    pub end: EpochMillis,
    pub kind: SpanKind,
}

impl RawSpan {
    pub fn interval(start: EpochMillis, end: EpochMillis) -> Self {
        Self {
            start,
            end,
            kind: SpanKind::Interval,
        }
    }

    pub fn gap(start: EpochMillis, end: EpochMillis) -> Self {
        Self {
            start,
            end,
            kind: SpanKind::Gap,
        }
    }

    pub fn len_ms(&self) -> i64 {
        self.end - self.start
    }
}

/// Real-time bounds of the addressable timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineWindow {
    pub start: EpochMillis,
    pub end: EpochMillis,
    /// Set when a waypoint fixed `start`; the first command is then clipped instead of stretched.
    pub pinned_start: bool,
}

/// Lays resolved commands out on the real timeline.
///
/// Commands are clipped to `window`, overlaps are folded into the earlier command, and
/// every stretch of idle time inside the window becomes a [`SpanKind::Gap`]. Each entry
/// of `splits` lying strictly inside an interval cuts it in two.
pub fn build_spans(
    commands: &[CommandRecord],
    window: &TimelineWindow,
    splits: &[EpochMillis],
) -> Vec<RawSpan> {
    let mut spans = Vec::with_capacity(commands.len() * 2 + 1);
    let mut cursor = window.start;

    for (idx, command) in commands.iter().enumerate() {
        let begin = if idx == 0 && !window.pinned_start {
            window.start
        } else {
            command.run_start_date.max(cursor)
        };
        let end = command.end_date.min(window.end);
        if end <= begin {
            continue;
        }
        if begin > cursor {
            spans.push(RawSpan::gap(cursor, begin));
        }
        spans.push(RawSpan::interval(begin, end));
        cursor = end;
    }

    if cursor < window.end {
        spans.push(RawSpan::gap(cursor, window.end));
    }

    if splits.is_empty() {
        return spans;
    }
    split_intervals(spans, splits)
}

fn split_intervals(spans: Vec<RawSpan>, splits: &[EpochMillis]) -> Vec<RawSpan> {
    let mut out = Vec::with_capacity(spans.len() + splits.len());
    let mut used = 0usize;

    for span in spans {
        if span.kind != SpanKind::Interval {
            out.push(span);
            continue;
        }
        let mut start = span.start;
        for &at in splits.iter().filter(|at| **at > span.start && **at < span.end) {
            if at > start {
                out.push(RawSpan::interval(start, at));
                start = at;
                used += 1;
            }
        }
        out.push(RawSpan::interval(start, span.end));
    }

    if used < splits.len() {
        debug!(
            ignored = splits.len() - used,
            "waypoints outside command intervals ignored"
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(start: EpochMillis, end: EpochMillis) -> TimelineWindow {
        TimelineWindow {
            start,
            end,
            pinned_start: false,
        }
    }

    #[test]
    fn gaps_are_recorded_between_commands() {
        let commands = vec![
            CommandRecord::new(1, 0, 500, 600),
            CommandRecord::new(2, 0, 601, 610),
            CommandRecord::new(3, 0, 1500, 1510),
        ];
        let spans = build_spans(&commands, &window(500, 1510), &[]);
        assert_eq!(
            spans,
            vec![
                RawSpan::interval(500, 600),
                RawSpan::gap(600, 601),
                RawSpan::interval(601, 610),
                RawSpan::gap(610, 1500),
                RawSpan::interval(1500, 1510),
            ]
        );
    }

    #[test]
    fn first_interval_starts_at_window_start() {
        let commands = vec![CommandRecord::new(1, 0, 500, 600)];
        let spans = build_spans(&commands, &window(550, 600), &[]);
        assert_eq!(spans, vec![RawSpan::interval(550, 600)]);

        let spans = build_spans(&commands, &window(490, 600), &[]);
        assert_eq!(spans, vec![RawSpan::interval(490, 600)]);
    }

    #[test]
    fn overlapping_commands_fold_into_earlier_one() {
        let commands = vec![
            CommandRecord::new(1, 0, 0, 100),
            CommandRecord::new(2, 0, 50, 60),
            CommandRecord::new(3, 0, 80, 130),
        ];
        let spans = build_spans(&commands, &window(0, 130), &[]);
        assert_eq!(
            spans,
            vec![RawSpan::interval(0, 100), RawSpan::interval(100, 130)]
        );
    }

    #[test]
    fn pinned_window_clips_commands_and_pads_edges() {
        let commands = vec![
            CommandRecord::new(1, 1, 10, 20),
            CommandRecord::new(2, 1, 21, 30),
            CommandRecord::new(3, 1, 36, 40),
        ];
        let pinned = TimelineWindow {
            start: 35,
            end: 45,
            pinned_start: true,
        };
        let spans = build_spans(&commands, &pinned, &[]);
        assert_eq!(
            spans,
            vec![
                RawSpan::gap(35, 36),
                RawSpan::interval(36, 40),
                RawSpan::gap(40, 45),
            ]
        );
    }

    #[test]
    fn splits_only_cut_intervals() {
        let commands = vec![
            CommandRecord::new(1, 0, 0, 10),
            CommandRecord::new(2, 0, 20, 30),
        ];
        let spans = build_spans(&commands, &window(0, 30), &[5, 5, 15, 25, 30]);
        assert_eq!(
            spans,
            vec![
                RawSpan::interval(0, 5),
                RawSpan::interval(5, 10),
                RawSpan::gap(10, 20),
                RawSpan::interval(20, 25),
                RawSpan::interval(25, 30),
            ]
        );
    }
}
