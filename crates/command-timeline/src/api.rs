use crate::errors::{TlError, TlResult};
use crate::model::{
    CommandTimelineEntry, CompressedSegment, NavigationState, NavigationTick, ScreenshotRef,
};
use crate::policy::{current_policy, TimelinePolicyHandle, TimelinePolicyView};
use crate::ports::ScreenshotPort;
use crate::reader::{resolve_run, select_start_time};
use crate::stitch::{build_spans, compress, TimelineWindow};
use serde::Serialize;
use timetravel_core_types::{CommandRecord, EpochMillis, NavigationRecord, TabId};
use tracing::debug;

/// Numeric form of "this timestamp has no place on the scrubber".
pub const UNMAPPED_OFFSET: f64 = -1.0;

pub struct CommandTimelineBuilder<'a> {
    commands: &'a [CommandRecord],
    run: u32,
    navigations: &'a [NavigationRecord],
    waypoints: &'a [EpochMillis],
    policy: Option<TimelinePolicyView>,
}

impl<'a> CommandTimelineBuilder<'a> {
    pub fn new(commands: &'a [CommandRecord], run: u32) -> Self {
        Self {
            commands,
            run,
            navigations: &[],
            waypoints: &[],
            policy: None,
        }
    }

    pub fn navigations(mut self, navigations: &'a [NavigationRecord]) -> Self {
        self.navigations = navigations;
        self
    }

    /// Ascending timestamps. The first pins the timeline start, the last (when there are
    /// at least two) pins its end, and the ones in between split the command they hit.
    pub fn waypoints(mut self, waypoints: &'a [EpochMillis]) -> Self {
        self.waypoints = waypoints;
        self
    }

    pub fn policy(mut self, policy: TimelinePolicyView) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Reads the policy currently held by `handle`, for callers that keep their own.
    pub fn policy_handle(self, handle: &TimelinePolicyHandle) -> Self {
        self.policy(handle.snapshot())
    }

    pub fn build(self) -> TlResult<CommandTimeline> {
        let policy = self.policy.unwrap_or_else(current_policy);
        CommandTimeline::assemble(
            self.commands,
            self.run,
            self.navigations,
            self.waypoints,
            &policy,
        )
    }
}

/// Compressed playback timeline for one run of a recorded session.
#[derive(Debug, Clone, Serialize)]
pub struct CommandTimeline {
    run: u32,
    start_time: EpochMillis,
    end_time: EpochMillis,
    runtime_ms: i64,
    commands: Vec<CommandTimelineEntry>,
    segments: Vec<CompressedSegment>,
    navigation_ticks: Vec<NavigationTick>,
    #[serde(skip)]
    navigations: Vec<NavigationRecord>,
    #[serde(skip)]
    screenshot_max_age_ms: Option<u64>,
}

impl CommandTimeline {
    pub fn new(
        commands: &[CommandRecord],
        run: u32,
        navigations: &[NavigationRecord],
    ) -> TlResult<Self> {
        CommandTimelineBuilder::new(commands, run)
            .navigations(navigations)
            .build()
    }

    pub fn builder(commands: &[CommandRecord], run: u32) -> CommandTimelineBuilder<'_> {
        CommandTimelineBuilder::new(commands, run)
    }

    fn assemble(
        commands: &[CommandRecord],
        run: u32,
        navigations: &[NavigationRecord],
        waypoints: &[EpochMillis],
        policy: &TimelinePolicyView,
    ) -> TlResult<Self> {
        for command in commands {
            command.validate()?;
        }
        if waypoints.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(TlError::InvalidArg("waypoints must be in ascending order".into()));
        }

        let resolved = resolve_run(commands, run);
        let pinned_start = waypoints.first().copied();
        let pinned_end = if waypoints.len() >= 2 {
            waypoints.last().copied()
        } else {
            None
        };

        let start_time = match (pinned_start, resolved.first()) {
            (Some(pinned), _) => pinned,
            (None, Some(first)) => {
                select_start_time(first, navigations, policy.align_start_to_http_request)
            }
            (None, None) => 0,
        };
        let end_time = pinned_end
            .or_else(|| resolved.iter().map(|c| c.end_date).max())
            .unwrap_or(start_time)
            .max(start_time);
        let window = TimelineWindow {
            start: start_time,
            end: end_time,
            pinned_start: pinned_start.is_some(),
        };

        let splits = if waypoints.len() > 2 {
            &waypoints[1..waypoints.len() - 1]
        } else {
            &[][..]
        };
        let spans = if resolved.is_empty() {
            Vec::new()
        } else {
            build_spans(&resolved, &window, splits)
        };
        let (segments, runtime_ms) = compress(&spans, policy.max_visible_gap_ms);

        let mut timeline = Self {
            run,
            start_time,
            end_time,
            runtime_ms,
            commands: Vec::new(),
            segments,
            navigation_ticks: Vec::new(),
            navigations: navigations.to_vec(),
            screenshot_max_age_ms: policy.screenshot_max_age_ms,
        };
        timeline.commands = timeline.command_entries(resolved, &window);
        timeline.navigation_ticks = timeline.collect_ticks();

        debug!(
            run,
            commands = timeline.commands.len(),
            segments = timeline.segments.len(),
            elided = timeline.elided_gap_count(),
            hidden_idle_ms = timeline
                .segments
                .iter()
                .filter(|s| s.is_elided())
                .map(CompressedSegment::real_ms)
                .sum::<i64>(),
            runtime_ms,
            start_time,
            end_time,
            "command timeline built"
        );
        Ok(timeline)
    }

    fn command_entries(
        &self,
        resolved: Vec<CommandRecord>,
        window: &TimelineWindow,
    ) -> Vec<CommandTimelineEntry> {
        let mut latest_end: Option<EpochMillis> = None;
        let mut entries = Vec::with_capacity(resolved.len());
        for (idx, command) in resolved.into_iter().enumerate() {
            let command_gap_ms = latest_end
                .map(|end| (command.run_start_date - end).max(0))
                .unwrap_or(0);
            latest_end = latest_end.max(Some(command.end_date));

            let begin = if idx == 0 && !window.pinned_start {
                self.start_time
            } else {
                command.run_start_date.clamp(self.start_time, self.end_time)
            };
            entries.push(CommandTimelineEntry {
                relative_start_ms: self.scrubber_position(begin),
                command_gap_ms,
                command,
            });
        }
        entries
    }

    fn collect_ticks(&self) -> Vec<NavigationTick> {
        let mut ticks: Vec<NavigationTick> = self
            .navigations
            .iter()
            .flat_map(|nav| {
                nav.status_changes
                    .iter()
                    .filter(|(status, _)| status.is_visual_milestone())
                    .filter_map(move |(status, timestamp)| {
                        let offset_percent = self.offset_for_timestamp(*timestamp)?;
                        Some(NavigationTick {
                            navigation_id: nav.id,
                            url: nav.url.clone(),
                            status: *status,
                            timestamp: *timestamp,
                            offset_percent,
                        })
                    })
            })
            .collect();
        ticks.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.navigation_id.cmp(&b.navigation_id))
                .then_with(|| a.status.cmp(&b.status))
        });
        ticks
    }

    pub fn run(&self) -> u32 {
        self.run
    }

    pub fn start_time(&self) -> EpochMillis {
        self.start_time
    }

    pub fn end_time(&self) -> EpochMillis {
        self.end_time
    }

    pub fn runtime_ms(&self) -> i64 {
        self.runtime_ms
    }

    pub fn commands(&self) -> &[CommandTimelineEntry] {
        &self.commands
    }

    pub fn segments(&self) -> &[CompressedSegment] {
        &self.segments
    }

    pub fn navigation_ticks(&self) -> &[NavigationTick] {
        &self.navigation_ticks
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn elided_gap_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_elided()).count()
    }

    /// Scrubber percentage (one decimal) for a real timestamp.
    ///
    /// `None` when `timestamp` lies outside the timeline or strictly inside an elided gap.
    /// A timeline with zero runtime (no commands, or only instantaneous ones) has no
    /// scrubber to map onto, so every timestamp is `None`, `start_time` included.
    pub fn offset_for_timestamp(&self, timestamp: EpochMillis) -> Option<f64> {
        if self.runtime_ms == 0 {
            return None;
        }
        let millis = self.compressed_millis_at(timestamp)?;
        Some(percent_of(millis, self.runtime_ms))
    }

    /// Same as [`Self::offset_for_timestamp`], with [`UNMAPPED_OFFSET`] in place of `None`.
    pub fn offset_or_unmapped(&self, timestamp: EpochMillis) -> f64 {
        self.offset_for_timestamp(timestamp).unwrap_or(UNMAPPED_OFFSET)
    }

    /// Real timestamp shown at `percent` of the scrubber. Out-of-range input is clamped.
    pub fn timestamp_for_offset(&self, percent: f64) -> EpochMillis {
        if self.runtime_ms == 0 {
            return self.start_time;
        }
        let percent = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };
        let target = percent / 100.0 * self.runtime_ms as f64;

        let idx = self
            .segments
            .partition_point(|s| (s.relative_end as f64) < target);
        match self.segments[idx..].iter().find(|s| !s.is_elided()) {
            Some(segment) => {
                let into = (target - segment.relative_start as f64).round() as i64;
                (segment.start + into).min(segment.end)
            }
            None => self.end_time,
        }
    }

    pub fn offset_for_runtime_millis(&self, millis: i64) -> f64 {
        if self.runtime_ms == 0 {
            return 0.0;
        }
        percent_of(millis, self.runtime_ms)
    }

    /// Page the user was looking at by `timestamp`, with the last milestone it had reached.
    pub fn navigation_state_at(&self, timestamp: EpochMillis) -> Option<NavigationState> {
        self.navigations
            .iter()
            .filter_map(|nav| {
                let started = nav.started_at()?;
                let (status, reached) = nav.status_at(timestamp)?;
                Some((started, nav, status, reached))
            })
            .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)))
            .map(|(_, nav, status, status_reached_at)| NavigationState {
                navigation_id: nav.id,
                tab_id: nav.tab_id,
                url: nav.url.clone(),
                status,
                status_reached_at,
            })
    }

    pub fn navigation_state_at_offset(&self, percent: f64) -> Option<NavigationState> {
        self.navigation_state_at(self.timestamp_for_offset(percent))
    }

    /// Screenshot of `tab` to display at `percent`, if the store has one close enough.
    ///
    /// The age limit applies in both directions, so a port may hand back a capture taken
    /// just after the scrubbed instant.
    pub fn screenshot_at_offset<P>(
        &self,
        port: &P,
        tab: TabId,
        percent: f64,
    ) -> Option<ScreenshotRef>
    where
        P: ScreenshotPort + ?Sized,
    {
        let timestamp = self.timestamp_for_offset(percent);
        let shot = port.image_at(tab, timestamp)?;
        match self.screenshot_max_age_ms {
            Some(max_age) if timestamp.abs_diff(shot.timestamp) > max_age => None,
            _ => Some(shot),
        }
    }

    fn segment_at(&self, timestamp: EpochMillis) -> Option<&CompressedSegment> {
        let idx = self.segments.partition_point(|s| s.end < timestamp);
        self.segments.get(idx)
    }

    // Mapped segments are 1:1, so the compressed position is a plain shift.
    fn compressed_millis_at(&self, timestamp: EpochMillis) -> Option<i64> {
        if timestamp < self.start_time || timestamp > self.end_time {
            return None;
        }
        let segment = self.segment_at(timestamp)?;
        if segment.is_elided() {
            if timestamp > segment.start && timestamp < segment.end {
                return None;
            }
            return Some(segment.relative_start);
        }
        Some(segment.relative_start + (timestamp - segment.start))
    }

    fn scrubber_position(&self, timestamp: EpochMillis) -> i64 {
        match self.segment_at(timestamp) {
            Some(segment) if segment.is_elided() => segment.relative_start,
            Some(segment) => segment.relative_start + (timestamp - segment.start).max(0),
            None => 0,
        }
    }
}

fn percent_of(part: i64, whole: i64) -> f64 {
    (part as f64 * 1000.0 / whole as f64).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline(commands: &[CommandRecord]) -> CommandTimeline {
        CommandTimeline::builder(commands, 0)
            .policy(TimelinePolicyView::default())
            .build()
            .unwrap()
    }

    #[test]
    fn percent_rounds_to_one_decimal() {
        assert_eq!(percent_of(110, 120), 91.7);
        assert_eq!(percent_of(50, 60), 83.3);
        assert_eq!(percent_of(60, 120), 50.0);
        assert_eq!(percent_of(120, 120), 100.0);
    }

    #[test]
    fn rejects_descending_waypoints() {
        let commands = vec![CommandRecord::new(1, 0, 0, 10)];
        let err = CommandTimeline::builder(&commands, 0)
            .waypoints(&[5, 3])
            .policy(TimelinePolicyView::default())
            .build()
            .unwrap_err();
        assert!(matches!(err, TlError::InvalidArg(_)));
    }

    #[test]
    fn rejects_negative_duration_even_in_other_runs() {
        let commands = vec![
            CommandRecord::new(1, 0, 0, 10),
            CommandRecord::new(1, 4, 30, 20),
        ];
        let err = CommandTimeline::builder(&commands, 0)
            .policy(TimelinePolicyView::default())
            .build()
            .unwrap_err();
        assert!(matches!(err, TlError::InvalidRecord(_)));
    }

    #[test]
    fn elided_gap_boundaries_stay_mapped() {
        let t = timeline(&[
            CommandRecord::new(1, 0, 0, 10),
            CommandRecord::new(2, 0, 2_000, 2_010),
        ]);
        assert_eq!(t.runtime_ms(), 20);
        assert_eq!(t.elided_gap_count(), 1);
        assert_eq!(t.offset_for_timestamp(10), Some(50.0));
        assert_eq!(t.offset_for_timestamp(11), None);
        assert_eq!(t.offset_for_timestamp(1_999), None);
        assert_eq!(t.offset_for_timestamp(2_000), Some(50.0));
        assert_eq!(t.timestamp_for_offset(75.0), 2_005);
    }

    #[test]
    fn contained_command_starts_inside_its_host() {
        let t = timeline(&[
            CommandRecord::new(1, 0, 0, 100),
            CommandRecord::new(2, 0, 40, 50),
            CommandRecord::new(3, 0, 103, 110),
        ]);
        let entries = t.commands();
        assert_eq!(entries[1].relative_start_ms, 40);
        assert_eq!(entries[1].command_gap_ms, 0);
        assert_eq!(entries[2].command_gap_ms, 3);
        assert_eq!(entries[2].relative_start_ms, 103);
        assert_eq!(t.runtime_ms(), 110);
    }

    #[test]
    fn instantaneous_command_has_nothing_to_map() {
        let t = timeline(&[CommandRecord::new(1, 0, 500, 500)]);
        assert!(!t.is_empty());
        assert_eq!(t.runtime_ms(), 0);
        assert_eq!(t.start_time(), 500);
        assert_eq!(t.end_time(), 500);
        assert_eq!(t.offset_for_timestamp(500), None);
        assert_eq!(t.offset_or_unmapped(500), UNMAPPED_OFFSET);
        assert_eq!(t.timestamp_for_offset(50.0), 500);
        assert_eq!(t.offset_for_runtime_millis(0), 0.0);
    }

    #[test]
    fn builder_reads_policy_from_handle() {
        let handle = TimelinePolicyHandle::isolated(TimelinePolicyView::default());
        let commands = vec![
            CommandRecord::new(1, 0, 0, 100),
            CommandRecord::new(2, 0, 400, 500),
        ];
        let relaxed = CommandTimeline::builder(&commands, 0)
            .policy_handle(&handle)
            .build()
            .unwrap();
        assert_eq!(relaxed.runtime_ms(), 500);

        handle.replace(TimelinePolicyView {
            max_visible_gap_ms: 100,
            ..TimelinePolicyView::default()
        });
        let tight = CommandTimeline::builder(&commands, 0)
            .policy_handle(&handle)
            .build()
            .unwrap();
        assert_eq!(tight.runtime_ms(), 200);
        assert_eq!(tight.elided_gap_count(), 1);
    }
}
