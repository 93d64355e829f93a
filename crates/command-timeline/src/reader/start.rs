use timetravel_core_types::{CommandRecord, EpochMillis, LoadStatus, NavigationRecord};
use tracing::debug;

/// First observable activity of a run.
///
/// A client-side start always wins. Without one, an http request issued while the first
/// command was running marks where the browser actually got busy.
pub fn select_start_time(
    first: &CommandRecord,
    navigations: &[NavigationRecord],
    align_to_http_request: bool,
) -> EpochMillis {
    if let Some(client_start) = first.client_start_date {
        return client_start;
    }
    if align_to_http_request {
        if let Some(requested) = http_request_within(first, navigations) {
            debug!(
                command = %first.id,
                run_start = first.run_start_date,
                requested,
                "aligning timeline start to first http request"
            );
            return requested;
        }
    }
    first.run_start_date
}

fn http_request_within(
    first: &CommandRecord,
    navigations: &[NavigationRecord],
) -> Option<EpochMillis> {
    navigations
        .iter()
        .filter_map(|nav| nav.status_time(LoadStatus::HttpRequested))
        .filter(|ts| *ts >= first.run_start_date && *ts <= first.end_date)
        .min()
}
