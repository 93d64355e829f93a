use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use timetravel_core_types::{CommandId, CommandRecord};
use tracing::debug;

/// Picks, for every logical command, the attempt that belongs to `target_run`'s history.
///
/// Records from later runs are ignored. Among the remaining attempts of one command the
/// highest run wins. The output is ordered by start time, then command id.
pub fn resolve_run(commands: &[CommandRecord], target_run: u32) -> Vec<CommandRecord> {
    let mut latest: HashMap<CommandId, &CommandRecord> = HashMap::new();
    for command in commands.iter().filter(|c| c.run <= target_run) {
        match latest.entry(command.id) {
            Entry::Vacant(slot) => {
                slot.insert(command);
            }
            Entry::Occupied(mut slot) => {
                if supersedes(command, slot.get()) {
                    slot.insert(command);
                }
            }
        }
    }

    let mut resolved: Vec<CommandRecord> = latest.into_values().cloned().collect();
    resolved.sort_by(|a, b| match a.run_start_date.cmp(&b.run_start_date) {
        Ordering::Equal => a.id.cmp(&b.id),
        other => other,
    });

    debug!(
        target_run,
        total = commands.len(),
        resolved = resolved.len(),
        "resolved commands for run"
    );
    resolved
}

// Two attempts in the same run break the one-record-per-run contract; the one that
// finished last is taken so the outcome does not depend on input order.
fn supersedes(candidate: &CommandRecord, current: &CommandRecord) -> bool {
    (candidate.run, candidate.end_date, candidate.run_start_date)
        > (current.run, current.end_date, current.run_start_date)
}
