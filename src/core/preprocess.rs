//! Preprocessor: raw backend groups → sorted, partitioned domain groups
//!
//! Pure transformation, rerun from scratch on every poll.

use super::model::{GpuSample, RawGroup, RawWorkstation, Workstation, WorkstationGroup};
use tracing::trace;

/// Group that is always listed first
pub const SHARED_GROUP: &str = "Shared";

const NANOS_PER_SECOND: f64 = 1e9;

/// Build display-ready groups from a raw payload
///
/// - GPUs ordered by uuid, workstations by name
/// - within a group, free workstations precede busy ones (stable partition,
///   name order kept inside each half)
/// - `"Shared"` first, remaining groups by name
pub fn preprocess(raw_groups: Vec<RawGroup>) -> Vec<WorkstationGroup> {
    let mut groups: Vec<WorkstationGroup> = raw_groups.into_iter().map(preprocess_group).collect();
    groups.sort_by(|a, b| {
        (a.name != SHARED_GROUP)
            .cmp(&(b.name != SHARED_GROUP))
            .then_with(|| a.name.cmp(&b.name))
    });
    groups
}

fn preprocess_group(raw: RawGroup) -> WorkstationGroup {
    let mut workstations: Vec<Workstation> =
        raw.workstations.into_iter().map(preprocess_workstation).collect();
    workstations.sort_by(|a, b| a.name.cmp(&b.name));

    let (free, busy): (Vec<_>, Vec<_>) = workstations.into_iter().partition(|w| w.free);
    trace!(group = %raw.name, free = free.len(), busy = busy.len(), "Group partitioned");

    let mut workstations = free;
    workstations.extend(busy);

    WorkstationGroup {
        name: raw.name,
        workstations,
    }
}

fn preprocess_workstation(raw: RawWorkstation) -> Workstation {
    let mut gpus: Vec<GpuSample> = raw.gpus.into_iter().map(GpuSample::from).collect();
    gpus.sort_by(|a, b| a.uuid.cmp(&b.uuid));
    let free = !gpus.iter().any(|g| g.in_use);

    Workstation {
        name: raw.name,
        cpu: raw.cpu,
        motherboard: raw.motherboard,
        notes: raw.notes,
        owner: raw.owner,
        last_seen_seconds: raw.last_seen as f64 / NANOS_PER_SECOND,
        gpus,
        free,
    }
}
