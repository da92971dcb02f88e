//! Nearest-time parent resolution.
//!
//! When a child object is registered before its parent's local id is known,
//! the tracer only records `parent_local`. Local ids are reused over the
//! lifetime of a simulator, so several objects may have held that id; the
//! one registered closest in time to the child is taken as the parent.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::event::Event;

/// Outcome of a parent fill pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParentFill {
    pub resolved: usize,
    /// Events with a local parent id for which no object ever held that id.
    pub unresolved: usize,
}

/// Fill `parent_id` on addition events that only carry `parent_local_id`.
///
/// `additions` holds indices into `events` of every addition event, in
/// trace order. Ties on the time delta go to the earliest candidate.
pub fn fill_missing_parents(events: &mut [Event], additions: &[usize]) -> ParentFill {
    let mut pending: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for &idx in additions {
        let event = &events[idx];
        if event.parent_id.is_some() {
            continue;
        }
        if let Some(parent_local) = event.parent_local_id {
            pending.entry(parent_local).or_default().push(idx);
        }
    }

    let mut fill = ParentFill::default();

    for (parent_local, children) in pending {
        let candidates: Vec<(f64, Uuid)> = additions
            .iter()
            .map(|&idx| &events[idx])
            .filter(|e| e.local_id == Some(parent_local))
            .filter_map(|e| e.object_id.map(|id| (e.time, id)))
            .collect();

        trace!(
            parent_local,
            candidates = candidates.len(),
            children = children.len(),
            "resolving local parent id"
        );

        for child in children {
            let added_at = events[child].time;
            let own_id = events[child].object_id;

            let best = nearest_candidate(&candidates, added_at, own_id);

            match best {
                Some(parent_id) => {
                    debug!(?own_id, %parent_id, parent_local, "filled parent");
                    events[child].parent_id = Some(parent_id);
                    fill.resolved += 1;
                }
                None => fill.unresolved += 1,
            }
        }
    }

    fill
}

fn nearest_candidate(candidates: &[(f64, Uuid)], added_at: f64, own_id: Option<Uuid>) -> Option<Uuid> {
    let mut best: Option<(f64, Uuid)> = None;
    for &(time, id) in candidates {
        if Some(id) == own_id {
            continue;
        }
        let delta = (time - added_at).abs();
        match best {
            Some((best_delta, _)) if best_delta <= delta => {}
            _ => best = Some((delta, id)),
        }
    }
    best.map(|(_, id)| id)
}
