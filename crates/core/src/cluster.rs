//! Partitioning a trace into independent sub-traces.
//!
//! Objects are grouped into families (a root and everything parented under
//! it). Families are packed into clusters in root-id order until adding the
//! next family would push a cluster over the event budget. A family is never
//! split across clusters, so each cluster can be assembled on its own.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;
use uuid::Uuid;

use crate::trace::Trace;

/// Split `trace` into sub-traces of roughly at most `max_events` events.
///
/// A family larger than the budget gets a cluster of its own. Events that do
/// not name an object are not carried into clusters. `max_events == 0`
/// returns a single cluster with the whole trace.
pub fn cluster(trace: &Trace, max_events: usize) -> Vec<Trace> {
    if max_events == 0 {
        return vec![trace.clone()];
    }

    let parents = trace.known_parents();

    let mut event_counts: HashMap<Uuid, usize> = HashMap::new();
    for event in trace {
        if let Some(id) = event.object_id {
            *event_counts.entry(id).or_default() += 1;
        }
    }

    // root -> (members, event count)
    let mut families: BTreeMap<Uuid, (BTreeSet<Uuid>, usize)> = BTreeMap::new();
    for (&id, &count) in &event_counts {
        let root = family_root(id, &parents);
        let family = families.entry(root).or_default();
        family.0.insert(id);
        family.1 += count;
    }

    let mut clusters = Vec::new();
    let mut members = BTreeSet::new();
    let mut budget_used = 0;

    for (_, (family, count)) in families {
        if budget_used > 0 && budget_used + count > max_events {
            clusters.push(trace.subtrace_of(&members));
            members.clear();
            budget_used = 0;
        }
        members.extend(family);
        budget_used += count;
    }
    if !members.is_empty() {
        clusters.push(trace.subtrace_of(&members));
    }

    debug!(
        clusters = clusters.len(),
        max_events, "partitioned trace into clusters"
    );
    clusters
}

/// Walk up the parent chain. Cycles stop at the object where they close.
fn family_root(id: Uuid, parents: &HashMap<Uuid, Option<Uuid>>) -> Uuid {
    let mut current = id;
    let mut visited = BTreeSet::from([id]);
    while let Some(Some(parent)) = parents.get(&current) {
        if !visited.insert(*parent) {
            break;
        }
        current = *parent;
    }
    current
}
