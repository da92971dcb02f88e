//! Object path traces.
//!
//! A [`Trace`] owns the decoded event list of one capture session and answers
//! structural questions about it: which objects and avatars were seen, which
//! of them are roots of the object hierarchy and who parents whom. The only
//! mutation a trace ever undergoes is the one-time parent fill, see
//! [`Trace::fill_parents`].

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    error::{Result, TraceError},
    event::{Event, EventKind, ObjectType},
    parents::{ParentFill, fill_missing_parents},
};

#[derive(Debug, Clone)]
pub struct Trace {
    events: Vec<Event>,
    start_time: Option<f64>,
    started_at: Option<String>,
    additions: Vec<usize>,
    removals: Vec<usize>,
    objects: BTreeSet<Uuid>,
    avatars: BTreeSet<Uuid>,
    parent_fill: Option<ParentFill>,
}

/// Headline numbers for a trace, as printed by `pathtrace summary`.
#[derive(Debug, Clone, Serialize)]
pub struct TraceSummary {
    pub events: usize,
    pub objects: usize,
    pub avatars: usize,
    pub roots: usize,
    pub unresolved_parents: Option<usize>,
}

impl Trace {
    /// Build a trace from already decoded events.
    ///
    /// The time of the first `started` event becomes the start time unless
    /// `start_time` overrides it.
    pub fn from_events(events: Vec<Event>, start_time: Option<f64>) -> Self {
        let started = events.iter().find(|e| e.kind == EventKind::Started);
        let started_at = started.and_then(|e| e.started_at.clone());
        let start_time = start_time.or(started.map(|e| e.time));

        let mut additions = Vec::new();
        let mut removals = Vec::new();
        let mut objects = BTreeSet::new();
        let mut avatars = BTreeSet::new();

        for (idx, event) in events.iter().enumerate() {
            match event.kind {
                EventKind::Added => {
                    additions.push(idx);
                    if let Some(id) = event.object_id {
                        objects.insert(id);
                        if event.object_type == ObjectType::Avatar {
                            avatars.insert(id);
                        }
                    }
                }
                EventKind::Removed => removals.push(idx),
                _ => {}
            }
        }

        Self {
            events,
            start_time,
            started_at,
            additions,
            removals,
            objects,
            avatars,
            parent_fill: None,
        }
    }

    /// Decode a list of JSON records. Any bad record fails the whole load.
    pub fn from_records(records: Vec<Value>, start_time: Option<f64>) -> Result<Self> {
        let events = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| Event::from_record(index, record))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_events(events, start_time))
    }

    pub fn from_json_str(json: &str, start_time: Option<f64>) -> Result<Self> {
        let records: Vec<Value> =
            serde_json::from_str(json).map_err(|e| TraceError::MalformedTrace {
                reason: format!("expected a JSON array of event records: {e}"),
            })?;
        Self::from_records(records, start_time)
    }

    pub fn start_time(&self) -> Option<f64> {
        self.start_time
    }

    /// Wall-clock label of the capture start, when the tracer recorded one.
    pub fn started_at(&self) -> Option<&str> {
        self.started_at.as_deref()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Ids of every object that has an addition event.
    pub fn objects(&self) -> &BTreeSet<Uuid> {
        &self.objects
    }

    pub fn avatars(&self) -> &BTreeSet<Uuid> {
        &self.avatars
    }

    pub fn addition_events(&self) -> impl Iterator<Item = &Event> + '_ {
        self.additions.iter().map(|&idx| &self.events[idx])
    }

    pub fn removal_events(&self) -> impl Iterator<Item = &Event> + '_ {
        self.removals.iter().map(|&idx| &self.events[idx])
    }

    /// A new trace holding only the events whose subject is `object_id`.
    ///
    /// The start time and parent resolution state are inherited.
    pub fn subtrace(&self, object_id: Uuid) -> Trace {
        self.filtered(|id| id == object_id)
    }

    /// A new trace holding only the events whose subject is in `ids`.
    pub fn subtrace_of(&self, ids: &BTreeSet<Uuid>) -> Trace {
        self.filtered(|id| ids.contains(&id))
    }

    fn filtered(&self, keep: impl Fn(Uuid) -> bool) -> Trace {
        let events = self
            .events
            .iter()
            .filter(|e| e.object_id.is_some_and(&keep))
            .cloned()
            .collect();
        let mut sub = Trace::from_events(events, self.start_time);
        sub.started_at = self.started_at.clone();
        // Parents were resolved against the full trace; a subset has fewer
        // candidates, so it must not resolve again.
        sub.parent_fill = self.parent_fill;
        sub
    }

    /// Objects with at least one addition event that carries no local parent
    /// id. A resolved `parent` alone does not disqualify an object.
    ///
    /// An object added both with and without a local parent id is ambiguous
    /// and is only reported when `include_ambiguous` is set.
    pub fn roots(&self, include_ambiguous: bool) -> BTreeSet<Uuid> {
        // id -> (seen with local parent, seen without)
        let mut seen: HashMap<Uuid, (bool, bool)> = HashMap::new();
        for event in self.addition_events() {
            let Some(id) = event.object_id else {
                continue;
            };
            let entry = seen.entry(id).or_default();
            if event.parent_local_id.is_some() {
                entry.0 = true;
            } else {
                entry.1 = true;
            }
        }

        seen.into_iter()
            .filter(|(_, (with_parent, without_parent))| {
                *without_parent && (!*with_parent || include_ambiguous)
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Resolve missing parent ids from local parent ids.
    ///
    /// Runs at most once per trace; later calls return the first report.
    pub fn fill_parents(&mut self) -> ParentFill {
        if let Some(fill) = self.parent_fill {
            return fill;
        }

        let fill = fill_missing_parents(&mut self.events, &self.additions);
        if fill.unresolved > 0 {
            warn!(
                unresolved = fill.unresolved,
                "objects found with local parent id but no matching object"
            );
        }
        debug!(resolved = fill.resolved, "parent fill complete");

        self.parent_fill = Some(fill);
        fill
    }

    pub fn parents_filled(&self) -> bool {
        self.parent_fill.is_some()
    }

    /// Map of object id to parent id (`None` for roots), after filling parents.
    ///
    /// The first addition event of each object wins; later re-parenting is
    /// not tracked.
    pub fn parent_map(&mut self) -> HashMap<Uuid, Option<Uuid>> {
        self.fill_parents();
        self.known_parents()
    }

    /// Same as [`Trace::parent_map`] without triggering the fill.
    pub fn known_parents(&self) -> HashMap<Uuid, Option<Uuid>> {
        let mut parents = HashMap::new();
        for event in self.addition_events() {
            if let Some(id) = event.object_id {
                parents.entry(id).or_insert(event.parent_id);
            }
        }
        parents
    }

    /// Parent id -> sorted child ids, derived from [`Trace::known_parents`].
    pub fn children(&self) -> HashMap<Uuid, Vec<Uuid>> {
        let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for (child, parent) in self.known_parents() {
            if let Some(parent) = parent {
                children.entry(parent).or_default().push(child);
            }
        }
        for kids in children.values_mut() {
            kids.sort();
        }
        children
    }

    pub fn summary(&self) -> TraceSummary {
        TraceSummary {
            events: self.len(),
            objects: self.objects.len(),
            avatars: self.avatars.len(),
            roots: self.roots(false).len(),
            unresolved_parents: self.parent_fill.map(|f| f.unresolved),
        }
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
