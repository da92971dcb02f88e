use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    error::{Result, TraceError},
    vec3::Vec3,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Started,
    Added,
    Removed,
    Updated,
    /// Any record the tracer emitted that we do not interpret (e.g. `properties`).
    Other(String),
}

impl EventKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "started" => EventKind::Started,
            "add" => EventKind::Added,
            "kill" => EventKind::Removed,
            "update" => EventKind::Updated,
            other => EventKind::Other(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            EventKind::Started => "started",
            EventKind::Added => "add",
            EventKind::Removed => "kill",
            EventKind::Updated => "update",
            EventKind::Other(tag) => tag,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ObjectType {
    Avatar,
    Prim,
    Attachment,
    Terse,
    #[default]
    Other,
}

impl ObjectType {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "avatar" => ObjectType::Avatar,
            "prim" => ObjectType::Prim,
            "attachment" => ObjectType::Attachment,
            "terse" => ObjectType::Terse,
            _ => ObjectType::Other,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ObjectType::Avatar => "avatar",
            ObjectType::Prim => "prim",
            ObjectType::Attachment => "attachment",
            ObjectType::Terse => "terse",
            ObjectType::Other => "other",
        }
    }
}

/// One decoded trace record.
///
/// `time` is seconds since the start of the capture. Identity and hierarchy
/// fields are optional because most record kinds only carry a subset.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub time: f64,
    pub object_id: Option<Uuid>,
    pub local_id: Option<u32>,
    pub parent_id: Option<Uuid>,
    pub parent_local_id: Option<u32>,
    pub object_type: ObjectType,
    pub position: Option<Vec3>,
    /// Wall-clock label of a `started` record whose time is not a delta.
    pub started_at: Option<String>,
}

impl Event {
    pub fn new(kind: EventKind, time: f64) -> Self {
        Self {
            kind,
            time,
            object_id: None,
            local_id: None,
            parent_id: None,
            parent_local_id: None,
            object_type: ObjectType::Other,
            position: None,
            started_at: None,
        }
    }

    pub fn with_object(mut self, id: Uuid) -> Self {
        self.object_id = Some(id);
        self
    }

    pub fn with_local(mut self, local_id: u32) -> Self {
        self.local_id = Some(local_id);
        self
    }

    pub fn with_parent(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_parent_local(mut self, parent_local_id: u32) -> Self {
        self.parent_local_id = Some(parent_local_id);
        self
    }

    pub fn with_type(mut self, object_type: ObjectType) -> Self {
        self.object_type = object_type;
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }

    pub fn is_addition(&self) -> bool {
        self.kind == EventKind::Added
    }

    pub fn is_removal(&self) -> bool {
        self.kind == EventKind::Removed
    }

    /// Decode a single JSON record. `index` is only used for error reporting.
    pub fn from_record(index: usize, record: Value) -> Result<Self> {
        let raw: RawRecord =
            serde_json::from_value(record).map_err(|e| TraceError::MalformedRecord {
                index,
                reason: e.to_string(),
            })?;

        let tag = raw.event.ok_or_else(|| TraceError::MalformedRecord {
            index,
            reason: "missing `event` field".to_string(),
        })?;
        let time_str = raw.time.ok_or_else(|| TraceError::MalformedRecord {
            index,
            reason: "missing `time` field".to_string(),
        })?;

        let position = match &raw.pos {
            Some(pos) => Some(pos.to_vec3().ok_or_else(|| TraceError::MalformedRecord {
                index,
                reason: "non-numeric position component".to_string(),
            })?),
            None => None,
        };

        let kind = EventKind::from_tag(&tag);
        let (time, started_at) = match (parse_time(&time_str), &kind) {
            (Some(t), _) => (t, None),
            // The tracer stamps the start record with a wall-clock string.
            (None, EventKind::Started) => (0.0, Some(time_str)),
            (None, _) => {
                return Err(TraceError::MalformedRecord {
                    index,
                    reason: format!("unparseable time {time_str:?}"),
                });
            }
        };

        Ok(Self {
            kind,
            time,
            object_id: raw.id,
            local_id: raw.local,
            parent_id: raw.parent,
            parent_local_id: raw.parent_local,
            object_type: raw
                .object_type
                .as_deref()
                .map(ObjectType::from_tag)
                .unwrap_or_default(),
            position,
            started_at,
        })
    }

    /// Re-encode in the tracer's record layout.
    pub fn to_record(&self) -> Value {
        let mut map = Map::new();
        map.insert("event".into(), Value::from(self.kind.tag()));
        let time = match &self.started_at {
            Some(label) => label.clone(),
            None => format_time(self.time),
        };
        map.insert("time".into(), Value::from(time));
        if let Some(id) = self.object_id {
            map.insert("id".into(), Value::from(id.to_string()));
        }
        if let Some(local) = self.local_id {
            map.insert("local".into(), Value::from(local));
        }
        if let Some(parent) = self.parent_id {
            map.insert("parent".into(), Value::from(parent.to_string()));
        }
        if let Some(parent_local) = self.parent_local_id {
            map.insert("parent_local".into(), Value::from(parent_local));
        }
        if self.object_type != ObjectType::Other {
            map.insert("type".into(), Value::from(self.object_type.tag()));
        }
        if let Some(pos) = self.position {
            map.insert(
                "pos".into(),
                serde_json::json!({ "x": pos.x, "y": pos.y, "z": pos.z }),
            );
        }
        Value::Object(map)
    }
}

/// Parse a `"<number>ms"` delta into seconds.
pub fn parse_time(value: &str) -> Option<f64> {
    let millis = value.trim().strip_suffix("ms")?;
    millis
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|ms| ms.is_finite())
        .map(|ms| ms / 1000.0)
}

/// Format seconds as the tracer's `"<number>ms"` delta.
pub fn format_time(seconds: f64) -> String {
    format!("{}ms", seconds * 1000.0)
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    event: Option<String>,
    time: Option<String>,
    id: Option<Uuid>,
    local: Option<u32>,
    parent: Option<Uuid>,
    parent_local: Option<u32>,
    #[serde(rename = "type")]
    object_type: Option<String>,
    #[serde(alias = "position")]
    pos: Option<RawVec3>,
}

#[derive(Debug, Deserialize)]
struct RawVec3 {
    x: Component,
    y: Component,
    z: Component,
}

/// The tracer writes vector components as strings; hand-written traces use numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Component {
    Number(f64),
    Text(String),
}

impl Component {
    fn value(&self) -> Option<f64> {
        match self {
            Component::Number(n) => Some(*n),
            Component::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl RawVec3 {
    fn to_vec3(&self) -> Option<Vec3> {
        Some(Vec3::new(self.x.value()?, self.y.value()?, self.z.value()?))
    }
}
