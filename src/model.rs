//! Domain types shared by the gateway, the session and the views.
//!
//! Everything the model sends back is untrusted, so the `Deserialize` impls
//! here are lenient: bad rooms and sources are dropped individually instead
//! of failing the whole reply.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Title used when a citation arrives without one.
pub const UNTITLED_SOURCE: &str = "Search Result";

/// Bounding box edge used when the model omits or garbles one.
pub const DEFAULT_EXTENT: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One turn of the transcript. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            layout: None,
            sources: Vec::new(),
        }
    }

    pub fn model(text: impl Into<String>, layout: Option<LayoutData>, sources: Vec<Source>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
            layout,
            sources,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Living,
    Bedroom,
    Kitchen,
    Bathroom,
    Hallway,
    Outdoor,
    Office,
    Dining,
    #[default]
    Other,
}

impl RoomType {
    pub fn all() -> [RoomType; 9] {
        [
            RoomType::Living,
            RoomType::Bedroom,
            RoomType::Kitchen,
            RoomType::Bathroom,
            RoomType::Hallway,
            RoomType::Outdoor,
            RoomType::Office,
            RoomType::Dining,
            RoomType::Other,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::Living => "living",
            RoomType::Bedroom => "bedroom",
            RoomType::Kitchen => "kitchen",
            RoomType::Bathroom => "bathroom",
            RoomType::Hallway => "hallway",
            RoomType::Outdoor => "outdoor",
            RoomType::Office => "office",
            RoomType::Dining => "dining",
            RoomType::Other => "other",
        }
    }

    /// Unknown names fall back to `Other`.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        Self::all()
            .into_iter()
            .find(|t| t.as_str() == name)
            .unwrap_or_default()
    }
}

impl<'de> Deserialize<'de> for RoomType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(value.as_str().map(RoomType::from_name).unwrap_or_default())
    }
}

/// A room positioned in percentages (0-100) of the layout bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(rename = "type", default)]
    pub kind: RoomType,
}

impl Room {
    /// `x + width <= 100` and `y + height <= 100`. Not enforced anywhere.
    pub fn fits_bounds(&self) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.x + self.width <= 100.0
            && self.y + self.height <= 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutData {
    #[serde(deserialize_with = "lenient_rooms")]
    pub rooms: Vec<Room>,
    #[serde(deserialize_with = "extent")]
    pub total_width: f64,
    #[serde(deserialize_with = "extent")]
    pub total_height: f64,
    #[serde(
        default,
        deserialize_with = "non_empty_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
}

impl LayoutData {
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Width over height of the bounding box.
    pub fn aspect_ratio(&self) -> f64 {
        self.total_width / self.total_height
    }

    /// Distinct room types in order of first appearance.
    pub fn room_types(&self) -> Vec<RoomType> {
        let mut seen = Vec::new();
        for room in &self.rooms {
            if !seen.contains(&room.kind) {
                seen.push(room.kind);
            }
        }
        seen
    }
}

/// A citation attached to a model turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub url: String,
}

impl Source {
    /// Missing titles get a placeholder; a missing or empty url drops the entry.
    pub fn from_parts(title: Option<&str>, url: Option<&str>) -> Option<Self> {
        let url = url.map(str::trim).filter(|u| !u.is_empty())?;
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(UNTITLED_SOURCE);
        Some(Self {
            title: title.to_string(),
            url: url.to_string(),
        })
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        Self::from_parts(
            value.get("title").and_then(Value::as_str),
            value.get("url").and_then(Value::as_str),
        )
    }
}

/// Decodes a list of citations, dropping the unusable ones.
pub fn lenient_sources(value: Option<&Value>) -> Vec<Source> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Source::from_value).collect())
        .unwrap_or_default()
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn lenient_rooms<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Room>, D::Error> {
    let items = Vec::<Value>::deserialize(deserializer)?;
    let total = items.len();
    let rooms: Vec<Room> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Room>(item) {
            Ok(room) => Some(room),
            Err(err) => {
                warn!(error = %err, "dropping malformed room");
                None
            }
        })
        .collect();
    if rooms.len() < total {
        warn!(kept = rooms.len(), total, "layout contained malformed rooms");
    }
    let outside = rooms.iter().filter(|room| !room.fits_bounds()).count();
    if outside > 0 {
        debug!(outside, "keeping rooms that extend past the layout bounds");
    }
    Ok(rooms)
}

fn extent<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_f64()
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(DEFAULT_EXTENT))
}

fn non_empty_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string))
}
