use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::locale::Locale;

/// `[longitude, latitude]`
pub type Coord = [f64; 2];

/// Country value treated as "domestic": its places are keyed by
/// province/city/district rather than by country name.
pub const DOMESTIC_COUNTRY: &str = "中国";

/// Label used when a descriptor carries no usable place fields.
pub const UNKNOWN_LOCATION: &str = "未知地点";

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `[lng, lat]` from a JSON value, if it is exactly two finite numbers.
pub fn coord_from_value(value: &Value) -> Option<Coord> {
    let pair = value.as_array()?;
    if pair.len() != 2 {
        return None;
    }
    let lng = pair[0].as_f64()?;
    let lat = pair[1].as_f64()?;
    (lng.is_finite() && lat.is_finite()).then_some([lng, lat])
}

// ── Location descriptor ──────────────────────────────────────────────────

/// A structured place reference as it appears in the event datasets.
///
/// Either the administrative fields or a direct `coordinates` pair (or both).
/// A valid direct pair always wins for coordinate purposes; anything else in
/// `coordinates` is ignored and the administrative fields are looked up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Value>,
}

impl LocationDescriptor {
    pub fn country(&self) -> Option<&str> {
        non_empty(&self.country)
    }

    pub fn province(&self) -> Option<&str> {
        non_empty(&self.province)
    }

    pub fn city(&self) -> Option<&str> {
        non_empty(&self.city)
    }

    pub fn district(&self) -> Option<&str> {
        non_empty(&self.district)
    }

    /// The direct `coordinates` pair, if present and well formed.
    pub fn direct_coord(&self) -> Option<Coord> {
        self.coordinates.as_ref().and_then(coord_from_value)
    }

    /// True when the country field names somewhere other than the domestic
    /// sentinel, which switches keying to `country city`.
    pub fn is_foreign(&self) -> bool {
        self.country().is_some_and(|c| c != DOMESTIC_COUNTRY)
    }
}

// Empty strings in the datasets mean "not given".
fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// The `coordinates` object of a raw event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventLocations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<LocationDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<LocationDescriptor>,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub transit: Vec<LocationDescriptor>,
}

// ── Raw events ───────────────────────────────────────────────────────────

/// Age at the time of an event. Datasets use plain numbers, but some
/// entries carry free text such as "约30".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Age {
    Years(u32),
    Number(f64),
    Text(String),
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Age::Years(y) => write!(f, "{y}"),
            Age::Number(n) => write!(f, "{n}"),
            Age::Text(t) => f.write_str(t),
        }
    }
}

/// One timeline entry as stored in a per-language events file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    /// Free-text description
    #[serde(default, deserialize_with = "null_as_default")]
    pub event: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub movement_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<Age>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<EventLocations>,
    /// Fields this crate does not interpret; carried through merges untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawEvent {
    pub fn movement_kind(&self) -> MovementKind {
        MovementKind::classify(&self.movement_type)
    }
}

/// A whole events file: `{ "title": ..., "events": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventsDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    pub events: Vec<RawEvent>,
}

// ── Movement kinds ───────────────────────────────────────────────────────

/// Coarse classification of the free-form `movementType` tag.
///
/// Tags are written in the dataset's own language, so both the Chinese and
/// the English spellings are recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MovementKind {
    /// 出生
    Birth,
    /// 原地活动: stayed in one place
    LocalActivity,
    /// Anything else: travel from start to end, possibly via transit stops
    Directed,
}

impl MovementKind {
    pub fn classify(tag: &str) -> Self {
        match tag.trim() {
            "出生" | "Birth" => Self::Birth,
            "原地活动" | "Local Activity" => Self::LocalActivity,
            _ => Self::Directed,
        }
    }
}

// ── Processed events ─────────────────────────────────────────────────────

/// A raw event with its locations resolved against the coordinate index.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedEvent {
    #[serde(flatten)]
    pub raw: RawEvent,
    /// Position in the dataset. Stable identity for all UI state.
    pub index: usize,
    pub start_coords: Option<Coord>,
    pub end_coords: Option<Coord>,
    pub start_location: Option<String>,
    pub end_location: Option<String>,
    pub transit_coords: Vec<Coord>,
    /// Labels for `transit_coords`, same length and order.
    pub transit_locations: Vec<String>,
}

impl ProcessedEvent {
    pub fn movement_kind(&self) -> MovementKind {
        self.raw.movement_kind()
    }

    /// Whether any endpoint of the event can be drawn on a map.
    pub fn is_plotted(&self) -> bool {
        self.start_coords.is_some() || self.end_coords.is_some()
    }
}

/// Which part of an event a location descriptor came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "role", content = "stop", rename_all = "camelCase")]
pub enum LocationRole {
    Start,
    End,
    Transit(usize),
}

impl fmt::Display for LocationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationRole::Start => f.write_str("start"),
            LocationRole::End => f.write_str("end"),
            LocationRole::Transit(i) => write!(f, "transit[{i}]"),
        }
    }
}

/// A descriptor that matched no coordinate entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionMiss {
    pub event_index: usize,
    pub role: LocationRole,
    /// Lookup key that was tried, if one could be built
    pub key: Option<String>,
    pub label: String,
}

/// Secondary and primary datasets of different lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LengthMismatch {
    pub primary: usize,
    pub secondary: usize,
}

/// Non-fatal findings from loading a dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub resolution_misses: Vec<ResolutionMiss>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length_mismatch: Option<LengthMismatch>,
}

impl Diagnostics {
    pub fn is_clean(&self) -> bool {
        self.resolution_misses.is_empty() && self.length_mismatch.is_none()
    }
}

/// The dataset handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedDataset {
    pub title: String,
    pub locale: Locale,
    pub events: Vec<ProcessedEvent>,
    pub diagnostics: Diagnostics,
}

impl MergedDataset {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ProcessedEvent> {
        self.events.get(index)
    }

    pub fn last_index(&self) -> Option<usize> {
        self.events.len().checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_event_keeps_unknown_fields() {
        let json = r#"{
            "date": "1893年12月26日",
            "event": "出生于湖南湘潭韶山冲",
            "movementType": "出生",
            "age": 0,
            "visitNote": "故居",
            "coordinates": { "start": { "province": "湖南省", "city": "湘潭市" } }
        }"#;
        let ev: RawEvent = serde_json::from_str(json).unwrap();
        assert_eq!(ev.movement_kind(), MovementKind::Birth);
        assert_eq!(ev.age, Some(Age::Years(0)));
        assert_eq!(ev.extra.get("visitNote"), Some(&Value::from("故居")));

        let back = serde_json::to_value(&ev).unwrap();
        assert_eq!(back["visitNote"], "故居");
        assert_eq!(back["movementType"], "出生");
    }

    #[test]
    fn test_age_variants() {
        let ages: Vec<Age> = serde_json::from_str(r#"[24, 0.5, "约30"]"#).unwrap();
        assert_eq!(ages[0], Age::Years(24));
        assert_eq!(ages[1].to_string(), "0.5");
        assert_eq!(ages[2].to_string(), "约30");
    }

    #[test]
    fn test_empty_fields_count_as_absent() {
        let d = LocationDescriptor {
            country: Some(String::new()),
            city: Some("长沙市".into()),
            ..Default::default()
        };
        assert_eq!(d.country(), None);
        assert!(!d.is_foreign());
        assert_eq!(d.city(), Some("长沙市"));
    }

    #[test]
    fn test_null_fields_read_as_defaults() {
        let json = r#"{
            "date": null,
            "event": null,
            "movementType": null,
            "coordinates": { "start": { "city": "长沙市" }, "end": null, "transit": null }
        }"#;
        let ev: RawEvent = serde_json::from_str(json).unwrap();
        assert_eq!(ev.date, "");
        assert_eq!(ev.event, "");
        assert_eq!(ev.movement_kind(), MovementKind::Directed);
        let locations = ev.coordinates.unwrap();
        assert!(locations.end.is_none());
        assert!(locations.transit.is_empty());

        let doc: EventsDocument = serde_json::from_str(r#"{"title": null, "events": []}"#).unwrap();
        assert_eq!(doc.title, "");
    }

    #[test]
    fn test_malformed_direct_coordinates_are_ignored() {
        let cases = [
            r#"[112.9, 28.2, 0.0]"#,
            r#"[112.9]"#,
            r#"["112.9", "28.2"]"#,
            r#"{"lng": 112.9}"#,
        ];
        for raw in cases {
            let json = format!(r#"{{ "province": "湖南省", "coordinates": {raw} }}"#);
            let d: LocationDescriptor = serde_json::from_str(&json).unwrap();
            assert_eq!(d.direct_coord(), None, "{raw}");
            assert_eq!(d.province(), Some("湖南省"));
        }

        let d: LocationDescriptor = serde_json::from_str(r#"{ "coordinates": [112.9, 28.2] }"#).unwrap();
        assert_eq!(d.direct_coord(), Some([112.9, 28.2]));
    }

    #[test]
    fn test_movement_kind_both_languages() {
        assert_eq!(MovementKind::classify("出生"), MovementKind::Birth);
        assert_eq!(MovementKind::classify("Birth"), MovementKind::Birth);
        assert_eq!(MovementKind::classify("原地活动"), MovementKind::LocalActivity);
        assert_eq!(
            MovementKind::classify("Local Activity"),
            MovementKind::LocalActivity
        );
        assert_eq!(MovementKind::classify("长途迁移"), MovementKind::Directed);
    }
}
