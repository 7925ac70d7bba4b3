use serde_json::Value;
use tracing::warn;

use crate::coords::CoordinateIndex;
use crate::error::DataLoadError;
use crate::locale::Locale;
use crate::model::{
    Diagnostics, EventsDocument, LengthMismatch, LocationDescriptor, LocationRole, MergedDataset,
    ProcessedEvent, RawEvent, ResolutionMiss,
};

/// Parse an events file and check it holds a non-empty `events` array.
///
/// `dataset` names the file in errors ("zh", "en").
pub fn parse_events_document(dataset: &str, text: &str) -> Result<EventsDocument, DataLoadError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| DataLoadError::format(dataset, format!("invalid JSON: {e}")))?;

    match value.get("events") {
        None => return Err(DataLoadError::format(dataset, "missing `events`")),
        Some(Value::Array(events)) if events.is_empty() => {
            return Err(DataLoadError::format(dataset, "`events` is empty"));
        }
        Some(Value::Array(_)) => {}
        Some(_) => return Err(DataLoadError::format(dataset, "`events` is not an array")),
    }

    serde_json::from_value(value)
        .map_err(|e| DataLoadError::format(dataset, format!("unexpected record shape: {e}")))
}

/// Pair secondary (translated) events with primary (base) events by position.
///
/// Every field comes from the secondary record except `coordinates`, which is
/// taken from the primary record at the same index. Secondary records past the
/// end of the primary sequence get no coordinates. Output length and order are
/// the secondary's.
pub fn merge_documents(
    primary: &EventsDocument,
    secondary: EventsDocument,
) -> (EventsDocument, Option<LengthMismatch>) {
    let mismatch = (primary.events.len() != secondary.events.len()).then(|| LengthMismatch {
        primary: primary.events.len(),
        secondary: secondary.events.len(),
    });
    if let Some(m) = mismatch {
        warn!(
            primary = m.primary,
            secondary = m.secondary,
            "event datasets differ in length; unmatched events will have no coordinates"
        );
    }

    let events = secondary
        .events
        .into_iter()
        .enumerate()
        .map(|(i, translated)| RawEvent {
            coordinates: primary.events.get(i).and_then(|p| p.coordinates.clone()),
            ..translated
        })
        .collect();

    (
        EventsDocument {
            title: secondary.title,
            events,
        },
        mismatch,
    )
}

/// Resolve every location of every event and number the events.
///
/// Unresolved transit stops are dropped. A start with no end is treated as
/// staying put: the end is copied from the start.
pub fn attach_coordinates(
    document: EventsDocument,
    locale: Locale,
    index: &CoordinateIndex,
) -> MergedDataset {
    let mut diagnostics = Diagnostics::default();

    let events = document
        .events
        .into_iter()
        .enumerate()
        .map(|(i, raw)| process_event(i, raw, index, &mut diagnostics))
        .collect();

    MergedDataset {
        title: document.title,
        locale,
        events,
        diagnostics,
    }
}

fn process_event(
    event_index: usize,
    raw: RawEvent,
    index: &CoordinateIndex,
    diagnostics: &mut Diagnostics,
) -> ProcessedEvent {
    let mut processed = ProcessedEvent {
        raw,
        index: event_index,
        start_coords: None,
        end_coords: None,
        start_location: None,
        end_location: None,
        transit_coords: Vec::new(),
        transit_locations: Vec::new(),
    };

    let mut resolve = |role: LocationRole, descriptor: &LocationDescriptor| {
        let r = index.resolve(descriptor);
        if r.coordinates.is_none() {
            diagnostics.resolution_misses.push(ResolutionMiss {
                event_index,
                role,
                key: r.key.clone(),
                label: r.label.clone(),
            });
        }
        r
    };

    if let Some(locations) = &processed.raw.coordinates {
        if let Some(start) = &locations.start {
            let r = resolve(LocationRole::Start, start);
            processed.start_coords = r.coordinates;
            processed.start_location = Some(r.label);
        }
        if let Some(end) = &locations.end {
            let r = resolve(LocationRole::End, end);
            processed.end_coords = r.coordinates;
            processed.end_location = Some(r.label);
        }
        for (i, stop) in locations.transit.iter().enumerate() {
            let r = resolve(LocationRole::Transit(i), stop);
            if let Some(coord) = r.coordinates {
                processed.transit_coords.push(coord);
                processed.transit_locations.push(r.label);
            }
        }
    }

    if processed.end_location.is_none() && processed.start_location.is_some() {
        processed.end_location = processed.start_location.clone();
        processed.end_coords = processed.start_coords;
    }

    processed
}
