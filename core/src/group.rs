use serde::Serialize;
use std::collections::HashMap;

use crate::coords::coord_key;
use crate::locale::Locale;
use crate::model::{Coord, MovementKind, ProcessedEvent};

// ── Visit types ──────────────────────────────────────────────────────────

/// What an event did at a given location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VisitType {
    Birth,
    Activity,
    /// Arrived here at the end of a move
    Destination,
    /// Left from here at the start of a move
    Start,
    /// Passed through on the way
    Transit,
}

impl VisitType {
    pub fn label(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Self::Birth, Locale::Zh) => "出生",
            (Self::Activity, Locale::Zh) => "活动",
            (Self::Destination, Locale::Zh) => "到达",
            (Self::Start, Locale::Zh) => "出发",
            (Self::Transit, Locale::Zh) => "途经",
            (Self::Birth, Locale::En) => "Birth",
            (Self::Activity, Locale::En) => "Activity",
            (Self::Destination, Locale::En) => "Arrival",
            (Self::Start, Locale::En) => "Departure",
            (Self::Transit, Locale::En) => "Transit",
        }
    }

    /// CSS class suffix used by the detail panel.
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Birth => "birth",
            Self::Activity => "activity",
            Self::Destination => "destination",
            Self::Start => "start",
            Self::Transit => "transit",
        }
    }
}

// ── Groups ───────────────────────────────────────────────────────────────

/// One event's visit to a location.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub event_index: usize,
    pub visit_type: VisitType,
    pub label: &'static str,
    pub date: String,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
}

/// All visits to one coordinate pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationGroup {
    pub key: String,
    pub coordinates: Coord,
    pub location: String,
    pub visits: Vec<Visit>,
    /// Distinct `movementType` tags seen here, first-seen order
    pub movement_types: Vec<String>,
}

/// Per-type visit counts for the detail panel header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VisitSummary {
    pub total: usize,
    pub birth: usize,
    pub arrive: usize,
    pub depart: usize,
    pub transit: usize,
    pub activity: usize,
}

impl VisitSummary {
    /// Non-zero counts as `(type, count)`, in panel display order.
    pub fn parts(&self) -> Vec<(VisitType, usize)> {
        [
            (VisitType::Birth, self.birth),
            (VisitType::Destination, self.arrive),
            (VisitType::Start, self.depart),
            (VisitType::Transit, self.transit),
            (VisitType::Activity, self.activity),
        ]
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .collect()
    }
}

impl LocationGroup {
    pub fn summary(&self) -> VisitSummary {
        let mut s = VisitSummary {
            total: self.visits.len(),
            ..Default::default()
        };
        for v in &self.visits {
            match v.visit_type {
                VisitType::Birth => s.birth += 1,
                VisitType::Destination => s.arrive += 1,
                VisitType::Start => s.depart += 1,
                VisitType::Transit => s.transit += 1,
                VisitType::Activity => s.activity += 1,
            }
        }
        s
    }

    /// Visits ordered by event index (stable for visits of one event).
    pub fn visits_by_index(&self) -> Vec<&Visit> {
        let mut visits: Vec<&Visit> = self.visits.iter().collect();
        visits.sort_by_key(|v| v.event_index);
        visits
    }

    pub fn contains_event(&self, index: usize) -> bool {
        self.visits.iter().any(|v| v.event_index == index)
    }
}

struct Grouper {
    locale: Locale,
    groups: Vec<LocationGroup>,
    by_key: HashMap<String, usize>,
}

impl Grouper {
    fn add(&mut self, coord: Coord, location: &str, event: &ProcessedEvent, visit_type: VisitType) {
        let key = coord_key(&coord);
        let slot = match self.by_key.get(&key) {
            Some(&i) => i,
            None => {
                self.groups.push(LocationGroup {
                    key: key.clone(),
                    coordinates: coord,
                    location: location.to_string(),
                    visits: Vec::new(),
                    movement_types: Vec::new(),
                });
                self.by_key.insert(key, self.groups.len() - 1);
                self.groups.len() - 1
            }
        };

        let group = &mut self.groups[slot];
        group.visits.push(Visit {
            event_index: event.index,
            visit_type,
            label: visit_type.label(self.locale),
            date: event.raw.date.clone(),
            event: event.raw.event.clone(),
            age: event.raw.age.as_ref().map(|a| a.to_string()),
        });
        if !group.movement_types.contains(&event.raw.movement_type) {
            group.movement_types.push(event.raw.movement_type.clone());
        }
    }
}

/// Group events `0..=max_index` by the coordinates they touch.
///
/// Births and local activities count once at their end location. Directed
/// moves count as a departure from the start, a transit at each resolved
/// stop and an arrival at the end; when start and end coincide the move
/// counts once as an activity. Groups come back in first-visit order.
///
/// The in-place case is intentionally a single activity, not a departure
/// plus an arrival at the same spot.
pub fn group_events_by_location(
    events: &[ProcessedEvent],
    max_index: usize,
    locale: Locale,
) -> Vec<LocationGroup> {
    let mut grouper = Grouper {
        locale,
        groups: Vec::new(),
        by_key: HashMap::new(),
    };

    let bound = match events.len() {
        0 => return Vec::new(),
        n => max_index.min(n - 1),
    };

    for event in &events[..=bound] {
        let end = event.end_coords.zip(event.end_location.as_deref());

        match event.movement_kind() {
            MovementKind::Birth => {
                if let Some((coord, location)) = end {
                    grouper.add(coord, location, event, VisitType::Birth);
                }
            }
            MovementKind::LocalActivity => {
                if let Some((coord, location)) = end {
                    grouper.add(coord, location, event, VisitType::Activity);
                }
            }
            MovementKind::Directed => {
                let start = event.start_coords.zip(event.start_location.as_deref());
                if let (Some((s, s_loc)), Some((e, _))) = (start, end)
                    && coord_key(&s) == coord_key(&e)
                {
                    grouper.add(s, s_loc, event, VisitType::Activity);
                    continue;
                }
                if let Some((coord, location)) = start {
                    grouper.add(coord, location, event, VisitType::Start);
                }
                for (coord, location) in event.transit_coords.iter().zip(&event.transit_locations) {
                    grouper.add(*coord, location, event, VisitType::Transit);
                }
                if let Some((coord, location)) = end {
                    grouper.add(coord, location, event, VisitType::Destination);
                }
            }
        }
    }

    grouper.groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawEvent;

    fn processed(
        index: usize,
        movement_type: &str,
        start: Option<(Coord, &str)>,
        end: Option<(Coord, &str)>,
        transit: &[(Coord, &str)],
    ) -> ProcessedEvent {
        ProcessedEvent {
            raw: RawEvent {
                date: format!("d{index}"),
                event: format!("e{index}"),
                movement_type: movement_type.to_string(),
                ..Default::default()
            },
            index,
            start_coords: start.map(|s| s.0),
            start_location: start.map(|s| s.1.to_string()),
            end_coords: end.map(|e| e.0),
            end_location: end.map(|e| e.1.to_string()),
            transit_coords: transit.iter().map(|t| t.0).collect(),
            transit_locations: transit.iter().map(|t| t.1.to_string()).collect(),
        }
    }

    const SHAOSHAN: (Coord, &str) = ([112.52, 27.92], "湖南省 湘潭市 韶山市");
    const CHANGSHA: (Coord, &str) = ([112.94, 28.23], "湖南省 长沙市");
    const BEIJING: (Coord, &str) = ([116.40, 39.90], "北京");
    const WUHAN: (Coord, &str) = ([114.30, 30.59], "湖北省 武汉市");

    fn sample() -> Vec<ProcessedEvent> {
        vec![
            processed(0, "出生", Some(SHAOSHAN), Some(SHAOSHAN), &[]),
            processed(1, "长途迁移", Some(SHAOSHAN), Some(CHANGSHA), &[]),
            processed(2, "原地活动", Some(CHANGSHA), Some(CHANGSHA), &[]),
            processed(3, "长途迁移", Some(CHANGSHA), Some(BEIJING), &[WUHAN]),
            processed(4, "长途迁移", Some(BEIJING), Some(CHANGSHA), &[]),
        ]
    }

    fn find<'a>(groups: &'a [LocationGroup], location: &str) -> &'a LocationGroup {
        groups.iter().find(|g| g.location == location).unwrap()
    }

    #[test]
    fn test_groups_in_first_visit_order() {
        let groups = group_events_by_location(&sample(), 4, Locale::Zh);
        let order: Vec<&str> = groups.iter().map(|g| g.location.as_str()).collect();
        assert_eq!(
            order,
            ["湖南省 湘潭市 韶山市", "湖南省 长沙市", "湖北省 武汉市", "北京"]
        );
    }

    #[test]
    fn test_visit_types_per_role() {
        let groups = group_events_by_location(&sample(), 4, Locale::Zh);

        let shaoshan = find(&groups, "湖南省 湘潭市 韶山市");
        let types: Vec<VisitType> = shaoshan.visits.iter().map(|v| v.visit_type).collect();
        assert_eq!(types, [VisitType::Birth, VisitType::Start]);

        let changsha = find(&groups, "湖南省 长沙市");
        let s = changsha.summary();
        assert_eq!(s.total, 4);
        assert_eq!((s.arrive, s.activity, s.depart), (2, 1, 1));
        assert_eq!(changsha.movement_types, ["长途迁移", "原地活动"]);

        let wuhan = find(&groups, "湖北省 武汉市");
        assert_eq!(wuhan.visits[0].visit_type, VisitType::Transit);
        assert_eq!(wuhan.visits[0].label, "途经");
    }

    #[test]
    fn test_bound_is_inclusive_and_clamped() {
        let events = sample();
        let groups = group_events_by_location(&events, 1, Locale::Zh);
        assert_eq!(groups.len(), 2);
        assert!(!groups.iter().any(|g| g.contains_event(2)));

        let all = group_events_by_location(&events, 99, Locale::Zh);
        assert_eq!(all, group_events_by_location(&events, 4, Locale::Zh));
        assert!(group_events_by_location(&[], 3, Locale::Zh).is_empty());
    }

    #[test]
    fn test_directed_move_in_place_counts_once() {
        let events = vec![processed(0, "Long-distance Move", Some(BEIJING), Some(BEIJING), &[])];
        let groups = group_events_by_location(&events, 0, Locale::En);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].visits.len(), 1);
        assert_eq!(groups[0].visits[0].visit_type, VisitType::Activity);
        assert_eq!(groups[0].visits[0].label, "Activity");
    }

    #[test]
    fn test_unplotted_events_are_skipped() {
        let events = vec![
            processed(0, "出生", None, None, &[]),
            processed(1, "长途迁移", None, Some(CHANGSHA), &[]),
        ];
        let groups = group_events_by_location(&events, 1, Locale::Zh);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].visits[0].visit_type, VisitType::Destination);
    }

    #[test]
    fn test_english_movement_tags_classified() {
        let events = vec![
            processed(0, "Birth", Some(SHAOSHAN), Some(SHAOSHAN), &[]),
            processed(1, "Local Activity", Some(SHAOSHAN), Some(SHAOSHAN), &[]),
        ];
        let groups = group_events_by_location(&events, 1, Locale::En);
        let s = groups[0].summary();
        assert_eq!((s.birth, s.activity), (1, 1));
        assert_eq!(
            s.parts(),
            vec![(VisitType::Birth, 1), (VisitType::Activity, 1)]
        );
    }

    #[test]
    fn test_visits_by_index_sorted() {
        let groups = group_events_by_location(&sample(), 4, Locale::Zh);
        let changsha = find(&groups, "湖南省 长沙市");
        let idx: Vec<usize> = changsha.visits_by_index().iter().map(|v| v.event_index).collect();
        assert_eq!(idx, [1, 2, 3, 4]);
    }
}
