use serde::Serialize;
use std::collections::HashSet;

use crate::coords::coord_key;
use crate::model::{MovementKind, ProcessedEvent};

/// Numbers for the statistics panel, as of one point on the timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectoryStats {
    pub total_events: usize,
    /// Events `0..=upto`
    pub shown_events: usize,
    /// Distinct coordinate pairs touched by the shown events
    pub visited_locations: usize,
    pub directed_moves: usize,
    pub transit_stops: usize,
    /// Shown events with nothing to plot
    pub unresolved_events: usize,
}

impl TrajectoryStats {
    pub fn compute(events: &[ProcessedEvent], upto: usize) -> Self {
        let shown = match events.len() {
            0 => &events[..0],
            n => &events[..=upto.min(n - 1)],
        };

        let mut places = HashSet::new();
        let mut stats = TrajectoryStats {
            total_events: events.len(),
            shown_events: shown.len(),
            ..Default::default()
        };

        for e in shown {
            if !e.is_plotted() {
                stats.unresolved_events += 1;
            }
            if e.movement_kind() == MovementKind::Directed {
                stats.directed_moves += 1;
            }
            stats.transit_stops += e.transit_coords.len();
            places.extend(
                e.start_coords
                    .iter()
                    .chain(e.end_coords.iter())
                    .chain(e.transit_coords.iter())
                    .map(coord_key),
            );
        }
        stats.visited_locations = places.len();
        stats
    }
}
