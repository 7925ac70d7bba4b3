use crate::group::{LocationGroup, group_events_by_location};
use crate::locale::Locale;
use crate::model::{MergedDataset, ProcessedEvent};
use crate::stats::TrajectoryStats;

/// Token for one in-flight load. Only the newest ticket may apply its
/// result; older ones are dropped when they finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    pub locale: Locale,
}

/// Issues [`LoadTicket`]s and decides which finished load may apply.
///
/// Covers every load, including the first one made before any
/// [`AppState`] exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSequence {
    generation: u64,
}

impl LoadSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a load. Invalidates every earlier ticket.
    pub fn begin(&mut self, locale: Locale) -> LoadTicket {
        self.generation += 1;
        LoadTicket {
            generation: self.generation,
            locale,
        }
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Claim the right to apply `ticket`'s result (data or error).
    /// False for a stale ticket; a ticket is claimed at most once.
    pub fn finish(&mut self, ticket: LoadTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.generation += 1;
        true
    }
}

/// Everything the viewer needs to know about where it is on the timeline.
///
/// Owned by the rendering layer; the loaders and resolvers stay pure.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    dataset: MergedDataset,
    current: usize,
    previous: usize,
    highlighted: Option<usize>,
}

impl AppState {
    pub fn new(dataset: MergedDataset) -> Self {
        AppState {
            dataset,
            current: 0,
            previous: 0,
            highlighted: None,
        }
    }

    pub fn dataset(&self) -> &MergedDataset {
        &self.dataset
    }

    pub fn locale(&self) -> Locale {
        self.dataset.locale
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn previous_index(&self) -> usize {
        self.previous
    }

    pub fn current_event(&self) -> Option<&ProcessedEvent> {
        self.dataset.get(self.current)
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    /// Jump to `index`, clamped to the dataset. Returns the index shown.
    pub fn show(&mut self, index: usize) -> usize {
        let target = index.min(self.dataset.last_index().unwrap_or(0));
        if target != self.current {
            self.previous = self.current;
            self.current = target;
        }
        self.current
    }

    pub fn step_forward(&mut self) -> bool {
        let before = self.current;
        self.show(self.current + 1) != before
    }

    pub fn step_back(&mut self) -> bool {
        let before = self.current;
        self.show(self.current.saturating_sub(1)) != before
    }

    /// Toggle the path highlight for `index`. Returns whether it is now on.
    pub fn toggle_highlight(&mut self, index: usize) -> bool {
        if self.highlighted == Some(index) {
            self.highlighted = None;
            false
        } else {
            self.highlighted = Some(index);
            true
        }
    }

    pub fn clear_highlight(&mut self) {
        self.highlighted = None;
    }

    /// Location groups up to and including the current event.
    pub fn groups(&self) -> Vec<LocationGroup> {
        group_events_by_location(&self.dataset.events, self.current, self.locale())
    }

    pub fn stats(&self) -> TrajectoryStats {
        TrajectoryStats::compute(&self.dataset.events, self.current)
    }

    /// Swap in a reloaded dataset (e.g. after a language switch).
    ///
    /// The timeline position is kept, clamped to the new length, and the
    /// highlight is cleared.
    pub fn replace_dataset(&mut self, dataset: MergedDataset) {
        let saved = self.current;
        self.dataset = dataset;
        self.current = saved.min(self.dataset.last_index().unwrap_or(0));
        self.previous = self.current.saturating_sub(1);
        self.highlighted = None;
    }
}
