//! Location resolution and bilingual dataset merging for the trajectory map.
//!
//! Shared by the CLI and the browser viewer. Nothing here touches the
//! filesystem or the network directly; data comes in through a
//! [`DatasetSource`].

pub mod coords;
pub mod error;
pub mod group;
pub mod load;
pub mod locale;
pub mod merge;
pub mod model;
pub mod source;
pub mod state;
pub mod stats;

pub use coords::{CoordinateIndex, Resolution, format_label, lookup_key};
pub use error::{DataLoadError, FetchError};
pub use group::{LocationGroup, Visit, VisitSummary, VisitType, group_events_by_location};
pub use load::{load_index, load_trajectory};
pub use locale::Locale;
pub use merge::{attach_coordinates, merge_documents, parse_events_document};
pub use model::{
    Coord, Diagnostics, EventsDocument, LocationDescriptor, MergedDataset, MovementKind,
    ProcessedEvent, RawEvent,
};
pub use source::{DataLayout, DatasetSource, MemorySource};
pub use state::{AppState, LoadSequence, LoadTicket};
pub use stats::TrajectoryStats;
