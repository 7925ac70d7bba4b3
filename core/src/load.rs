use tracing::{info, warn};

use crate::coords::{CoordinateIndex, RegionsDocument};
use crate::error::DataLoadError;
use crate::locale::Locale;
use crate::merge::{attach_coordinates, merge_documents, parse_events_document};
use crate::model::{EventsDocument, MergedDataset};
use crate::source::{DataLayout, DatasetSource};

/// Load the reference geography and build the coordinate index.
///
/// Never fails. If the file cannot be fetched or parsed, the index falls back
/// to the international table so foreign places still resolve.
pub async fn load_index<S: DatasetSource>(source: &S, layout: &DataLayout) -> CoordinateIndex {
    let path = layout.regions_path();
    let text = match source.fetch(&path).await {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "reference geography unavailable, using international table only");
            return CoordinateIndex::international_only();
        }
    };
    match serde_json::from_str::<RegionsDocument>(&text) {
        Ok(doc) => CoordinateIndex::from_regions(&doc.regions),
        Err(e) => {
            warn!(%path, error = %e, "reference geography unreadable, using international table only");
            CoordinateIndex::international_only()
        }
    }
}

async fn load_document<S: DatasetSource>(
    source: &S,
    layout: &DataLayout,
    locale: Locale,
) -> Result<EventsDocument, DataLoadError> {
    let dataset = locale.tag();
    let text = source
        .fetch(&layout.events_path(locale))
        .await
        .map_err(|e| DataLoadError::Fetch {
            dataset: dataset.to_string(),
            source: e,
        })?;
    parse_events_document(dataset, &text)
}

/// Load the events for `locale`, ready for rendering.
///
/// The base-language dataset is always fetched first because it carries the
/// place names the index is keyed by. For any other locale the translated
/// dataset is fetched afterwards and merged onto it by position.
pub async fn load_trajectory<S: DatasetSource>(
    source: &S,
    layout: &DataLayout,
    locale: Locale,
    index: &CoordinateIndex,
) -> Result<MergedDataset, DataLoadError> {
    let primary = load_document(source, layout, Locale::BASE).await?;

    let (document, length_mismatch) = if locale.is_base() {
        (primary, None)
    } else {
        let secondary = load_document(source, layout, locale).await?;
        merge_documents(&primary, secondary)
    };

    let mut dataset = attach_coordinates(document, locale, index);
    dataset.diagnostics.length_mismatch = length_mismatch;

    info!(
        %locale,
        events = dataset.len(),
        unresolved = dataset.diagnostics.resolution_misses.len(),
        "trajectory loaded"
    );
    Ok(dataset)
}
