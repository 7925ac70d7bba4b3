use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::FetchError;
use crate::locale::Locale;

/// Where dataset files live relative to a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    /// Directory (or URL prefix) holding the files; empty for none
    pub root: String,
    pub regions_file: String,
    /// Events files are `{stem}.json` for the base language and
    /// `{stem}_{tag}.json` for translations.
    pub events_stem: String,
}

impl Default for DataLayout {
    fn default() -> Self {
        DataLayout {
            root: "data".to_string(),
            regions_file: "china_regions_coordinates.json".to_string(),
            events_stem: "trajectory_events".to_string(),
        }
    }
}

impl DataLayout {
    pub fn regions_path(&self) -> String {
        self.join(&self.regions_file)
    }

    pub fn events_path(&self, locale: Locale) -> String {
        if locale.is_base() {
            self.join(&format!("{}.json", self.events_stem))
        } else {
            self.join(&format!("{}_{}.json", self.events_stem, locale.tag()))
        }
    }

    fn join(&self, file: &str) -> String {
        let root = self.root.trim_end_matches('/');
        if root.is_empty() {
            file.to_string()
        } else {
            format!("{root}/{file}")
        }
    }
}

/// Something that can hand back the text of a dataset file.
///
/// The CLI reads from disk, the browser viewer over HTTP. Paths come from
/// [`DataLayout`].
#[allow(async_fn_in_trait)]
pub trait DatasetSource {
    async fn fetch(&self, path: &str) -> Result<String, FetchError>;
}

/// In-memory files keyed by path. Records every path requested.
#[derive(Debug, Default)]
pub struct MemorySource {
    files: HashMap<String, String>,
    requested: RefCell<Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }

    /// Paths passed to `fetch`, in call order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.borrow().clone()
    }
}

impl DatasetSource for MemorySource {
    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        self.requested.borrow_mut().push(path.to_string());
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                path: path.to_string(),
            })
    }
}
