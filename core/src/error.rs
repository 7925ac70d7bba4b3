use thiserror::Error;

/// Failure to obtain the raw bytes of a dataset.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("{path} not found")]
    NotFound { path: String },

    #[error("{path}: HTTP {status}")]
    Status { path: String, status: u16 },

    #[error("{path}: {message}")]
    Transport { path: String, message: String },
}

/// Fatal failure loading an events dataset.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataLoadError {
    #[error("cannot fetch {dataset} dataset: {source}")]
    Fetch {
        dataset: String,
        #[source]
        source: FetchError,
    },

    #[error("{dataset} dataset is malformed: {reason}")]
    Format { dataset: String, reason: String },
}

impl DataLoadError {
    pub fn format(dataset: impl Into<String>, reason: impl Into<String>) -> Self {
        DataLoadError::Format {
            dataset: dataset.into(),
            reason: reason.into(),
        }
    }

    /// Name of the dataset that failed ("zh", "en", ...).
    pub fn dataset(&self) -> &str {
        match self {
            DataLoadError::Fetch { dataset, .. } | DataLoadError::Format { dataset, .. } => dataset,
        }
    }
}
