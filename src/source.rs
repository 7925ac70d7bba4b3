use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::debug;
use trajectory_core::{DatasetSource, FetchError};

/// Dataset files read from a local directory.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsSource { root: root.into() }
    }
}

impl DatasetSource for FsSource {
    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        let full = self.root.join(path);
        debug!(path = %full.display(), "reading dataset file");
        std::fs::read_to_string(&full).map_err(|e| match e.kind() {
            ErrorKind::NotFound => FetchError::NotFound {
                path: full.display().to_string(),
            },
            _ => FetchError::Transport {
                path: full.display().to_string(),
                message: e.to_string(),
            },
        })
    }
}
