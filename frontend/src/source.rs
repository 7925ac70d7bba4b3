use gloo_net::http::Request;
use trajectory_core::{DatasetSource, FetchError};

/// Dataset files served next to the app, fetched with `GET /{path}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpSource;

impl DatasetSource for HttpSource {
    async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        let transport = |e: gloo_net::Error| FetchError::Transport {
            path: path.to_string(),
            message: e.to_string(),
        };

        let resp = Request::get(&format!("/{path}"))
            .send()
            .await
            .map_err(transport)?;

        match resp.status() {
            200..=299 => resp.text().await.map_err(transport),
            404 => Err(FetchError::NotFound {
                path: path.to_string(),
            }),
            status => Err(FetchError::Status {
                path: path.to_string(),
                status,
            }),
        }
    }
}
