//! HTTP front-end: HTML pages, JSON API and file download responses.

mod body;
mod error;
mod handlers;
mod templates;

use std::{future::Future, sync::Arc};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use miette::{IntoDiagnostic, WrapErr};
use tokio::net::TcpListener;
use tracing::{info, Span};

use crate::{
    result::Result,
    service::{DownloadRequest, DownloadedFile, Downloader, InfoRequest},
    types::VideoInfo,
};

/// State shared by all the handlers. Immutable once the server is started.
#[derive(Clone)]
pub struct AppState {
    downloader: Arc<Downloader>,
}

impl AppState {
    pub fn new(downloader: Downloader) -> Self {
        Self {
            downloader: Arc::new(downloader),
        }
    }

    async fn list_formats(&self, request: InfoRequest) -> Result<VideoInfo> {
        let downloader = self.downloader.clone();
        run_blocking(move || downloader.list_formats(&request)).await
    }

    async fn fetch(&self, request: DownloadRequest) -> Result<DownloadedFile> {
        let downloader = self.downloader.clone();
        run_blocking(move || downloader.fetch(&request)).await
    }
}

/// Run resolver work on the blocking thread pool, inside the caller's span
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let span = Span::current();
    tokio::task::spawn_blocking(move || span.in_scope(f))
        .await
        .into_diagnostic()
        .wrap_err("Worker thread failed")?
}

pub fn router(state: AppState) -> Router {
    let max_body_bytes = state.downloader.settings().max_body_bytes;

    Router::new()
        .route("/", get(handlers::index))
        .route("/formats", post(handlers::formats))
        .route("/download", post(handlers::download))
        .route("/api/video-info", post(handlers::api_video_info))
        .route("/api/download", post(handlers::api_download))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

/// Serve the application until the shutdown future completes
pub async fn serve<S>(listener: TcpListener, state: AppState, shutdown: S) -> miette::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().into_diagnostic()?;
    info!("Listening on http://{addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .into_diagnostic()
        .wrap_err("HTTP server failed")
}
