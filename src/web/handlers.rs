use askama::Template;
use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    http::Uri,
    response::{Html, Response},
    Form, Json,
};
use miette::{IntoDiagnostic, WrapErr};
use serde::Serialize;
use tracing::{instrument, warn};

use super::{
    body::attachment,
    error::{ApiError, PageError},
    templates::{FormatsPage, IndexPage},
    AppState,
};
use crate::{
    result::Error,
    service::{DownloadRequest, InfoRequest},
    types::VideoInfo,
};

fn render<T: Template>(page: &T) -> Result<Html<String>, PageError> {
    page.render()
        .map(Html)
        .into_diagnostic()
        .wrap_err("Could not render template")
        .map_err(|report| Error::from(report).into())
}

pub async fn index() -> Result<Html<String>, PageError> {
    render(&IndexPage { url: "" })
}

#[instrument(skip_all, name = "formats")]
pub async fn formats(
    State(state): State<AppState>,
    request: Result<Form<InfoRequest>, FormRejection>,
) -> Result<Html<String>, PageError> {
    let Form(request) = request?;
    let info = state.list_formats(request.clone()).await?;
    render(&FormatsPage {
        url: request.url.trim(),
        info: &info,
    })
}

#[instrument(skip_all, name = "download")]
pub async fn download(
    State(state): State<AppState>,
    request: Result<Form<DownloadRequest>, FormRejection>,
) -> Result<Response, PageError> {
    let Form(request) = request?;
    let file = state.fetch(request).await?;
    Ok(attachment(file).await?)
}

#[derive(Debug, Serialize)]
pub struct ApiSuccess<T> {
    success: bool,
    data: T,
}

#[instrument(skip_all, name = "api_video_info")]
pub async fn api_video_info(
    State(state): State<AppState>,
    request: Result<Json<InfoRequest>, JsonRejection>,
) -> Result<Json<ApiSuccess<VideoInfo>>, ApiError> {
    let Json(request) = request?;
    let info = state.list_formats(request).await?;
    Ok(Json(ApiSuccess {
        success: true,
        data: info,
    }))
}

#[instrument(skip_all, name = "api_download")]
pub async fn api_download(
    State(state): State<AppState>,
    request: Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = request?;
    let file = state.fetch(request).await?;
    Ok(attachment(file).await?)
}

pub async fn not_found(uri: Uri) -> PageError {
    warn!("404 error: {uri}");
    PageError::not_found()
}
