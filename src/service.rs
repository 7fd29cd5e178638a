use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use miette::{IntoDiagnostic, WrapErr};
use serde::Deserialize;
use tempfile::TempDir;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::{
    config::Settings,
    io::{attachment_filename, request_tempdir},
    resolver::MediaResolver,
    result::{bail, Error, Result},
    types::{StreamDescriptor, VideoInfo},
    youtube_url,
};

/// A request to list the streams of a video
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InfoRequest {
    #[serde(default)]
    pub url: String,
}

/// A request to download one stream of a video
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadRequest {
    #[serde(default)]
    pub url: String,
    /// Identifier of the chosen stream, `itag` is accepted for compatibility
    #[serde(default, alias = "itag")]
    pub stream_id: Option<String>,
}

/// A stream materialized on disk, ready to be sent to the client.
///
/// The file lives in a directory owned by this value:
/// it is removed when the value, or the [`TempDir`] taken out of it, is dropped.
#[derive(Debug)]
pub struct DownloadedFile {
    pub dir: TempDir,
    pub path: PathBuf,
    /// Name suggested to the client
    pub filename: String,
    pub mime_type: &'static str,
    pub len: u64,
    pub stream: StreamDescriptor,
}

/// The download workflow, independent of any transport.
///
/// Every method blocks while the resolver runs.
pub struct Downloader {
    resolver: Arc<dyn MediaResolver>,
    settings: Arc<Settings>,
}

impl Downloader {
    pub fn new(resolver: Arc<dyn MediaResolver>, settings: Arc<Settings>) -> Self {
        Self { resolver, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// List the streams available for the URL
    pub fn list_formats(&self, request: &InfoRequest) -> Result<VideoInfo> {
        let url = youtube_url::validate(&request.url)?;

        let mut info = self
            .resolver
            .video_info(url)
            .map_err(|err| err.wrap_err_with(|| "Could not get video information"))?;
        if info.streams.is_empty() {
            return Err(Error::UnavailableStream);
        }
        info.truncate_description(self.settings.description_preview);

        info!(
            "{} audio and {} video streams found for '{}'",
            info.streams.audio.len(),
            info.streams.video.len(),
            info.title
        );
        Ok(info)
    }

    /// Download the selected stream into a fresh request directory
    pub fn fetch(&self, request: &DownloadRequest) -> Result<DownloadedFile> {
        let url = youtube_url::validate(&request.url)?;
        let stream_id = request
            .stream_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(Error::MissingSelection)?;

        // Resolve again so the served file matches what the resolver offers now
        let info = self
            .resolver
            .video_info(url)
            .map_err(|err| err.wrap_err_with(|| "Could not get video information"))?;
        let stream = info
            .find_stream(stream_id)
            .ok_or(Error::UnavailableFormat)?
            .clone();
        debug!("Selected stream: {stream:?}");

        let dir = request_tempdir(self.settings.temp_dir.as_deref())?;
        let path = self
            .resolver
            .download(url, &stream, dir.path())
            .map_err(|err| err.wrap_err_with(|| "Could not download stream"))?;
        let len = file_len(&path)?;

        let filename = attachment_filename(&info.title, &stream, OffsetDateTime::now_utc());
        info!("Downloaded {filename} ({len} bytes)");

        Ok(DownloadedFile {
            dir,
            path,
            filename,
            mime_type: stream.mime_type,
            len,
            stream,
        })
    }
}

fn file_len(path: &Path) -> Result<u64> {
    let len = std::fs::metadata(path)
        .into_diagnostic()
        .wrap_err("Could not read downloaded file metadata")?
        .len();
    if len == 0 {
        bail("Downloaded file is empty")
    } else {
        Ok(len)
    }
}
