use std::{
    io,
    pin::Pin,
    task::{Context, Poll},
};

use axum::{
    body::{Body, Bytes},
    http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use futures::Stream;
use miette::{IntoDiagnostic, WrapErr};
use tempfile::TempDir;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::{result::Result, service::DownloadedFile};

/// File content stream that owns the directory holding the file.
///
/// The directory is removed when the stream is dropped, that is once the
/// response has been fully sent or the client went away.
pub struct TempFileStream {
    inner: ReaderStream<File>,
    _dir: TempDir,
}

impl TempFileStream {
    pub fn new(file: File, dir: TempDir) -> Self {
        Self {
            inner: ReaderStream::new(file),
            _dir: dir,
        }
    }
}

impl Stream for TempFileStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Send the downloaded file as an attachment
pub async fn attachment(file: DownloadedFile) -> Result<Response> {
    let DownloadedFile {
        dir,
        path,
        filename,
        mime_type,
        len,
        ..
    } = file;

    let handle = File::open(&path)
        .await
        .into_diagnostic()
        .wrap_err("Could not open downloaded file")?;
    let body = Body::from_stream(TempFileStream::new(handle, dir));

    let headers = [
        (CONTENT_TYPE, mime_type.to_owned()),
        (CONTENT_LENGTH, len.to_string()),
        (
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, body).into_response())
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    #[tokio::test]
    async fn directory_removed_once_stream_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.m4a");
        std::fs::write(&path, b"some audio").unwrap();
        let dir_path = dir.path().to_path_buf();

        let mut stream = TempFileStream::new(File::open(&path).await.unwrap(), dir);
        let mut content = Vec::new();
        while let Some(chunk) = stream.next().await {
            content.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(content, b"some audio");
        assert!(dir_path.exists());

        drop(stream);
        assert!(!dir_path.exists());
    }
}
