mod command;
mod formats;
mod ytdl;

use std::path::{Path, PathBuf};

pub use ytdl::Ytdl;

use crate::{
    result::Result,
    types::{StreamDescriptor, VideoInfo},
};

/// Interface for listing and downloading the streams of a video.
///
/// Both operations block until the underlying program is done,
/// callers in async contexts must move them to a blocking thread.
pub trait MediaResolver: Send + Sync {
    /// Get the video metadata along with its downloadable streams.
    ///
    /// Must return [`Error::UnavailableStream`](crate::result::Error::UnavailableStream)
    /// if the video cannot be accessed.
    fn video_info(&self, url: &str) -> Result<VideoInfo>;

    /// Download the given stream of the video into `out_dir` and return the file path.
    ///
    /// The stream must be one of those returned by [`MediaResolver::video_info`]
    /// for the same URL.
    fn download(&self, url: &str, stream: &StreamDescriptor, out_dir: &Path) -> Result<PathBuf>;
}
