use serde::Serialize;

use super::{Bitrate, Container};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Audio,
    Video,
}

/// One downloadable variant of a video
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamDescriptor {
    /// Identifier understood by the resolver (YouTube itag / yt-dlp format id)
    pub id: String,
    #[serde(rename = "type")]
    pub kind: StreamKind,
    #[serde(rename = "format")]
    pub container: Container,
    /// "720p" for videos, "High"/"Medium"/"Low" for audio
    pub quality: String,
    pub bitrate: Option<Bitrate>,
    pub fps: Option<u32>,
    /// Whether the served file contains an audio track
    pub has_audio: bool,
    pub filesize: Option<u64>,
    pub mime_type: &'static str,
}

impl StreamDescriptor {
    pub fn audio(
        id: impl Into<String>,
        container: Container,
        bitrate: Bitrate,
        filesize: Option<u64>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: StreamKind::Audio,
            container,
            quality: bitrate.quality().to_string(),
            bitrate: Some(bitrate),
            fps: None,
            has_audio: true,
            filesize,
            mime_type: container.mime_type(StreamKind::Audio),
        }
    }

    /// A video stream. Streams without their own audio track are served
    /// merged with the best compatible audio, so `has_audio` only tells
    /// whether the extractor must do a merge.
    pub fn video(
        id: impl Into<String>,
        container: Container,
        height: u32,
        fps: Option<u32>,
        has_audio: bool,
        filesize: Option<u64>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: StreamKind::Video,
            container,
            quality: format!("{height}p"),
            bitrate: None,
            fps,
            has_audio,
            filesize,
            mime_type: container.mime_type(StreamKind::Video),
        }
    }

    /// Vertical resolution parsed back from the quality label
    pub fn height(&self) -> Option<u32> {
        match self.kind {
            StreamKind::Video => self.quality.strip_suffix('p')?.parse().ok(),
            StreamKind::Audio => None,
        }
    }

    /// Human readable size, e.g. "12.3 MB"
    pub fn size_label(&self) -> Option<String> {
        self.filesize
            .map(|bytes| format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Streams {
    pub audio: Vec<StreamDescriptor>,
    pub video: Vec<StreamDescriptor>,
}

impl Streams {
    pub fn is_empty(&self) -> bool {
        self.audio.is_empty() && self.video.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StreamDescriptor> {
        self.video.iter().chain(self.audio.iter())
    }
}

/// Everything shown to the user about a video before choosing a stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub author: String,
    /// Duration in seconds
    pub length: u64,
    pub thumbnail_url: Option<String>,
    pub description: String,
    pub view_count: Option<u64>,
    /// Formatted as YYYY-MM-DD
    pub publish_date: Option<String>,
    pub streams: Streams,
}

impl VideoInfo {
    pub fn find_stream(&self, id: &str) -> Option<&StreamDescriptor> {
        self.streams.iter().find(|stream| stream.id == id)
    }

    /// Keep only the first `max_chars` characters of the description,
    /// marking the cut with "..."
    pub fn truncate_description(&mut self, max_chars: usize) {
        if let Some((idx, _)) = self.description.char_indices().nth(max_chars) {
            self.description.truncate(idx);
            self.description.push_str("...");
        }
    }

    /// Duration formatted as "m:ss" or "h:mm:ss"
    pub fn length_label(&self) -> String {
        let (h, m, s) = (self.length / 3600, self.length / 60 % 60, self.length % 60);
        if h > 0 {
            format!("{h}:{m:02}:{s:02}")
        } else {
            format!("{m}:{s:02}")
        }
    }
}
