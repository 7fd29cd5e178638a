use std::path::Path;

use serde::Serialize;

use super::StreamKind;

/// File container formats that can be served to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Mp4,
    Webm,
    M4a,
    Mp3,
    Ogg,
    Mkv,
}

impl Container {
    /// Return the extension with the leading dot.
    /// e.g. ".ext"
    pub fn with_dot(self) -> &'static str {
        match self {
            Container::Mp4 => ".mp4",
            Container::Webm => ".webm",
            Container::M4a => ".m4a",
            Container::Mp3 => ".mp3",
            Container::Ogg => ".ogg",
            Container::Mkv => ".mkv",
        }
    }

    /// Return the extension without the leading dot
    pub fn as_str(self) -> &'static str {
        &self.with_dot()[1..]
    }

    /// Parse an extension as reported by the extractor, e.g. "mp4".
    /// Return None for containers that are not served.
    pub fn from_ext(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp4" => Some(Self::Mp4),
            "webm" => Some(Self::Webm),
            "m4a" => Some(Self::M4a),
            "mp3" => Some(Self::Mp3),
            "ogg" | "opus" => Some(Self::Ogg),
            "mkv" => Some(Self::Mkv),
            _ => None,
        }
    }

    /// Parse the path file extension.
    /// Return None in case of no or invalid extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_ext)
    }

    /// The MIME type of a file in this container holding the given kind of stream
    pub fn mime_type(self, kind: StreamKind) -> &'static str {
        match (self, kind) {
            (Container::Mp4, StreamKind::Video) => "video/mp4",
            (Container::Mp4 | Container::M4a, _) => "audio/mp4",
            (Container::Webm, StreamKind::Video) => "video/webm",
            (Container::Webm, StreamKind::Audio) => "audio/webm",
            (Container::Mp3, _) => "audio/mpeg",
            (Container::Ogg, StreamKind::Video) => "video/ogg",
            (Container::Ogg, StreamKind::Audio) => "audio/ogg",
            (Container::Mkv, StreamKind::Video) => "video/x-matroska",
            (Container::Mkv, StreamKind::Audio) => "audio/x-matroska",
        }
    }

    /// Container to ask the extractor to mux into when a video stream
    /// must be merged with a separate audio stream
    pub fn merge_format(self) -> Option<&'static str> {
        match self {
            Container::Mp4 | Container::Webm | Container::Mkv => Some(self.as_str()),
            _ => None,
        }
    }

    /// The audio extension whose codecs can be muxed into this container as-is
    pub fn companion_audio(self) -> Option<&'static str> {
        match self {
            Container::Mp4 => Some("m4a"),
            Container::Webm => Some("webm"),
            _ => None,
        }
    }
}
