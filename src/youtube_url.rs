use std::sync::OnceLock;

use regex::Regex;

use crate::result::{Error, Result};

/// An optional scheme
macro_rules! opt_scheme {
    () => {
        r#"(?:https?://)?"#
    };
}
/// An optional subdomain, e.g. "www." or "m."
macro_rules! opt_subdomain {
    () => {
        r#"(?:(?:www|m|music)\.)?"#
    };
}
/// The known hosts
macro_rules! host {
    () => {
        r#"(?:youtube\.com|youtu\.be|youtube-nocookie\.com)/"#
    };
}
/// Whatever may come between the host and the video ID
macro_rules! opt_path {
    () => {
        r#"(?:watch\?v=|embed/|v/|shorts/|live/|.+[?&]v=)?"#
    };
}
/// The video ID
macro_rules! video_id {
    () => {
        r#"(?P<id>[^&=%?/#\s]{11})"#
    };
}
/// Example: "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42"
const PATTERN: &str = concat!(
    "^",
    opt_scheme!(),
    opt_subdomain!(),
    host!(),
    opt_path!(),
    video_id!()
);

static YOUTUBE_RE: OnceLock<Regex> = OnceLock::new();

fn youtube_re() -> &'static Regex {
    YOUTUBE_RE.get_or_init(|| Regex::new(PATTERN).expect("static pattern is valid"))
}

/// Check that the text looks like a YouTube video URL and return it trimmed
pub fn validate(url: &str) -> Result<&str> {
    let url = url.trim();
    if !url.is_empty() && youtube_re().is_match(url) {
        Ok(url)
    } else {
        Err(Error::InvalidUrl)
    }
}

/// Extract the 11-character video ID from the URL
pub fn video_id(url: &str) -> Option<&str> {
    youtube_re()
        .captures(url.trim())
        .and_then(|cap| cap.name("id"))
        .map(|m| m.as_str())
}
